use std::{
    io,
    path::{Component, Path, PathBuf},
};

use bytes::Bytes;
use futures::StreamExt;
use tokio::{fs, io::AsyncWriteExt};

use super::{BoxStream, StorageEngine, StoredFile};
use crate::{ConfigError, FileNamePolicy, StorageError, UploadConfig, UploadError};

#[cfg(unix)]
const DIR_MODE: u32 = 0o755;

/// Builder for [`DiskStorage`].
#[derive(Debug, Clone, Default)]
pub struct DiskStorageBuilder {
    root: PathBuf,
    policy: FileNamePolicy,
}

impl DiskStorageBuilder {
    /// Sets the directory used for persisted files.
    pub fn destination(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    /// Sets how client file names map to paths under the destination.
    pub fn file_names(mut self, policy: FileNamePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Builds a validated disk storage backend.
    pub fn build(self) -> Result<DiskStorage, ConfigError> {
        if self.root.as_os_str().is_empty() {
            return Err(ConfigError::EmptyDirectory);
        }

        Ok(DiskStorage {
            root: self.root,
            policy: self.policy,
        })
    }
}

/// Storage engine writing each part to `<root>/<file name>`.
///
/// Existing files are truncated and overwritten. Nothing is locked, so two
/// concurrent uploads of the same name race and the last one to finish wins.
#[derive(Debug, Clone)]
pub struct DiskStorage {
    root: PathBuf,
    policy: FileNamePolicy,
}

impl DiskStorage {
    /// Creates a disk storage builder.
    pub fn builder() -> DiskStorageBuilder {
        DiskStorageBuilder::default()
    }

    /// Creates disk storage from the server configuration.
    pub fn from_config(config: &UploadConfig) -> Result<Self, ConfigError> {
        Self::builder()
            .destination(&config.dir)
            .file_names(config.file_names)
            .build()
    }

    /// Returns the destination directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the active file-name policy.
    pub fn policy(&self) -> FileNamePolicy {
        self.policy
    }

    /// Derives the destination path for a client file name.
    pub fn resolve(&self, file_name: &str) -> Result<PathBuf, StorageError> {
        match self.policy {
            FileNamePolicy::Verbatim => {
                if !is_plain_name(file_name) {
                    tracing::warn!(
                        file_name,
                        root = %self.root.display(),
                        "disk storage: file name is not a plain name and may escape the upload directory"
                    );
                }
                Ok(self.root.join(file_name))
            }
            FileNamePolicy::BaseName => Path::new(file_name)
                .file_name()
                .map(|base| self.root.join(base))
                .ok_or_else(|| {
                    StorageError::new(format!("file name `{file_name}` has no final path component"))
                }),
            FileNamePolicy::Sanitize => Ok(self.root.join(sanitize_filename(file_name))),
        }
    }

    async fn ensure_root(&self) -> Result<(), StorageError> {
        let mut builder = fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        builder.mode(DIR_MODE);

        builder
            .create(&self.root)
            .await
            .map_err(|err| io_failure("create upload directory", &self.root, err))
    }
}

#[async_trait::async_trait]
impl StorageEngine for DiskStorage {
    async fn store(
        &self,
        file_name: &str,
        mut stream: BoxStream<'_, Result<Bytes, UploadError>>,
    ) -> Result<StoredFile, UploadError> {
        self.ensure_root().await?;
        let path = self.resolve(file_name)?;
        tracing::debug!(file_name, path = %path.display(), "disk storage: begin streaming store");

        let mut file = fs::File::create(&path)
            .await
            .map_err(|err| io_failure("create", &path, err))?;

        let mut size = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk)
                .await
                .map_err(|err| io_failure("write", &path, err))?;
            size += chunk.len() as u64;
        }

        // Deferred write errors only show up here.
        file.flush().await.map_err(|err| io_failure("flush", &path, err))?;
        file.sync_all().await.map_err(|err| io_failure("close", &path, err))?;
        drop(file);

        tracing::debug!(size, path = %path.display(), "disk storage: completed store");
        Ok(StoredFile {
            file_name: file_name.to_owned(),
            path,
            size,
        })
    }
}

fn io_failure(action: &str, path: &Path, err: io::Error) -> StorageError {
    StorageError::new(format!("failed to {action} {}: {err}", path.display()))
}

/// Returns `true` when `name` is exactly one normal path component.
fn is_plain_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// Reduces a client file name to a safe single component.
///
/// Directories are stripped, characters outside `[A-Za-z0-9._-]` become `_`,
/// and leading/trailing dots are trimmed. Empty results become
/// `file`.
pub fn sanitize_filename(input: &str) -> String {
    // Strip both separator styles regardless of platform.
    let base = input.rsplit(['/', '\\']).next().unwrap_or_default();

    let cleaned: String = base
        .chars()
        .map(|ch| match ch {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '_' | '-' => ch,
            _ => '_',
        })
        .collect();

    match cleaned.trim_matches('.') {
        "" => "file".to_owned(),
        trimmed => trimmed.to_owned(),
    }
}
