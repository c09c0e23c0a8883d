#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Minimal upload server core: drains multipart request bodies to a
//! directory on disk, one part at a time, without buffering whole files.

/// Fluent configuration builder.
pub mod builder;
/// Server configuration.
pub mod config;
/// Error types exposed by this crate.
pub mod error;
/// Hyper request and body adapters.
pub mod hyper;
/// Sequential multipart reader.
pub mod multipart;
/// Streaming multipart part API.
pub mod part;
/// Low-level parser components.
pub mod parser;
/// HTTP routes and accept loop.
pub mod server;
/// Storage engine traits and implementations.
pub mod storage;

use bytes::Bytes;
use futures::Stream;

pub use builder::UploadConfigBuilder;
pub use config::{FileNamePolicy, UploadConfig};
pub use error::{ConfigError, ProtocolError, StorageError, UploadError};
pub use multipart::Multipart;
pub use parser::extract_multipart_boundary;
pub use part::Part;
pub use storage::{DiskStorage, DiskStorageBuilder, StorageEngine, StoredFile};

/// Outcome of a fully drained upload request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadReport {
    /// Files written, in request order.
    pub files: Vec<StoredFile>,
    /// Parts skipped because they carried no file name.
    pub skipped: usize,
}

/// Upload handler: owns the configuration and the storage backend.
#[derive(Debug)]
pub struct Uploader<S = DiskStorage> {
    config: UploadConfig,
    storage: S,
}

impl Uploader<DiskStorage> {
    /// Creates an uploader writing to the configured directory.
    pub fn new(config: UploadConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let storage = DiskStorage::from_config(&config)?;
        Ok(Self { config, storage })
    }

    /// Creates a configuration builder with defaults.
    pub fn builder() -> UploadConfigBuilder {
        UploadConfigBuilder::default()
    }
}

impl<S> Uploader<S> {
    /// Creates an uploader with an explicit storage backend.
    pub fn with_storage(config: UploadConfig, storage: S) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config, storage })
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    /// Returns the storage backend.
    pub fn storage(&self) -> &S {
        &self.storage
    }
}

impl<S> Uploader<S>
where
    S: StorageEngine,
{
    /// Drains a multipart request body into storage.
    ///
    /// Parts are handled strictly in order and the first error aborts the
    /// request. Files stored before the failure are left in place.
    pub async fn drain<B>(
        &self,
        content_type: Option<&str>,
        body: B,
    ) -> Result<UploadReport, UploadError>
    where
        B: Stream<Item = Result<Bytes, UploadError>> + Send + Unpin,
    {
        let mut multipart = Multipart::from_content_type(content_type, body)?;
        let mut report = UploadReport::default();

        while let Some(mut part) = multipart.next_part().await? {
            let file_name = part
                .file_name()
                .filter(|name| !name.is_empty())
                .map(ToOwned::to_owned);
            let Some(file_name) = file_name else {
                tracing::debug!(
                    field = part.field_name().unwrap_or("<none>"),
                    "upload: skipping part without a file name"
                );
                part.close().await?;
                report.skipped += 1;
                continue;
            };

            let stored = self.storage.store(&file_name, Box::pin(&mut part)).await?;
            part.close().await?;

            tracing::info!(path = %stored.path.display(), size = stored.size, "received file");
            report.files.push(stored);
        }

        Ok(report)
    }
}
