//! Storage engine abstraction and the local disk implementation.

use std::{path::PathBuf, pin::Pin};

use bytes::Bytes;
use futures::Stream;

use crate::UploadError;

/// Disk-backed storage backend implementation.
pub mod disk;
pub use disk::{sanitize_filename, DiskStorage, DiskStorageBuilder};

/// Boxed stream type used by storage backends.
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = T> + Send + 'a>>;

/// Metadata describing a stored file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// File name declared by the client.
    pub file_name: String,
    /// Path the content was written to.
    pub path: PathBuf,
    /// Bytes written.
    pub size: u64,
}

/// Async seam between the upload loop and where part bodies end up.
#[async_trait::async_trait]
pub trait StorageEngine: Send + Sync + 'static {
    /// Persists one part body under the client-declared `file_name`.
    ///
    /// Errors yielded by `stream` must be returned unchanged so read-side
    /// failures stay distinguishable from write-side ones.
    async fn store(
        &self,
        file_name: &str,
        stream: BoxStream<'_, Result<Bytes, UploadError>>,
    ) -> Result<StoredFile, UploadError>;
}
