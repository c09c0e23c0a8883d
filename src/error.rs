use thiserror::Error;

/// Configuration-time validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The destination directory path was empty.
    #[error("upload directory path cannot be empty")]
    EmptyDirectory,
    /// A file-name policy string did not name a known policy.
    #[error("unknown file name policy `{value}` (expected verbatim, base-name or sanitize)")]
    UnknownFileNamePolicy {
        /// The rejected value.
        value: String,
    },
}

/// Multipart protocol failures: bad request framing or a failing body stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Generic protocol failure with message context.
    #[error("{message}")]
    Message {
        /// Protocol failure message.
        message: String,
    },
}

impl ProtocolError {
    /// Creates a protocol error from a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }
}

/// Filesystem failures while persisting an upload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// Generic storage failure with message context.
    #[error("{message}")]
    Message {
        /// Storage failure message.
        message: String,
    },
}

impl StorageError {
    /// Creates a storage error from a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }
}

/// Error that aborts an upload request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum UploadError {
    /// Multipart framing or body stream failure.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    /// Destination filesystem failure.
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// Multipart stream ended before the closing boundary.
    #[error("multipart stream ended unexpectedly")]
    IncompleteStream,
}

impl UploadError {
    /// Returns `true` when the request itself was at fault.
    pub fn is_protocol(&self) -> bool {
        matches!(self, Self::Protocol(_) | Self::IncompleteStream)
    }

    /// Returns `true` when the destination filesystem failed.
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}
