use std::{net::SocketAddr, path::PathBuf};

use crate::{
    config::{FileNamePolicy, UploadConfig},
    error::ConfigError,
};

/// Builder for [`UploadConfig`].
#[derive(Debug, Clone, Default)]
pub struct UploadConfigBuilder {
    config: UploadConfig,
}

impl UploadConfigBuilder {
    /// Creates a builder with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current builder configuration snapshot.
    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    /// Sets the directory uploaded files are written to.
    pub fn dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.dir = dir.into();
        self
    }

    /// Sets the listener bind address.
    pub fn addr(mut self, addr: SocketAddr) -> Self {
        self.config.addr = addr;
        self
    }

    /// Sets how client file names map to destination paths.
    pub fn file_names(mut self, policy: FileNamePolicy) -> Self {
        self.config.file_names = policy;
        self
    }

    /// Finalizes and returns validated configuration.
    pub fn build(self) -> Result<UploadConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
