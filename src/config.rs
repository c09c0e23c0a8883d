use std::{
    fmt,
    net::{Ipv4Addr, SocketAddr},
    path::PathBuf,
    str::FromStr,
};

use crate::error::ConfigError;

/// Directory name used under the working directory when none is configured.
pub const DEFAULT_DIR_NAME: &str = "incoming";
/// Port used when no bind address is configured.
pub const DEFAULT_PORT: u16 = 8080;

/// How a client-supplied file name is turned into a destination path.
///
/// `Verbatim` joins the name onto the upload directory exactly as sent, so a
/// name such as `../x` or `/etc/x` escapes the directory. It is the default
/// for compatibility; deployments facing untrusted clients should pick
/// `BaseName` or `Sanitize`.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileNamePolicy {
    /// Join the name onto the directory unchanged.
    #[default]
    Verbatim,
    /// Keep only the final path component of the name.
    BaseName,
    /// Keep the final component and replace unsafe characters.
    Sanitize,
}

impl FileNamePolicy {
    /// Returns the command-line spelling of this policy.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Verbatim => "verbatim",
            Self::BaseName => "base-name",
            Self::Sanitize => "sanitize",
        }
    }
}

impl fmt::Display for FileNamePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileNamePolicy {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "verbatim" => Ok(Self::Verbatim),
            "base-name" | "basename" => Ok(Self::BaseName),
            "sanitize" => Ok(Self::Sanitize),
            _ => Err(ConfigError::UnknownFileNamePolicy {
                value: value.to_owned(),
            }),
        }
    }
}

/// Server configuration, built once at startup and shared read-only.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadConfig {
    /// Directory uploaded files are written to.
    pub dir: PathBuf,
    /// Address the HTTP listener binds to.
    pub addr: SocketAddr,
    /// Destination path derivation for client file names.
    pub file_names: FileNamePolicy,
}

impl UploadConfig {
    /// Creates a default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dir.as_os_str().is_empty() {
            return Err(ConfigError::EmptyDirectory);
        }

        Ok(())
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            dir: default_dir(),
            addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)),
            file_names: FileNamePolicy::default(),
        }
    }
}

/// Returns `<cwd>/incoming`, falling back to a relative path when the
/// working directory is unavailable.
pub fn default_dir() -> PathBuf {
    std::env::current_dir()
        .map(|wd| wd.join(DEFAULT_DIR_NAME))
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_DIR_NAME))
}
