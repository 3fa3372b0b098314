//! Error types for configuration and manifest loading.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config value for '{field}': {hint}")]
    InvalidValue { field: String, hint: String },

    #[error("invalid profile override: {message}")]
    InvalidProfileOverride { message: String },

    #[error("unknown build profile '{0}' (expected 'dev' or 'release')")]
    UnknownProfile(String),

    #[error("invalid build name format '{0}' (expected ORIGINAL, ORIGINAL_TIMESTAMP or CUSTOM=<tag>)")]
    InvalidBuildNameFormat(String),

    #[error("project manifest not found: {0}")]
    ManifestNotFound(PathBuf),

    #[error("invalid project manifest {path}: {message}")]
    InvalidManifest { path: PathBuf, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
