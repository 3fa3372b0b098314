//! Packaging errors.

use std::path::PathBuf;

use hap_config::BuildProfile;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PackageError>;

/// A failed packaging attempt. Never leaves a partial archive at the
/// destination and never touches a previous package.
#[derive(Debug, Error)]
pub enum PackageError {
    #[error("{profile} build requires a signing key and certificate")]
    MissingSigningMaterial { profile: BuildProfile },

    #[error("invalid signing material {path}: {message}")]
    InvalidSigningMaterial { path: PathBuf, message: String },

    #[error("archive write failed: {0}")]
    ArchiveWrite(#[from] zip::result::ZipError),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize package metadata: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("package verification failed: {0}")]
    Verification(String),
}

impl PackageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PackageError::Io {
            path: path.into(),
            source,
        }
    }

    /// Stable kind name used in build statistics.
    pub fn kind(&self) -> &'static str {
        match self {
            PackageError::MissingSigningMaterial { .. } => "MissingSigningMaterial",
            PackageError::InvalidSigningMaterial { .. } => "InvalidSigningMaterial",
            PackageError::Verification(_) => "VerificationFailed",
            PackageError::ArchiveWrite(_) | PackageError::Io { .. } | PackageError::Serialize(_) => {
                "ArchiveWriteError"
            }
        }
    }
}
