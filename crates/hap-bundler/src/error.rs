//! Error types for bundling and output writing.

use hap_config::ConfigError;
use hap_graph::{AssetError, RuntimeError};
use hap_ux::CompileError;
use thiserror::Error;

/// Result type alias for bundler operations.
pub type Result<T> = std::result::Result<T, BuildError>;

/// Errors produced by a build.
#[derive(Debug, Error)]
pub enum BuildError {
    /// At least one reachable unit failed to compile. Every error found in
    /// the traversal is carried, in module order.
    #[error("build aborted with {} error(s)", errors.len())]
    PartialBuildAbort { errors: Vec<CompileError> },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    /// Output path escapes the build directory or is malformed.
    #[error("Invalid output path: {0}")]
    InvalidOutputPath(String),

    #[error("Write failure: {0}")]
    WriteFailure(String),

    #[error("File watcher error: {0}")]
    Watch(#[from] notify::Error),
}

impl BuildError {
    /// Compile errors carried by a partial build, empty otherwise.
    pub fn compile_errors(&self) -> &[CompileError] {
        match self {
            BuildError::PartialBuildAbort { errors } => errors,
            _ => &[],
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            BuildError::PartialBuildAbort { .. } => "PartialBuildAbort",
            BuildError::Config(_) => "ConfigError",
            BuildError::Asset(_) => "AssetError",
            BuildError::Runtime(_) => "RuntimeError",
            BuildError::InvalidOutputPath(_) | BuildError::WriteFailure(_) => "WriteError",
            BuildError::Watch(_) => "WatchError",
        }
    }
}
