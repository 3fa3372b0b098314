//! Platform runtime abstraction.
//!
//! The resolver and the bundler never touch `std::fs` directly; they go through
//! [`Runtime`]. [`NativeRuntime`](native::NativeRuntime) backs real builds and
//! [`MemoryRuntime`](memory::MemoryRuntime) backs tests that need to mutate
//! files between watch-mode rebuilds without touching the disk.

pub mod native;

#[cfg(any(test, feature = "test-utils"))]
pub mod memory;

use std::path::{Path, PathBuf};

/// Result type for runtime operations
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Errors that can occur during runtime operations
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// File exists but is not valid UTF-8 text
    #[error("File is not valid UTF-8: {0}")]
    InvalidUtf8(PathBuf),

    /// I/O error
    #[error("I/O error on '{path}': {message}")]
    Io { path: PathBuf, message: String },
}

/// Platform runtime trait.
///
/// Implementations must be cheap to share across the compile worker pool.
pub trait Runtime: Send + Sync + std::fmt::Debug {
    /// Read a file as raw bytes.
    fn read(&self, path: &Path) -> RuntimeResult<Vec<u8>>;

    /// Read a file as UTF-8 text.
    fn read_to_string(&self, path: &Path) -> RuntimeResult<String> {
        let bytes = self.read(path)?;
        String::from_utf8(bytes).map_err(|_| RuntimeError::InvalidUtf8(path.to_path_buf()))
    }

    /// Returns `true` if `path` names an existing regular file.
    fn is_file(&self, path: &Path) -> bool;

    /// List every regular file below `root`, recursively, sorted.
    fn list_files(&self, root: &Path) -> RuntimeResult<Vec<PathBuf>>;
}
