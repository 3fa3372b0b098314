//! In-memory runtime for tests.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;

use super::{Runtime, RuntimeError, RuntimeResult};

/// File system held entirely in memory.
///
/// Files can be inserted, replaced and removed while a bundler holds the
/// runtime, which is how watch-mode tests simulate edits.
#[derive(Debug, Default)]
pub struct MemoryRuntime {
    files: RwLock<BTreeMap<PathBuf, Vec<u8>>>,
}

impl MemoryRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a runtime from `(path, content)` pairs rooted at `root`.
    pub fn with_files<'a>(root: &Path, files: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let runtime = Self::new();
        for (path, content) in files {
            runtime.insert(root.join(path), content);
        }
        runtime
    }

    /// Create or replace a file.
    pub fn insert(&self, path: impl Into<PathBuf>, content: impl AsRef<[u8]>) {
        self.files.write().insert(path.into(), content.as_ref().to_vec());
    }

    /// Remove a file, returning `true` if it existed.
    pub fn remove(&self, path: &Path) -> bool {
        self.files.write().remove(path).is_some()
    }
}

impl Runtime for MemoryRuntime {
    fn read(&self, path: &Path) -> RuntimeResult<Vec<u8>> {
        self.files
            .read()
            .get(path)
            .cloned()
            .ok_or_else(|| RuntimeError::FileNotFound(path.to_path_buf()))
    }

    fn is_file(&self, path: &Path) -> bool {
        self.files.read().contains_key(path)
    }

    fn list_files(&self, root: &Path) -> RuntimeResult<Vec<PathBuf>> {
        Ok(self
            .files
            .read()
            .keys()
            .filter(|path| path.starts_with(root))
            .cloned()
            .collect())
    }
}
