//! File system watcher feeding the watch loop.
//!
//! Watches the project directory recursively and forwards relevant changes
//! through a bounded channel. Batching and debouncing happen in the
//! consumer, see [`WatchLoop`](crate::watch::WatchLoop).

use std::path::{Path, PathBuf};

use hap_graph::RuntimeError;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::trace;

use crate::error::{BuildError, Result};

/// Capacity of the change channel.
const CHANNEL_CAPACITY: usize = 256;

/// File change event type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileChange {
    Modified(PathBuf),
    Created(PathBuf),
    Removed(PathBuf),
}

impl FileChange {
    /// Get the path affected by this change.
    pub fn path(&self) -> &Path {
        match self {
            FileChange::Modified(p) | FileChange::Created(p) | FileChange::Removed(p) => p,
        }
    }
}

/// Recursive watcher over a project directory.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    root: PathBuf,
}

impl FileWatcher {
    /// Start watching `root`. Paths matching `ignore_patterns` (directory
    /// names such as `node_modules`, or `*.ext` suffixes) are dropped, as are
    /// hidden files and everything below `excluded_dirs` (the build and
    /// dist directories).
    pub fn new(
        root: PathBuf,
        ignore_patterns: Vec<String>,
        excluded_dirs: Vec<PathBuf>,
    ) -> Result<(Self, mpsc::Receiver<FileChange>)> {
        if !root.exists() {
            return Err(BuildError::Runtime(RuntimeError::FileNotFound(root)));
        }

        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let filter_root = root.clone();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let Ok(event) = res else {
                return;
            };
            for path in &event.paths {
                if should_ignore(path, &filter_root, &ignore_patterns)
                    || excluded_dirs.iter().any(|dir| path.starts_with(dir))
                {
                    continue;
                }
                let change = match event.kind {
                    EventKind::Create(_) => FileChange::Created(path.clone()),
                    EventKind::Modify(_) => FileChange::Modified(path.clone()),
                    EventKind::Remove(_) => FileChange::Removed(path.clone()),
                    _ => continue,
                };
                trace!(?change, "file change");
                // Receiver gone means the loop has shut down.
                let _ = tx.blocking_send(change);
            }
        })?;

        watcher.watch(&root, RecursiveMode::Recursive)?;

        Ok((Self { _watcher: watcher, root }, rx))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Whether a change at `path` should be dropped.
pub(crate) fn should_ignore(path: &Path, root: &Path, ignore_patterns: &[String]) -> bool {
    let Ok(rel_path) = path.strip_prefix(root) else {
        return true;
    };
    let path_str = rel_path.to_string_lossy().replace('\\', "/");

    for pattern in ignore_patterns {
        if let Some(ext) = pattern.strip_prefix('*') {
            if path_str.ends_with(ext) {
                return true;
            }
        } else if path_str == *pattern
            || path_str.starts_with(&format!("{pattern}/"))
            || path_str.contains(&format!("/{pattern}/"))
        {
            return true;
        }
    }

    rel_path
        .components()
        .filter_map(|component| component.as_os_str().to_str())
        .any(|name| name.starts_with('.') && name != "." && name != "..")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patterns() -> Vec<String> {
        vec!["node_modules".into(), "*.log".into()]
    }

    #[test]
    fn ignores_configured_directories() {
        let root = Path::new("/project");
        assert!(should_ignore(Path::new("/project/node_modules/pkg/index.js"), root, &patterns()));
        assert!(should_ignore(Path::new("/project/src/node_modules/x.js"), root, &patterns()));
        assert!(!should_ignore(Path::new("/project/src/node_modules_extra.js"), root, &patterns()));
        assert!(!should_ignore(Path::new("/project/src/app.ux"), root, &patterns()));
    }

    #[test]
    fn ignores_extensions_hidden_files_and_outside_paths() {
        let root = Path::new("/project");
        assert!(should_ignore(Path::new("/project/debug.log"), root, &patterns()));
        assert!(should_ignore(Path::new("/project/.git/HEAD"), root, &patterns()));
        assert!(should_ignore(Path::new("/project/src/.app.ux.swp"), root, &patterns()));
        assert!(should_ignore(Path::new("/elsewhere/app.ux"), root, &patterns()));
    }

    #[test]
    fn change_exposes_path() {
        let change = FileChange::Removed(PathBuf::from("/project/src/a.js"));
        assert_eq!(change.path(), Path::new("/project/src/a.js"));
    }
}
