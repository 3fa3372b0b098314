//! Incremental rebuilds driven by file changes.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use hap_config::MANIFEST_FILE;
use hap_graph::ModuleId;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::bundler::{BuildMode, BuildOutput, Bundler};
use crate::error::Result;
use crate::watcher::FileChange;

/// Something the watch loop can rebuild with a batch of changes.
pub trait Rebuild: Send + 'static {
    type Output: Send + 'static;

    fn rebuild(&mut self, changes: &[FileChange]) -> Self::Output;
}

/// A bundler kept alive across rebuilds together with the last good output.
#[derive(Debug)]
pub struct WatchSession {
    bundler: Bundler,
    last_good: Option<BuildOutput>,
}

impl WatchSession {
    pub fn new(bundler: Bundler) -> Self {
        Self {
            bundler,
            last_good: None,
        }
    }

    pub fn bundler(&self) -> &Bundler {
        &self.bundler
    }

    /// The most recent successful build. Failed rebuilds never replace it.
    pub fn last_good(&self) -> Option<&BuildOutput> {
        self.last_good.as_ref()
    }

    /// Full build that seeds the session.
    pub fn initial_build(&mut self) -> Result<&BuildOutput> {
        let output = self.bundler.build_project(BuildMode::Full)?;
        Ok(self.last_good.insert(output))
    }

    /// Invalidate the changed units and every transitive importer, then
    /// rebuild in watch mode.
    ///
    /// Creating or removing a file can change where an untouched import
    /// resolves, so those batches also re-probe the resolution memo.
    pub fn apply_changes(&mut self, changes: &[FileChange]) -> Result<&BuildOutput> {
        let mut changed = changed_modules(self.bundler.layout().src_root(), changes, |path| {
            self.bundler.layout().id_for(path)
        });
        if changes.iter().any(|change| !matches!(change, FileChange::Modified(_))) {
            let shadowed = self.bundler.resolver().revalidate();
            if !shadowed.is_empty() {
                debug!(importers = shadowed.len(), "resolutions changed");
            }
            changed.extend(shadowed);
        }

        let graph = self.bundler.graph();
        let invalidated = graph.importers_closure(changed.iter());
        for id in &invalidated {
            self.bundler.resolver().invalidate_unit(id);
        }
        graph.invalidate(invalidated.iter());
        debug!(changed = changed.len(), invalidated = invalidated.len(), "invalidated units");

        let output = self.bundler.build_project(BuildMode::Watch)?;
        Ok(self.last_good.insert(output))
    }
}

impl Rebuild for WatchSession {
    type Output = std::result::Result<Vec<ModuleId>, crate::BuildError>;

    fn rebuild(&mut self, changes: &[FileChange]) -> Self::Output {
        self.apply_changes(changes).map(|output| output.compiled.clone())
    }
}

/// Module ids of the changed paths. The root manifest is not a module and is
/// re-read by every build, so it maps to nothing.
pub(crate) fn changed_modules(
    src_root: &Path,
    changes: &[FileChange],
    id_for: impl Fn(&Path) -> Option<ModuleId>,
) -> Vec<ModuleId> {
    let manifest = src_root.join(MANIFEST_FILE);
    let mut ids: Vec<ModuleId> = changes
        .iter()
        .map(FileChange::path)
        .filter(|path| *path != manifest)
        .filter_map(id_for)
        .collect();
    ids.sort();
    ids.dedup();
    ids
}

/// Single consumer of file changes.
///
/// Changes are batched until the channel has been quiet for the debounce
/// period, then handed to the target on a blocking thread. Shutdown stops
/// listening; a rebuild already running is awaited and its result delivered.
pub struct WatchLoop<R: Rebuild> {
    target: Arc<Mutex<R>>,
    debounce: Duration,
}

impl<R: Rebuild> WatchLoop<R> {
    pub fn new(target: Arc<Mutex<R>>, debounce: Duration) -> Self {
        Self { target, debounce }
    }

    /// Run until `shutdown` resolves or every sender is dropped. Returns the
    /// number of rebuilds performed.
    pub async fn run<S, F>(self, mut changes: mpsc::Receiver<FileChange>, shutdown: S, mut on_rebuild: F) -> usize
    where
        S: Future<Output = ()>,
        F: FnMut(R::Output),
    {
        tokio::pin!(shutdown);
        let mut rebuilds = 0;

        loop {
            let first = tokio::select! {
                biased;
                _ = &mut shutdown => break,
                change = changes.recv() => match change {
                    Some(change) => change,
                    None => break,
                },
            };

            let mut batch = vec![first];
            let mut stop = false;
            loop {
                tokio::select! {
                    biased;
                    _ = &mut shutdown => {
                        stop = true;
                        break;
                    }
                    next = tokio::time::timeout(self.debounce, changes.recv()) => match next {
                        Ok(Some(change)) => batch.push(change),
                        Ok(None) | Err(_) => break,
                    },
                }
            }
            if stop {
                debug!(discarded = batch.len(), "shutdown with pending changes");
                break;
            }

            info!(changes = batch.len(), "rebuilding");
            let target = Arc::clone(&self.target);
            let handle = tokio::task::spawn_blocking(move || target.lock().rebuild(&batch));
            match handle.await {
                Ok(output) => {
                    rebuilds += 1;
                    on_rebuild(output);
                }
                Err(err) => error!(error = %err, "rebuild task failed"),
            }
        }

        rebuilds
    }
}
