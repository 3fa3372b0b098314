//! Core graph structure and inner state.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::{FxHashMap as HashMap, FxHashSet as HashSet};
use serde::{Deserialize, Serialize};

use crate::module::CompiledModule;
use crate::ModuleId;

/// Traversal marker of one arena slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VisitState {
    Unvisited,
    InProgress,
    Done,
}

/// Outcome of [`ModuleGraph::claim`].
#[derive(Debug, Clone)]
pub enum Claim {
    /// The caller owns the unit and must `complete` or `fail` it.
    Acquired,
    /// Another worker is compiling the unit.
    InProgress,
    /// The unit is settled. `None` means its last compile failed.
    Done(Option<Arc<CompiledModule>>),
}

#[derive(Debug, Clone)]
pub(super) struct Slot {
    pub state: VisitState,
    pub module: Option<Arc<CompiledModule>>,
}

impl Default for Slot {
    fn default() -> Self {
        Self {
            state: VisitState::Unvisited,
            module: None,
        }
    }
}

/// Module dependency graph shared between compile workers.
#[derive(Debug, Clone, Default)]
pub struct ModuleGraph {
    pub(super) inner: Arc<RwLock<GraphInner>>,
}

#[derive(Debug, Default)]
pub(super) struct GraphInner {
    pub slots: HashMap<ModuleId, Slot>,
    /// Forward edges in first-import order.
    pub dependencies: HashMap<ModuleId, Vec<ModuleId>>,
    /// Reverse edges.
    pub dependents: HashMap<ModuleId, HashSet<ModuleId>>,
    pub entries: Vec<ModuleId>,
    /// Units whose most recent compile failed.
    pub failed: HashSet<ModuleId>,
}

impl GraphInner {
    pub fn unlink(&mut self, id: &ModuleId) {
        if let Some(targets) = self.dependencies.remove(id) {
            for target in targets {
                if let Some(importers) = self.dependents.get_mut(&target) {
                    importers.remove(id);
                    if importers.is_empty() {
                        self.dependents.remove(&target);
                    }
                }
            }
        }
    }
}

impl ModuleGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the entry point list.
    pub fn set_entries<I>(&self, entries: I)
    where
        I: IntoIterator<Item = ModuleId>,
    {
        let mut inner = self.inner.write();
        inner.entries.clear();
        for entry in entries {
            if !inner.entries.contains(&entry) {
                inner.entries.push(entry);
            }
        }
    }

    pub fn entries(&self) -> Vec<ModuleId> {
        self.inner.read().entries.clone()
    }
}
