//! Mutation methods for ModuleGraph.

use std::sync::Arc;

use super::arena::{Claim, ModuleGraph, VisitState};
use crate::module::CompiledModule;
use crate::ModuleId;

impl ModuleGraph {
    /// Atomically claim a unit for compilation.
    ///
    /// Unknown ids get a fresh slot. The first claimer of an `Unvisited`
    /// slot receives [`Claim::Acquired`]; everybody else observes the current
    /// state.
    pub fn claim(&self, id: &ModuleId) -> Claim {
        let mut inner = self.inner.write();
        let slot = inner.slots.entry(id.clone()).or_default();
        match slot.state {
            VisitState::Unvisited => {
                slot.state = VisitState::InProgress;
                Claim::Acquired
            }
            VisitState::InProgress => Claim::InProgress,
            VisitState::Done => Claim::Done(slot.module.clone()),
        }
    }

    /// Store a compiled module and record its outgoing edges.
    pub fn complete(&self, module: CompiledModule) -> Arc<CompiledModule> {
        let id = module.id.clone();
        let targets = module.imports.target_ids();
        let module = Arc::new(module);

        let mut inner = self.inner.write();
        inner.unlink(&id);
        for target in &targets {
            inner
                .dependents
                .entry(target.clone())
                .or_default()
                .insert(id.clone());
        }
        inner.dependencies.insert(id.clone(), targets);
        inner.failed.remove(&id);

        let slot = inner.slots.entry(id).or_default();
        slot.state = VisitState::Done;
        slot.module = Some(Arc::clone(&module));
        module
    }

    /// Settle a unit whose compile failed.
    pub fn fail(&self, id: &ModuleId) {
        let mut inner = self.inner.write();
        inner.unlink(id);
        inner.failed.insert(id.clone());
        let slot = inner.slots.entry(id.clone()).or_default();
        slot.state = VisitState::Done;
        slot.module = None;
    }

    /// Reset units to `Unvisited` and drop their outgoing edges.
    ///
    /// Incoming edges are kept so importers can still be found.
    pub fn invalidate<'a, I>(&self, ids: I)
    where
        I: IntoIterator<Item = &'a ModuleId>,
    {
        let mut inner = self.inner.write();
        for id in ids {
            inner.unlink(id);
            inner.failed.remove(id);
            if let Some(slot) = inner.slots.get_mut(id) {
                slot.state = VisitState::Unvisited;
                slot.module = None;
            }
        }
    }

    /// Reset every failed unit so the next traversal retries it.
    pub fn retry_failed(&self) -> Vec<ModuleId> {
        let failed = self.failed_ids();
        self.invalidate(failed.iter());
        failed
    }

    /// Remove every slot that is not reachable from the entry points.
    /// Returns the removed ids, sorted.
    pub fn prune_unreachable(&self) -> Vec<ModuleId> {
        let reachable = self.reachable();
        let mut inner = self.inner.write();
        let mut removed: Vec<ModuleId> = inner
            .slots
            .keys()
            .filter(|id| !reachable.contains(*id))
            .cloned()
            .collect();
        removed.sort();

        for id in &removed {
            inner.unlink(id);
            inner.slots.remove(id);
            inner.failed.remove(id);
            inner.dependents.remove(id);
        }
        removed
    }

    /// Drop every slot and edge, keeping the entry list.
    pub fn clear(&self) {
        let mut inner = self.inner.write();
        inner.slots.clear();
        inner.dependencies.clear();
        inner.dependents.clear();
        inner.failed.clear();
    }
}
