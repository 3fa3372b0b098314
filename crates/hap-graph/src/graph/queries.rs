//! Read-only accessors for ModuleGraph.

use std::sync::Arc;

use super::arena::{ModuleGraph, VisitState};
use crate::module::CompiledModule;
use crate::ModuleId;

impl ModuleGraph {
    pub fn get(&self, id: &ModuleId) -> Option<Arc<CompiledModule>> {
        self.inner.read().slots.get(id).and_then(|slot| slot.module.clone())
    }

    pub fn state(&self, id: &ModuleId) -> Option<VisitState> {
        self.inner.read().slots.get(id).map(|slot| slot.state)
    }

    pub fn contains(&self, id: &ModuleId) -> bool {
        self.inner.read().slots.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.inner.read().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().slots.is_empty()
    }

    /// All slot ids, sorted.
    pub fn module_ids(&self) -> Vec<ModuleId> {
        let mut ids: Vec<ModuleId> = self.inner.read().slots.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Compiled modules sorted by id.
    pub fn modules(&self) -> Vec<Arc<CompiledModule>> {
        let inner = self.inner.read();
        let mut modules: Vec<Arc<CompiledModule>> =
            inner.slots.values().filter_map(|slot| slot.module.clone()).collect();
        modules.sort_by(|a, b| a.id.cmp(&b.id));
        modules
    }

    /// Ids in `Unvisited` state, sorted.
    pub fn unvisited_ids(&self) -> Vec<ModuleId> {
        let inner = self.inner.read();
        let mut ids: Vec<ModuleId> = inner
            .slots
            .iter()
            .filter(|(_, slot)| slot.state == VisitState::Unvisited)
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Units whose most recent compile failed, sorted.
    pub fn failed_ids(&self) -> Vec<ModuleId> {
        let mut ids: Vec<ModuleId> = self.inner.read().failed.iter().cloned().collect();
        ids.sort();
        ids
    }

    /// Direct dependencies in first-import order.
    pub fn dependencies(&self, id: &ModuleId) -> Vec<ModuleId> {
        self.inner
            .read()
            .dependencies
            .get(id)
            .cloned()
            .unwrap_or_default()
    }

    /// Direct importers, sorted.
    pub fn dependents(&self, id: &ModuleId) -> Vec<ModuleId> {
        let mut ids: Vec<ModuleId> = self
            .inner
            .read()
            .dependents
            .get(id)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        ids.sort();
        ids
    }

    /// Capability names of every built-in stub in the graph, sorted and
    /// de-duplicated.
    pub fn builtin_capabilities(&self) -> Vec<String> {
        let inner = self.inner.read();
        let mut capabilities: Vec<String> = inner
            .slots
            .keys()
            .filter(|id| id.is_builtin())
            .map(|id| crate::specifier::capability_name(id.builtin_specifier()).to_string())
            .collect();
        capabilities.sort();
        capabilities.dedup();
        capabilities
    }
}
