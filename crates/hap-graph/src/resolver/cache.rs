//! Concurrent resolution memo.

use dashmap::DashMap;

use super::ResolvedTarget;
use crate::ModuleId;

/// Memo of `(specifier, importer) -> target`.
///
/// Reads never block each other; inserts lock a single shard. Only
/// successful resolutions are stored so a file created later is picked up
/// on the next attempt.
#[derive(Debug, Default)]
pub struct ResolutionCache {
    entries: DashMap<(String, ModuleId), ResolvedTarget>,
}

impl ResolutionCache {
    pub fn get(&self, specifier: &str, from: &ModuleId) -> Option<ResolvedTarget> {
        self.entries
            .get(&(specifier.to_string(), from.clone()))
            .map(|entry| entry.value().clone())
    }

    pub fn insert(&self, specifier: &str, from: &ModuleId, target: ResolvedTarget) {
        self.entries.insert((specifier.to_string(), from.clone()), target);
    }

    /// Remove entries made from `id` and entries that resolved to `id`.
    pub fn invalidate_unit(&self, id: &ModuleId) {
        self.entries
            .retain(|(_, from), target| from != id && target.module_id() != Some(id));
    }

    pub fn remove(&self, specifier: &str, from: &ModuleId) -> Option<ResolvedTarget> {
        self.entries
            .remove(&(specifier.to_string(), from.clone()))
            .map(|(_, target)| target)
    }

    /// Memoized `(specifier, importer)` pairs that point at file modules.
    pub fn file_entries(&self) -> Vec<(String, ModuleId)> {
        self.entries
            .iter()
            .filter(|entry| entry.value().module_id().is_some())
            .map(|entry| entry.key().clone())
            .collect()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
