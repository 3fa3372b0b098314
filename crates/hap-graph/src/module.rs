//! Compiled module representation stored in the graph.

use serde::{Deserialize, Serialize};

use crate::resolver::ResolvedTarget;
use crate::source::SourceKind;
use crate::ModuleId;

/// One import statement after resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportEntry {
    /// Specifier exactly as written in the source.
    pub specifier: String,
    pub target: ResolvedTarget,
}

/// Resolved imports of a unit, in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportTable {
    entries: Vec<ImportEntry>,
}

impl ImportTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an import. Repeated specifiers keep their first position.
    pub fn push(&mut self, specifier: impl Into<String>, target: ResolvedTarget) {
        let specifier = specifier.into();
        if self.entries.iter().any(|entry| entry.specifier == specifier) {
            return;
        }
        self.entries.push(ImportEntry { specifier, target });
    }

    pub fn get(&self, specifier: &str) -> Option<&ResolvedTarget> {
        self.entries
            .iter()
            .find(|entry| entry.specifier == specifier)
            .map(|entry| &entry.target)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ImportEntry> {
        self.entries.iter()
    }

    /// Distinct target ids in first-import order.
    pub fn target_ids(&self) -> Vec<ModuleId> {
        let mut ids: Vec<ModuleId> = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            let id = entry.target.id();
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        ids
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Output of compiling one unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderArtifact {
    /// Render function source (templates only).
    pub render: Option<String>,
    /// Style object as JSON text (templates with a `<style>` block only).
    pub style: Option<String>,
    /// Executable script body with imports rewritten to runtime requires.
    pub script: String,
}

/// A compiled unit, owned by the graph arena.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledModule {
    pub id: ModuleId,
    pub kind: SourceKind,
    pub imports: ImportTable,
    pub artifact: RenderArtifact,
    /// Size of the source text in bytes.
    pub source_size: usize,
}

impl CompiledModule {
    pub fn new(id: ModuleId, kind: SourceKind, imports: ImportTable, artifact: RenderArtifact, source_size: usize) -> Self {
        Self {
            id,
            kind,
            imports,
            artifact,
            source_size,
        }
    }

    /// Placeholder module for a built-in capability.
    pub fn builtin_stub(id: ModuleId) -> Self {
        Self {
            id,
            kind: SourceKind::BuiltinStub,
            imports: ImportTable::new(),
            artifact: RenderArtifact::default(),
            source_size: 0,
        }
    }

    pub fn is_builtin(&self) -> bool {
        self.kind == SourceKind::BuiltinStub
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::BuiltinStub;

    #[test]
    fn import_table_deduplicates_specifiers_and_targets() {
        let a = ModuleId::new("a.js").unwrap();
        let mut table = ImportTable::new();
        table.push("./a", ResolvedTarget::Module { id: a.clone() });
        table.push("./a.js", ResolvedTarget::Module { id: a.clone() });
        table.push("./a", ResolvedTarget::Module { id: a.clone() });
        table.push(
            "@system.fetch",
            ResolvedTarget::Builtin {
                stub: BuiltinStub::new("@system.fetch"),
            },
        );

        assert_eq!(table.len(), 3);
        assert_eq!(table.target_ids(), vec![a, ModuleId::builtin("@system.fetch")]);
        assert!(table.get("@system.fetch").unwrap().builtin().is_some());
    }
}
