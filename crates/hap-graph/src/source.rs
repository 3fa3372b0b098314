//! Source units: the immutable input of a single compilation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::ModuleId;

/// Kind of a source unit, detected from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    /// `.ux` template: markup, embedded script and embedded style.
    Template,
    /// `.js` / `.mjs` script module.
    Script,
    /// `.json` data module.
    Json,
    /// `.css` style module.
    Style,
    /// Built-in system module provided by the runtime.
    BuiltinStub,
}

impl SourceKind {
    /// Detect the kind of a module from its identifier.
    ///
    /// Returns `None` for files that are not compiled (images, fonts, ...).
    pub fn detect(id: &ModuleId) -> Option<Self> {
        if id.is_builtin() {
            return Some(Self::BuiltinStub);
        }
        match id.extension()? {
            "ux" => Some(Self::Template),
            "js" | "mjs" => Some(Self::Script),
            "json" => Some(Self::Json),
            "css" => Some(Self::Style),
            _ => None,
        }
    }

    /// Extensions probed by the resolver when a specifier has none, in order.
    pub const PROBE_EXTENSIONS: [&'static str; 4] = ["ux", "js", "mjs", "json"];
}

/// A single unit of source read from disk (or memory in tests).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    pub id: ModuleId,
    pub path: PathBuf,
    pub kind: SourceKind,
    content: Arc<str>,
}

impl SourceUnit {
    pub fn new(id: ModuleId, path: impl Into<PathBuf>, kind: SourceKind, content: impl Into<Arc<str>>) -> Self {
        Self {
            id,
            path: path.into(),
            kind,
            content: content.into(),
        }
    }

    /// Source text of the unit.
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size of the source in bytes.
    pub fn size(&self) -> usize {
        self.content.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_kinds() {
        let detect = |p: &str| SourceKind::detect(&ModuleId::new(p).unwrap());
        assert_eq!(detect("app.ux"), Some(SourceKind::Template));
        assert_eq!(detect("common/util.js"), Some(SourceKind::Script));
        assert_eq!(detect("common/util.mjs"), Some(SourceKind::Script));
        assert_eq!(detect("i18n/en.json"), Some(SourceKind::Json));
        assert_eq!(detect("theme.css"), Some(SourceKind::Style));
        assert_eq!(detect("assets/logo.png"), None);
        assert_eq!(
            SourceKind::detect(&ModuleId::builtin("@system.fetch")),
            Some(SourceKind::BuiltinStub)
        );
    }
}
