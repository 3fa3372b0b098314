use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

const BUILTIN_PREFIX: &str = "builtin:";

/// Canonical identifier for a module in the hap graph.
///
/// File-backed modules are identified by a `/`-separated logical path
/// relative to the project source root (`pages/Demo/index.ux`). Modules that
/// live in a lookup directory outside the source root keep that directory as
/// their first segment (`node_modules/dayjs/index.js`). Built-in system
/// modules never touch the file system and carry the `builtin:` prefix
/// followed by the original specifier (`builtin:@system.fetch`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(String);

impl ModuleId {
    /// Create a module identifier from a logical path.
    ///
    /// Backslashes are converted, `.` segments dropped and `..` segments
    /// folded. Paths that climb above their root are rejected.
    pub fn new(path: impl AsRef<str>) -> Result<Self, ModuleIdError> {
        let raw = path.as_ref();
        if raw.is_empty() {
            return Err(ModuleIdError::EmptyPath);
        }
        if raw.starts_with(BUILTIN_PREFIX) {
            return Ok(Self(raw.to_string()));
        }

        let normalized = normalize(raw)?;
        if normalized.is_empty() {
            return Err(ModuleIdError::EmptyPath);
        }
        Ok(Self(normalized))
    }

    /// Create the identifier of a built-in system module from its specifier.
    pub fn builtin(specifier: impl AsRef<str>) -> Self {
        let specifier = specifier.as_ref();
        if specifier.starts_with(BUILTIN_PREFIX) {
            return Self(specifier.to_string());
        }
        Self(format!("{BUILTIN_PREFIX}{specifier}"))
    }

    /// Returns `true` if this identifies a built-in system module.
    pub fn is_builtin(&self) -> bool {
        self.0.starts_with(BUILTIN_PREFIX)
    }

    /// The specifier a built-in id was created from (`@system.fetch`).
    /// File-backed ids are returned unchanged.
    pub fn builtin_specifier(&self) -> &str {
        self.0.strip_prefix(BUILTIN_PREFIX).unwrap_or(&self.0)
    }

    /// The raw text of the identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Borrow the identifier for logging.
    pub fn path_string(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.0)
    }

    /// Directory part of the identifier (`pages/Demo` for `pages/Demo/index.ux`).
    ///
    /// Returns an empty string for top-level modules and built-ins.
    pub fn dir(&self) -> &str {
        if self.is_builtin() {
            return "";
        }
        match self.0.rfind('/') {
            Some(idx) => &self.0[..idx],
            None => "",
        }
    }

    /// File extension without the dot, if any.
    pub fn extension(&self) -> Option<&str> {
        if self.is_builtin() {
            return None;
        }
        let file = self.0.rsplit('/').next().unwrap_or(&self.0);
        let dot = file.rfind('.')?;
        if dot == 0 {
            return None;
        }
        Some(&file[dot + 1..])
    }

    /// The identifier without its extension (`pages/Demo/index`).
    pub fn stem_path(&self) -> &str {
        match self.extension() {
            Some(ext) => &self.0[..self.0.len() - ext.len() - 1],
            None => &self.0,
        }
    }

    /// Logical path of the emitted file for this module, with `ext` replacing
    /// the source extension.
    pub fn with_extension(&self, ext: &str) -> String {
        format!("{}.{ext}", self.stem_path())
    }
}

fn normalize(raw: &str) -> Result<String, ModuleIdError> {
    let unified = raw.replace('\\', "/");
    let mut segments: Vec<&str> = Vec::new();
    for segment in unified.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err(ModuleIdError::EscapesRoot(raw.to_string()));
                }
            }
            other => segments.push(other),
        }
    }
    Ok(segments.join("/"))
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for ModuleId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ModuleId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        ModuleId::new(value).map_err(serde::de::Error::custom)
    }
}

/// Errors produced when constructing a [`ModuleId`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModuleIdError {
    #[error("module path cannot be empty")]
    EmptyPath,

    #[error("module path '{0}' escapes its root directory")]
    EscapesRoot(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_separators_and_dots() {
        let id = ModuleId::new("./pages\\Demo/../Demo/./index.ux").unwrap();
        assert_eq!(id.as_str(), "pages/Demo/index.ux");
    }

    #[test]
    fn rejects_escaping_paths() {
        assert_eq!(
            ModuleId::new("../outside.js"),
            Err(ModuleIdError::EscapesRoot("../outside.js".to_string()))
        );
        assert_eq!(ModuleId::new(""), Err(ModuleIdError::EmptyPath));
        assert_eq!(ModuleId::new("./"), Err(ModuleIdError::EmptyPath));
    }

    #[test]
    fn builtin_ids_keep_their_specifier() {
        let id = ModuleId::builtin("@system.fetch");
        assert!(id.is_builtin());
        assert_eq!(id.as_str(), "builtin:@system.fetch");
        assert_eq!(id.dir(), "");
        assert_eq!(id.extension(), None);
        assert_eq!(ModuleId::builtin(id.as_str()), id);
    }

    #[test]
    fn path_helpers() {
        let id = ModuleId::new("pages/Demo/index.ux").unwrap();
        assert_eq!(id.dir(), "pages/Demo");
        assert_eq!(id.extension(), Some("ux"));
        assert_eq!(id.stem_path(), "pages/Demo/index");
        assert_eq!(id.with_extension("js"), "pages/Demo/index.js");

        let top = ModuleId::new("app.ux").unwrap();
        assert_eq!(top.dir(), "");

        let dotfile = ModuleId::new("common/.env").unwrap();
        assert_eq!(dotfile.extension(), None);
    }

    #[test]
    fn serde_round_trip_uses_plain_string() {
        let id = ModuleId::new("common/util.js").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"common/util.js\"");
        let back: ModuleId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
