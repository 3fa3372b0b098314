//! Import specifier classification.

use serde::{Deserialize, Serialize};

/// Namespace prefixes that identify built-in platform capabilities by default.
pub const DEFAULT_BUILTIN_PREFIXES: [&str; 2] = ["@system.", "@service."];

/// How an import specifier is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecifierKind {
    /// `./x`, `../x` or `/x` (project-root relative).
    Relative,
    /// Anything else that is not built-in: looked up through the module dirs.
    PackageLocal,
    /// Platform capability such as `@system.fetch`; never file-backed.
    BuiltinSystem,
}

/// A dependency named inside a source unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImportSpecifier {
    pub raw: String,
    pub kind: SpecifierKind,
}

impl ImportSpecifier {
    /// Classify `raw` using the given built-in prefixes.
    pub fn classify<S: AsRef<str>>(raw: impl Into<String>, builtin_prefixes: &[S]) -> Self {
        let raw = raw.into();
        let kind = classify_kind(&raw, builtin_prefixes);
        Self { raw, kind }
    }

    pub fn is_builtin(&self) -> bool {
        self.kind == SpecifierKind::BuiltinSystem
    }
}

fn classify_kind<S: AsRef<str>>(raw: &str, builtin_prefixes: &[S]) -> SpecifierKind {
    if raw.starts_with("./") || raw.starts_with("../") || raw.starts_with('/') || raw == "." || raw == ".." {
        return SpecifierKind::Relative;
    }
    let is_builtin = builtin_prefixes.iter().any(|prefix| {
        let prefix = prefix.as_ref();
        raw.len() > prefix.len() && raw.starts_with(prefix)
    });
    if is_builtin {
        SpecifierKind::BuiltinSystem
    } else {
        SpecifierKind::PackageLocal
    }
}

/// Capability name of a built-in specifier (`system.fetch` for `@system.fetch`).
pub fn capability_name(specifier: &str) -> &str {
    specifier.strip_prefix('@').unwrap_or(specifier)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind(raw: &str) -> SpecifierKind {
        ImportSpecifier::classify(raw, &DEFAULT_BUILTIN_PREFIXES).kind
    }

    #[test]
    fn classifies_relative() {
        assert_eq!(kind("./foo"), SpecifierKind::Relative);
        assert_eq!(kind("../common/util"), SpecifierKind::Relative);
        assert_eq!(kind("/common/util"), SpecifierKind::Relative);
    }

    #[test]
    fn classifies_builtins() {
        assert_eq!(kind("@system.fetch"), SpecifierKind::BuiltinSystem);
        assert_eq!(kind("@service.pay"), SpecifierKind::BuiltinSystem);
        assert_eq!(kind("@system.not-yet-shipped"), SpecifierKind::BuiltinSystem);
        // the bare namespace is not a capability
        assert_eq!(kind("@system."), SpecifierKind::PackageLocal);
    }

    #[test]
    fn classifies_package_local() {
        assert_eq!(kind("dayjs"), SpecifierKind::PackageLocal);
        assert_eq!(kind("@scope/pkg"), SpecifierKind::PackageLocal);
        assert_eq!(kind("systemfetch"), SpecifierKind::PackageLocal);
    }

    #[test]
    fn custom_prefixes() {
        let prefixes = vec!["@vendor.".to_string()];
        let spec = ImportSpecifier::classify("@vendor.scan", &prefixes);
        assert!(spec.is_builtin());
        let spec = ImportSpecifier::classify("@system.fetch", &prefixes);
        assert_eq!(spec.kind, SpecifierKind::PackageLocal);
    }

    #[test]
    fn capability_names() {
        assert_eq!(capability_name("@system.fetch"), "system.fetch");
        assert_eq!(capability_name("system.fetch"), "system.fetch");
    }
}
