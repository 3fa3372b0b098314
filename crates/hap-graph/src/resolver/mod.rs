//! Module resolution.
//!
//! Classifies every import specifier and maps it to a concrete target:
//!
//! - `Relative` specifiers are joined with the importing unit's directory
//!   (or the source root for `/x`) and probed on disk.
//! - `BuiltinSystem` specifiers resolve to a [`BuiltinStub`] without any file
//!   system access. Unknown capability names are accepted; whether the
//!   capability exists is only known to the runtime on the device.
//! - `PackageLocal` specifiers are probed in every module dir, in order.
//!
//! Successful resolutions are memoized per `(specifier, importer)`.

mod algorithm;
mod cache;

pub use cache::ResolutionCache;

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::layout::ProjectLayout;
use crate::runtime::Runtime;
use crate::specifier::{DEFAULT_BUILTIN_PREFIXES, ImportSpecifier, SpecifierKind, capability_name};
use crate::ModuleId;

/// Resolver configuration.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    pub layout: ProjectLayout,
    /// Absolute lookup directories for package-local specifiers, in order.
    pub module_dirs: Vec<PathBuf>,
    /// Namespace prefixes of built-in system modules.
    pub builtin_prefixes: Vec<String>,
}

impl ResolverConfig {
    /// Default configuration: source root first, then `node_modules`.
    pub fn new(layout: ProjectLayout) -> Self {
        let module_dirs = vec![
            layout.src_root().to_path_buf(),
            layout.project_root().join("node_modules"),
        ];
        Self {
            layout: layout.with_external_dir("node_modules"),
            module_dirs,
            builtin_prefixes: DEFAULT_BUILTIN_PREFIXES.iter().map(|p| p.to_string()).collect(),
        }
    }

    /// Replace the module lookup order. Directories are relative to the
    /// project root; directories other than the source root become external
    /// dirs of the layout.
    pub fn with_module_dirs<I, S>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut module_dirs = Vec::new();
        for dir in dirs {
            let dir = dir.as_ref().trim_matches('/');
            let absolute = self.layout.project_root().join(dir);
            if absolute != self.layout.src_root() {
                if let Some(first) = dir.split('/').next() {
                    self.layout = self.layout.with_external_dir(first);
                }
            }
            module_dirs.push(absolute);
        }
        self.module_dirs = module_dirs;
        self
    }

    pub fn with_builtin_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.builtin_prefixes = prefixes.into_iter().map(Into::into).collect();
        self
    }
}

/// A built-in capability exposed by the runtime.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BuiltinStub {
    /// Specifier as written in the source (`@system.fetch`).
    pub specifier: String,
    /// Capability name as listed in the package manifest (`system.fetch`).
    pub capability: String,
}

impl BuiltinStub {
    pub fn new(specifier: impl Into<String>) -> Self {
        let specifier = specifier.into();
        let capability = capability_name(&specifier).to_string();
        Self {
            specifier,
            capability,
        }
    }

    /// Stable graph identity of the stub.
    pub fn id(&self) -> ModuleId {
        ModuleId::builtin(&self.specifier)
    }
}

/// Outcome of a successful resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResolvedTarget {
    Module { id: ModuleId },
    Builtin { stub: BuiltinStub },
}

impl ResolvedTarget {
    /// Graph identity of the target (file module or built-in stub).
    pub fn id(&self) -> ModuleId {
        match self {
            ResolvedTarget::Module { id } => id.clone(),
            ResolvedTarget::Builtin { stub } => stub.id(),
        }
    }

    /// The file-backed module id, if this is not a built-in.
    pub fn module_id(&self) -> Option<&ModuleId> {
        match self {
            ResolvedTarget::Module { id } => Some(id),
            ResolvedTarget::Builtin { .. } => None,
        }
    }

    pub fn builtin(&self) -> Option<&BuiltinStub> {
        match self {
            ResolvedTarget::Builtin { stub } => Some(stub),
            ResolvedTarget::Module { .. } => None,
        }
    }
}

/// Resolution failure.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("cannot resolve '{specifier}' from '{from}'")]
    UnresolvedImport { specifier: String, from: ModuleId },
}

/// Module resolver with a per-build memo.
#[derive(Debug)]
pub struct Resolver {
    config: ResolverConfig,
    runtime: Arc<dyn Runtime>,
    cache: ResolutionCache,
}

impl Resolver {
    pub fn new(config: ResolverConfig, runtime: Arc<dyn Runtime>) -> Self {
        Self {
            config,
            runtime,
            cache: ResolutionCache::default(),
        }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn layout(&self) -> &ProjectLayout {
        &self.config.layout
    }

    pub fn runtime(&self) -> &Arc<dyn Runtime> {
        &self.runtime
    }

    pub fn cache(&self) -> &ResolutionCache {
        &self.cache
    }

    /// Classify a raw specifier with the configured built-in prefixes.
    pub fn classify(&self, raw: &str) -> ImportSpecifier {
        ImportSpecifier::classify(raw, &self.config.builtin_prefixes)
    }

    /// Resolve `specifier` as imported by `from`.
    pub fn resolve(&self, specifier: &str, from: &ModuleId) -> Result<ResolvedTarget, ResolveError> {
        if let Some(hit) = self.cache.get(specifier, from) {
            return Ok(hit);
        }

        let classified = self.classify(specifier);
        let target = match classified.kind {
            SpecifierKind::BuiltinSystem => Some(ResolvedTarget::Builtin {
                stub: BuiltinStub::new(specifier),
            }),
            SpecifierKind::Relative => algorithm::resolve_relative(
                specifier,
                from,
                &self.config.layout,
                self.runtime.as_ref(),
            )
            .map(|id| ResolvedTarget::Module { id }),
            SpecifierKind::PackageLocal => algorithm::resolve_package_local(
                specifier,
                &self.config.module_dirs,
                &self.config.layout,
                self.runtime.as_ref(),
            )
            .map(|id| ResolvedTarget::Module { id }),
        };

        match target {
            Some(target) => {
                trace!(specifier, from = %from, target = %target.id(), "resolved import");
                self.cache.insert(specifier, from, target.clone());
                Ok(target)
            }
            None => Err(ResolveError::UnresolvedImport {
                specifier: specifier.to_string(),
                from: from.clone(),
            }),
        }
    }

    /// Drop every memoized resolution made from, or pointing at, `id`.
    pub fn invalidate_unit(&self, id: &ModuleId) {
        self.cache.invalidate_unit(id);
    }

    /// Re-probe every memoized file resolution and return the importers
    /// whose target changed or vanished, sorted.
    ///
    /// Needed after files are created or removed: a new `util.js` shadows
    /// a cached `util/index.js` without either unit being touched.
    pub fn revalidate(&self) -> Vec<ModuleId> {
        let mut stale = Vec::new();
        for (specifier, from) in self.cache.file_entries() {
            let Some(previous) = self.cache.remove(&specifier, &from) else {
                continue;
            };
            match self.resolve(&specifier, &from) {
                Ok(current) if current == previous => {}
                _ => {
                    trace!(specifier, from = %from, previous = %previous.id(), "resolution changed");
                    stale.push(from);
                }
            }
        }
        stale.sort();
        stale.dedup();
        stale
    }

    /// Drop every memoized resolution.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}
