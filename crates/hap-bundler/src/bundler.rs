//! Graph traversal and full/watch builds.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use hap_config::{HapConfig, MANIFEST_FILE, ProjectManifest};
use hap_graph::{
    AssetList, Claim, CompiledModule, ModuleGraph, ModuleId, ProjectLayout, Resolver, ResolverConfig, Runtime,
    SourceKind, SourceUnit,
};
use hap_ux::{CompileError, CompileErrors, Compiler};
use rayon::prelude::*;
use rustc_hash::FxHashSet;
use tracing::{debug, info, warn};

use crate::emit::{self, EmitOptions};
use crate::error::{BuildError, Result};
use crate::stats::{BuildStats, BuildWarning};

/// How much of the prior graph a build may reuse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    /// Drop the graph and the resolver cache and compile everything.
    Full,
    /// Keep settled modules; compile only invalidated, failed and newly
    /// reachable units.
    Watch,
}

/// A successful build.
#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub assets: AssetList,
    pub stats: BuildStats,
    /// Units compiled by this build, sorted.
    pub compiled: Vec<ModuleId>,
}

/// Compiles a project into an [`AssetList`].
///
/// The bundler owns the module graph across builds, so a watch session can
/// keep one instance and call [`Bundler::build`] with [`BuildMode::Watch`].
#[derive(Debug)]
pub struct Bundler {
    runtime: Arc<dyn Runtime>,
    compiler: Compiler,
    graph: ModuleGraph,
    options: EmitOptions,
    manifest: Option<ProjectManifest>,
}

impl Bundler {
    pub fn new(resolver: Arc<Resolver>, options: EmitOptions) -> Self {
        Self {
            runtime: Arc::clone(resolver.runtime()),
            compiler: Compiler::new(resolver),
            graph: ModuleGraph::new(),
            options,
            manifest: None,
        }
    }

    /// Bundler for a project on `runtime`, configured from `hap.toml`.
    pub fn for_project(project_root: &Path, config: &HapConfig, runtime: Arc<dyn Runtime>) -> Self {
        let layout = ProjectLayout::new(project_root, &config.src_dir);
        let resolver_config = ResolverConfig::new(layout)
            .with_module_dirs(&config.module_dirs)
            .with_builtin_prefixes(config.builtin_prefixes.iter().cloned());
        let resolver = Arc::new(Resolver::new(resolver_config, runtime));
        Self::new(
            resolver,
            EmitOptions {
                split_style: config.split_style,
            },
        )
    }

    pub fn resolver(&self) -> &Arc<Resolver> {
        self.compiler.resolver()
    }

    pub fn layout(&self) -> &ProjectLayout {
        self.resolver().layout()
    }

    pub fn graph(&self) -> &ModuleGraph {
        &self.graph
    }

    /// The project manifest of the last [`Bundler::build_project`].
    pub fn manifest(&self) -> Option<&ProjectManifest> {
        self.manifest.as_ref()
    }

    /// Attach a project manifest; it is emitted as `manifest.json`.
    pub fn set_manifest(&mut self, manifest: ProjectManifest) {
        self.manifest = Some(manifest);
    }

    /// Read `manifest.json` from the source root through the runtime.
    pub fn load_manifest(&self) -> Result<ProjectManifest> {
        let path = self.layout().src_root().join(MANIFEST_FILE);
        if !self.runtime.is_file(&path) {
            return Err(hap_config::ConfigError::ManifestNotFound(path).into());
        }
        let text = self.runtime.read_to_string(&path)?;
        Ok(ProjectManifest::from_json_str(&text, &path)?)
    }

    /// Build from the entry points declared in the project manifest.
    pub fn build_project(&mut self, mode: BuildMode) -> Result<BuildOutput> {
        let manifest = self.load_manifest()?;
        let entries = manifest
            .entry_points()
            .iter()
            .filter_map(|path| ModuleId::new(path.to_string_lossy()).ok())
            .collect::<Vec<_>>();
        self.manifest = Some(manifest);
        self.build(&entries, mode)
    }

    /// Compile everything reachable from `entries` and emit the asset list.
    ///
    /// Any failing unit aborts the build with every error found in the
    /// traversal; no asset list is produced.
    pub fn build(&mut self, entries: &[ModuleId], mode: BuildMode) -> Result<BuildOutput> {
        let started = Instant::now();
        if mode == BuildMode::Full {
            self.graph.clear();
            self.resolver().clear_cache();
        } else {
            let retried = self.graph.retry_failed();
            if !retried.is_empty() {
                debug!(count = retried.len(), "retrying failed units");
            }
        }
        self.graph.set_entries(entries.iter().cloned());

        let (compiled, mut errors) = self.traverse(entries);

        if mode == BuildMode::Watch {
            let pruned = self.graph.prune_unreachable();
            if !pruned.is_empty() {
                debug!(count = pruned.len(), "pruned unreachable units");
            }
        }

        if !errors.is_empty() {
            errors.sort_by(|a, b| a.module().cmp(b.module()));
            warn!(errors = errors.len(), "build failed");
            return Err(BuildError::PartialBuildAbort { errors });
        }

        let warnings: Vec<BuildWarning> = self
            .graph
            .find_cycles()
            .iter()
            .map(|members| {
                let warning = BuildWarning::cycle(members);
                warn!(modules = ?warning.modules, "CycleDetected");
                warning
            })
            .collect();

        let (mut assets, module_stats) = match emit::module_assets(&self.graph, self.options) {
            Ok(emitted) => emitted,
            Err(errors) => {
                warn!(errors = errors.len(), "build failed");
                return Err(BuildError::PartialBuildAbort { errors });
            }
        };
        if let Some(manifest) = &self.manifest {
            assets.push(emit::manifest_asset(manifest, &self.graph)?);
        }
        assets.extend(emit::media_assets(self.runtime.as_ref(), self.layout(), &self.graph)?);
        let assets = AssetList::new(assets)?;
        let stats = BuildStats::new(&assets, warnings, module_stats);

        info!(
            mode = ?mode,
            compiled = compiled.len(),
            modules = self.graph.len(),
            assets = assets.len(),
            duration_ms = started.elapsed().as_millis() as u64,
            "build complete"
        );
        Ok(BuildOutput {
            assets,
            stats,
            compiled,
        })
    }

    /// Breadth-first traversal. Each layer's newly claimed units compile in
    /// parallel; settled units contribute their recorded edges so that
    /// invalidated units deeper in a reused graph are still reached.
    fn traverse(&self, entries: &[ModuleId]) -> (Vec<ModuleId>, Vec<CompileError>) {
        let mut seen: FxHashSet<ModuleId> = FxHashSet::default();
        let mut layer: Vec<ModuleId> = Vec::new();
        for entry in entries {
            if seen.insert(entry.clone()) {
                layer.push(entry.clone());
            }
        }

        let mut compiled = Vec::new();
        let mut errors = Vec::new();

        while !layer.is_empty() {
            let mut claimed = Vec::new();
            let mut next = Vec::new();
            for id in layer {
                match self.graph.claim(&id) {
                    Claim::Acquired => claimed.push(id),
                    Claim::Done(Some(module)) => next.extend(module.imports.target_ids()),
                    Claim::Done(None) | Claim::InProgress => {}
                }
            }

            let results: Vec<(ModuleId, std::result::Result<CompiledModule, CompileErrors>)> = claimed
                .into_par_iter()
                .map(|id| {
                    let result = self.compile_unit(&id);
                    (id, result)
                })
                .collect();

            for (id, result) in results {
                match result {
                    Ok(module) => {
                        next.extend(module.imports.target_ids());
                        self.graph.complete(module);
                    }
                    Err(unit_errors) => {
                        self.graph.fail(&id);
                        errors.extend(unit_errors);
                    }
                }
                compiled.push(id);
            }

            layer = next.into_iter().filter(|id| seen.insert(id.clone())).collect();
        }

        compiled.sort();
        (compiled, errors)
    }

    fn compile_unit(&self, id: &ModuleId) -> std::result::Result<CompiledModule, CompileErrors> {
        if id.is_builtin() {
            let unit = SourceUnit::new(id.clone(), "", SourceKind::BuiltinStub, "");
            return self.compiler.compile(&unit);
        }

        let Some(kind) = SourceKind::detect(id) else {
            return Err(CompileErrors::new(vec![CompileError::UnsupportedFeature {
                module: id.clone(),
                feature: format!("module type '.{}'", id.extension().unwrap_or_default()),
            }]));
        };
        let path = self.layout().path_for(id);
        let content = self.runtime.read_to_string(&path).map_err(|err| {
            CompileErrors::new(vec![CompileError::Unreadable {
                module: id.clone(),
                message: err.to_string(),
            }])
        })?;
        self.compiler.compile(&SourceUnit::new(id.clone(), path, kind, content))
    }
}
