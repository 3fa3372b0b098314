//! Build orchestration: build, write, package, with an explicit state
//! machine.
//!
//! ```text
//! Idle → Resolving → Compiling → Bundled → Packaging → Done
//!          └───────────┴────────────┴───────────┴──→ Failed
//! ```
//!
//! In watch mode the orchestrator may also go back to `Compiling` from
//! `Bundled`, `Done` or `Failed`. Any other transition is rejected.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;
use hap_config::{BuildProfile, ConfigError, HapConfig};
use hap_graph::{AssetList, ModuleId, NativeRuntime, Runtime};
use hap_packager::{PackOptions, PackageError, PackageOutput, Packager, SigningMaterial};
use hap_ux::{CompileError, ErrorRecord};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::bundler::{BuildOutput, Bundler};
use crate::error::BuildError;
use crate::log::LogChannel;
use crate::stats::BuildStats;
use crate::watch::{Rebuild, WatchSession};
use crate::watcher::FileChange;
use crate::writer::{WriteSummary, write_assets};

/// Orchestrator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BuildState {
    Idle,
    Resolving,
    Compiling,
    Bundled,
    Packaging,
    Done,
    Failed,
}

impl BuildState {
    pub fn is_terminal(self) -> bool {
        matches!(self, BuildState::Done | BuildState::Failed)
    }

    /// Whether `self → to` is a legal edge. `watch` enables the edges back
    /// to `Compiling`.
    pub fn can_transition_to(self, to: BuildState, watch: bool) -> bool {
        use BuildState::*;
        match (self, to) {
            (Idle, Resolving)
            | (Resolving, Compiling)
            | (Compiling, Bundled)
            | (Bundled, Packaging)
            | (Packaging, Done) => true,
            (Bundled | Done | Failed, Compiling) => watch,
            (from, Failed) => !from.is_terminal(),
            _ => false,
        }
    }
}

/// What a run produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Compile and write the build directory.
    Build,
    /// Build, then package into the dist directory.
    Package,
}

/// Outcome of a successful run or rebuild.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub state: BuildState,
    pub stats: BuildStats,
    pub compiled: Vec<ModuleId>,
    pub build_dir: PathBuf,
    pub written: WriteSummary,
    pub package: Option<PackageOutput>,
}

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("illegal state transition {from:?} -> {to:?}")]
    IllegalTransition { from: BuildState, to: BuildState },

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Package(#[from] PackageError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl OrchestratorError {
    pub fn compile_errors(&self) -> &[CompileError] {
        match self {
            OrchestratorError::Build(err) => err.compile_errors(),
            _ => &[],
        }
    }

    /// Stable kind name, as reported in build statistics.
    pub fn kind(&self) -> &'static str {
        match self {
            OrchestratorError::IllegalTransition { .. } => "IllegalTransition",
            OrchestratorError::Build(err) => err.kind(),
            OrchestratorError::Package(err) => err.kind(),
            OrchestratorError::Config(_) => "ConfigError",
        }
    }

    /// Statistics document for this failure. Errors without a module are
    /// recorded with an empty module name.
    pub fn stats(&self) -> BuildStats {
        let mut stats = BuildStats::failed(self.compile_errors());
        if stats.errors.is_empty() {
            stats.errors.push(ErrorRecord {
                kind: self.kind().to_string(),
                module: String::new(),
                message: self.to_string(),
            });
        }
        stats
    }
}

type Result<T> = std::result::Result<T, OrchestratorError>;

/// Façade over bundler, writer and packager for one project.
#[derive(Debug)]
pub struct Orchestrator {
    project_root: PathBuf,
    profile: BuildProfile,
    config: HapConfig,
    session: WatchSession,
    state: BuildState,
    watch: bool,
    log: LogChannel,
}

impl Orchestrator {
    pub fn new(project_root: impl Into<PathBuf>, profile: BuildProfile, config: HapConfig, runtime: Arc<dyn Runtime>) -> Self {
        let project_root = project_root.into();
        let bundler = Bundler::for_project(&project_root, &config, runtime);
        Self {
            project_root,
            profile,
            config,
            session: WatchSession::new(bundler),
            state: BuildState::Idle,
            watch: false,
            log: LogChannel::default(),
        }
    }

    /// Orchestrator over the real file system with `hap.toml` loaded.
    pub fn for_project(project_root: impl Into<PathBuf>, profile: BuildProfile) -> Result<Self> {
        let project_root = project_root.into();
        let config = HapConfig::load(&project_root, profile)?;
        Ok(Self::new(project_root, profile, config, Arc::new(NativeRuntime)))
    }

    /// Allow the watch-mode edges back to `Compiling`.
    pub fn watch_mode(mut self) -> Self {
        self.watch = true;
        self
    }

    pub fn with_log(mut self, log: LogChannel) -> Self {
        self.log = log;
        self
    }

    pub fn state(&self) -> BuildState {
        self.state
    }

    pub fn profile(&self) -> BuildProfile {
        self.profile
    }

    pub fn config(&self) -> &HapConfig {
        &self.config
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn build_dir(&self) -> PathBuf {
        self.config.build_root(&self.project_root)
    }

    pub fn dist_dir(&self) -> PathBuf {
        self.config.dist_root(&self.project_root)
    }

    pub fn log(&mut self) -> &mut LogChannel {
        &mut self.log
    }

    /// The last successful build, kept across failed watch rebuilds.
    pub fn last_good(&self) -> Option<&BuildOutput> {
        self.session.last_good()
    }

    /// Resolve, compile, write the build directory and, for
    /// [`Target::Package`], package.
    pub fn run(&mut self, target: Target) -> Result<BuildReport> {
        self.transition(BuildState::Resolving)?;
        let manifest = self.session.bundler().load_manifest();
        if let Err(err) = manifest {
            return Err(self.fail(err));
        }

        self.transition(BuildState::Compiling)?;
        let output = match self.session.initial_build() {
            Ok(output) => output.clone(),
            Err(err) => return Err(self.fail(err)),
        };
        let mut report = self.bundle(output)?;

        if target == Target::Package {
            report.package = Some(self.package()?);
            report.state = self.state;
        }
        Ok(report)
    }

    /// Watch-mode rebuild for a batch of changes. On failure the last good
    /// build stays in place, on disk and in memory.
    pub fn rebuild(&mut self, changes: &[FileChange]) -> Result<BuildReport> {
        self.transition(BuildState::Compiling)?;
        let output = match self.session.apply_changes(changes) {
            Ok(output) => output.clone(),
            Err(err) => return Err(self.fail(err)),
        };
        self.bundle(output)
    }

    /// Package the last good build. Only legal right after a successful
    /// build.
    pub fn package(&mut self) -> Result<PackageOutput> {
        self.transition(BuildState::Packaging)?;
        let assets = match self.session.last_good() {
            Some(output) => output.assets.clone(),
            None => AssetList::default(),
        };
        match self.pack(&assets) {
            Ok(output) => {
                self.transition(BuildState::Done)?;
                Ok(output)
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    fn bundle(&mut self, output: BuildOutput) -> Result<BuildReport> {
        let build_dir = self.build_dir();
        let written = match write_assets(&output.assets, &build_dir) {
            Ok(written) => written,
            Err(err) => return Err(self.fail(err)),
        };
        self.transition(BuildState::Bundled)?;
        self.log.build_succeeded(&output.stats);

        Ok(BuildReport {
            state: self.state,
            stats: output.stats,
            compiled: output.compiled,
            build_dir,
            written,
            package: None,
        })
    }

    fn pack(&mut self, assets: &AssetList) -> Result<PackageOutput> {
        let package = match self.session.bundler().manifest() {
            Some(manifest) => manifest.package.clone(),
            None => return Err(ConfigError::ManifestNotFound(self.project_root.join(&self.config.src_dir)).into()),
        };

        let (key, cert) = self.config.sign_paths(&self.project_root, self.profile);
        let signing = SigningMaterial::load_optional(&key, &cert)?;
        if signing.is_none() {
            if self.profile.requires_signing() {
                self.log.missing_release_key(&key);
            } else {
                debug!(key = %key.display(), "no signing material, package is unsigned");
            }
        }

        let options = PackOptions {
            streaming: self.config.stream_pack,
            build_tag: self.config.build_name_format.build_tag(&Local::now()),
            signing,
            profile: self.profile,
        };
        let output = Packager::new(package).pack_to(assets, &options, &self.dist_dir())?;
        self.log.package_written(&output.path, output.size);
        Ok(output)
    }

    fn transition(&mut self, to: BuildState) -> Result<()> {
        if !self.state.can_transition_to(to, self.watch) {
            return Err(OrchestratorError::IllegalTransition { from: self.state, to });
        }
        info!(from = ?self.state, to = ?to, "build state");
        self.state = to;
        Ok(())
    }

    /// Enter `Failed` and report the error on the log channel.
    fn fail(&mut self, err: impl Into<OrchestratorError>) -> OrchestratorError {
        let err = err.into();
        if self.state.can_transition_to(BuildState::Failed, self.watch) {
            self.state = BuildState::Failed;
        }
        let compile_errors = err.compile_errors();
        if compile_errors.is_empty() {
            if !matches!(err, OrchestratorError::Package(PackageError::MissingSigningMaterial { .. })) {
                self.log.error(&format!("编译错误 [{}] {err}", err.kind()));
            }
        } else {
            self.log.compile_errors(compile_errors);
        }
        err
    }
}

impl Rebuild for Orchestrator {
    type Output = Result<BuildReport>;

    fn rebuild(&mut self, changes: &[FileChange]) -> Self::Output {
        Orchestrator::rebuild(self, changes)
    }
}
