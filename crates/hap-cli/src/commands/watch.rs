//! `hap watch`: initial build, then a rebuild for every batch of source
//! changes until Ctrl+C.
//!
//! A failed build never ends the session; the build directory keeps the
//! last good output and the next change retries.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use hap_bundler::{BuildReport, FileChange, FileWatcher, Orchestrator, OrchestratorError, Rebuild, Target, WatchLoop};
use hap_config::BuildProfile;
use hap_graph::NativeRuntime;
use parking_lot::Mutex;
use tracing::warn;

use crate::cli::WatchArgs;
use crate::commands::{OutputOptions, prepare};
use crate::error::{CliError, Result};
use crate::ui;

/// Orchestrator plus the per-rebuild packaging choice.
struct WatchTarget {
    orchestrator: Orchestrator,
    package: bool,
}

impl WatchTarget {
    fn build(&mut self, target: Target) -> std::result::Result<BuildReport, OrchestratorError> {
        let mut report = self.orchestrator.run(target)?;
        self.package_into(&mut report)?;
        Ok(report)
    }

    fn package_into(&mut self, report: &mut BuildReport) -> std::result::Result<(), OrchestratorError> {
        if self.package && report.package.is_none() {
            report.package = Some(self.orchestrator.package()?);
            report.state = self.orchestrator.state();
        }
        Ok(())
    }
}

impl Rebuild for WatchTarget {
    type Output = std::result::Result<BuildReport, OrchestratorError>;

    fn rebuild(&mut self, changes: &[FileChange]) -> Self::Output {
        let mut report = self.orchestrator.rebuild(changes)?;
        self.package_into(&mut report)?;
        Ok(report)
    }
}

/// Watch until Ctrl+C. Returns the number of rebuilds.
pub async fn execute(args: WatchArgs, output: OutputOptions) -> Result<usize> {
    run(args, output, async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "cannot listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
        ui::info("Shutting down...");
    })
    .await
}

/// Watch until `shutdown` resolves.
pub async fn run(args: WatchArgs, output: OutputOptions, shutdown: impl Future<Output = ()>) -> Result<usize> {
    let (root, config) = prepare(&args.project, BuildProfile::Dev, output)?;
    let debounce = Duration::from_millis(config.watch.debounce_ms);
    let ignore = config.watch.ignore.clone();
    let src_root = config.src_root(&root);
    let excluded = vec![config.build_root(&root), config.dist_root(&root)];

    let mut target = WatchTarget {
        orchestrator: Orchestrator::new(&root, BuildProfile::Dev, config, Arc::new(NativeRuntime)).watch_mode(),
        package: args.package,
    };

    ui::info("Performing initial build...");
    let target_kind = if args.package { Target::Package } else { Target::Build };
    match target.build(target_kind) {
        Ok(report) => {
            println!("{}", report.stats.asset_listing());
            ui::success(&format!("Initial build finished: {}", ui::summary(&report)));
        }
        Err(err) => ui::error(&format!("Initial build failed [{}]", err.kind())),
    }

    let (watcher, changes) =
        FileWatcher::new(src_root, ignore, excluded).map_err(|err| CliError::Watch(err.to_string()))?;
    ui::info(&format!("Watching {} (Ctrl+C to stop)", watcher.root().display()));

    let rebuilds = WatchLoop::new(Arc::new(Mutex::new(target)), debounce)
        .run(changes, shutdown, |result| match result {
            Ok(report) => ui::success(&format!("Rebuilt: {}", ui::summary(&report))),
            Err(err) => ui::error(&format!("Rebuild failed [{}]", err.kind())),
        })
        .await;

    drop(watcher);
    ui::success(&format!("Watch stopped after {rebuilds} rebuild(s)"));
    Ok(rebuilds)
}
