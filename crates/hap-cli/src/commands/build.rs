//! `hap build` / `hap release`.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use hap_bundler::{BuildReport, BuildStats, Orchestrator, Target};
use hap_config::BuildProfile;
use hap_graph::NativeRuntime;
use tracing::info;

use crate::cli::BuildArgs;
use crate::commands::{OutputOptions, prepare};
use crate::error::{CliError, Result};
use crate::ui;

/// Build, write the build directory and, unless `--no-package`, package.
///
/// The sorted asset listing is printed to stdout. With `--stats-json` the
/// statistics document is written whether the build succeeds or not.
pub fn execute(args: &BuildArgs, profile: BuildProfile, output: OutputOptions) -> Result<BuildReport> {
    let (root, config) = prepare(&args.project, profile, output)?;
    info!(profile = %profile, stream_pack = config.stream_pack, "starting build");

    let mut orchestrator = Orchestrator::new(&root, profile, config, Arc::new(NativeRuntime));
    let target = if args.no_package { Target::Build } else { Target::Package };
    let result = orchestrator.run(target);

    if let Some(path) = &args.stats_json {
        let stats = match &result {
            Ok(report) => report.stats.clone(),
            Err(err) => err.stats(),
        };
        write_stats(&root.join(path), &stats)?;
    }

    let report = result?;
    println!("{}", report.stats.asset_listing());

    if let Some(package) = report.package.as_ref().filter(|_| args.verify) {
        let bytes = fs::read(&package.path).map_err(|e| CliError::io(&package.path, e))?;
        let verified = hap_packager::verify(&bytes)?;
        ui::success(&format!(
            "Verified {} entries ({})",
            verified.entries.len(),
            if verified.signed { "signed" } else { "unsigned" }
        ));
    }

    ui::success(&format!("Build finished: {}", ui::summary(&report)));
    Ok(report)
}

fn write_stats(path: &Path, stats: &BuildStats) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| CliError::io(parent, e))?;
    }
    fs::write(path, stats.to_json()?).map_err(|e| CliError::io(path, e))
}
