//! Command implementations.
//!
//! - [`build`] - one-shot build for `hap build` and `hap release`
//! - [`watch`] - rebuild loop for `hap watch`

pub mod build;
pub mod watch;

use std::path::{Path, PathBuf};

use hap_config::{BuildProfile, HapConfig};

use crate::cli::ProjectArgs;
use crate::error::{CliError, Result};
use crate::{logger, ui};

pub use build::execute as build_execute;
pub use watch::execute as watch_execute;

/// Global output flags.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputOptions {
    pub verbose: bool,
    pub quiet: bool,
    pub no_color: bool,
}

/// Resolve the project root, load its configuration with the command-line
/// overrides applied, and install logging.
pub(crate) fn prepare(project: &ProjectArgs, profile: BuildProfile, output: OutputOptions) -> Result<(PathBuf, HapConfig)> {
    let root = project_root(project.cwd.as_deref())?;
    let mut config = HapConfig::load(&root, profile)?;
    project.apply(&mut config);

    let colors = !output.no_color && logger::should_use_colors();
    ui::init_colors(colors);
    logger::init_logger(output.verbose, output.quiet, !colors, config.settings.log_level.as_deref());
    tracing::debug!(root = %root.display(), %profile, "project loaded");
    Ok((root, config))
}

fn project_root(cwd: Option<&Path>) -> Result<PathBuf> {
    let root = match cwd {
        Some(dir) => dir.to_path_buf(),
        None => std::env::current_dir().map_err(|e| CliError::io(".", e))?,
    };
    if !root.is_dir() {
        return Err(CliError::ProjectNotFound(root));
    }
    Ok(root)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_project_dir_is_reported() {
        let err = project_root(Some(Path::new("/definitely/not/a/project"))).unwrap_err();
        assert!(matches!(err, CliError::ProjectNotFound(_)));
    }
}
