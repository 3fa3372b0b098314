//! CLI errors and their miette rendering.

use std::path::PathBuf;

use hap_bundler::OrchestratorError;
use hap_config::ConfigError;
use hap_packager::PackageError;
use miette::Report;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Build(#[from] OrchestratorError),

    #[error("Package verification failed: {0}")]
    Verify(#[from] PackageError),

    #[error("Project directory not found: {}", .0.display())]
    ProjectNotFound(PathBuf),

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("File watcher error: {0}")]
    Watch(String),
}

impl CliError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CliError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Convert a CLI error into a miette report with a hint where one helps.
pub fn cli_error_to_miette(err: CliError) -> Report {
    match err {
        CliError::Build(err) => orchestrator_error_to_miette(err),
        CliError::ProjectNotFound(path) => miette::miette!(
            help = "Pass the project root with --cwd",
            "Project directory not found: {}",
            path.display()
        ),
        _ => miette::miette!("{}", err),
    }
}

fn orchestrator_error_to_miette(err: OrchestratorError) -> Report {
    let errors = err.compile_errors();
    if !errors.is_empty() {
        return miette::miette!(
            help = "Fix the errors listed above; nothing was written",
            "Build failed with {} compile error{}",
            errors.len(),
            if errors.len() == 1 { "" } else { "s" }
        );
    }
    match &err {
        OrchestratorError::Package(PackageError::MissingSigningMaterial { profile }) => miette::miette!(
            help = format!("Place private.pem and certificate.pem under sign/{profile}/, or set [sign] in hap.toml"),
            "{err}"
        ),
        OrchestratorError::Config(ConfigError::ManifestNotFound(_)) => miette::miette!(
            help = "Run hap from the project root or pass --cwd",
            "{err}"
        ),
        _ => miette::miette!("[{}] {}", err.kind(), err),
    }
}
