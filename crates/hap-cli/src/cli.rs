//! Command-line interface definition.
//!
//! - `hap build` - compile and package a dev build
//! - `hap release` - compile and package a signed release build
//! - `hap watch` - rebuild on every source change until Ctrl+C

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use hap_config::{BuildNameFormat, HapConfig};

/// hap - quick app compiler and packager
#[derive(Parser, Debug)]
#[command(
    name = "hap",
    version,
    about = "Compile, bundle and package quick app projects",
    long_about = "Compiles .ux single-file components and scripts into a module graph,\n\
                  writes the compiled assets to the build directory and packages them\n\
                  into a signed .rpk archive."
)]
pub struct Cli {
    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build and package with the dev profile
    Build(BuildArgs),

    /// Build and package with the release profile; requires signing material
    Release(BuildArgs),

    /// Build once, then rebuild on every change
    Watch(WatchArgs),
}

/// Options shared by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct ProjectArgs {
    /// Project root (defaults to the current directory)
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<PathBuf>,

    /// Write entries as they are compressed, without META-INF
    #[arg(long, conflicts_with = "disable_stream_pack")]
    pub stream_pack: bool,

    /// Build the whole archive before writing it (the default)
    #[arg(long)]
    pub disable_stream_pack: bool,

    /// Package name tag: ORIGINAL, ORIGINAL_TIMESTAMP or CUSTOM=<tag>
    #[arg(long, value_name = "FORMAT")]
    pub build_name_format: Option<BuildNameFormat>,

    /// Emit template styles as separate .css.json assets
    #[arg(long)]
    pub split_style: bool,
}

impl ProjectArgs {
    /// Lay the command-line overrides over the loaded configuration.
    pub fn apply(&self, config: &mut HapConfig) {
        if self.stream_pack {
            config.stream_pack = true;
        }
        if self.disable_stream_pack {
            config.stream_pack = false;
        }
        if let Some(format) = &self.build_name_format {
            config.build_name_format = format.clone();
        }
        if self.split_style {
            config.split_style = true;
        }
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct BuildArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Write the compiled assets but skip packaging
    #[arg(long)]
    pub no_package: bool,

    /// Re-read the written package and check its digests and signature
    #[arg(long, conflicts_with = "no_package")]
    pub verify: bool,

    /// Write build statistics as JSON to this path
    #[arg(long, value_name = "PATH")]
    pub stats_json: Option<PathBuf>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct WatchArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Package after every successful rebuild
    #[arg(long)]
    pub package: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_build_flags() {
        let cli = Cli::parse_from([
            "hap",
            "build",
            "--cwd",
            "/work/demo",
            "--stream-pack",
            "--build-name-format",
            "CUSTOM=dev",
            "--stats-json",
            "stats.json",
        ]);
        let Command::Build(args) = cli.command else {
            panic!("expected build");
        };
        assert_eq!(args.project.cwd, Some(PathBuf::from("/work/demo")));
        assert!(args.project.stream_pack);
        assert_eq!(
            args.project.build_name_format,
            Some(BuildNameFormat::Custom("dev".to_string()))
        );
        assert_eq!(args.stats_json, Some(PathBuf::from("stats.json")));
    }

    #[test]
    fn stream_flags_conflict() {
        let result = Cli::try_parse_from(["hap", "release", "--stream-pack", "--disable-stream-pack"]);
        assert!(result.is_err());
    }

    #[test]
    fn invalid_build_name_format_is_rejected() {
        let result = Cli::try_parse_from(["hap", "build", "--build-name-format", "CUSTOM="]);
        assert!(result.is_err());
    }

    #[test]
    fn overrides_apply_to_config() {
        let mut config = HapConfig {
            stream_pack: true,
            ..HapConfig::default()
        };
        let args = ProjectArgs {
            disable_stream_pack: true,
            build_name_format: Some(BuildNameFormat::OriginalTimestamp),
            split_style: true,
            ..ProjectArgs::default()
        };
        args.apply(&mut config);
        assert!(!config.stream_pack);
        assert!(config.split_style);
        assert_eq!(config.build_name_format, BuildNameFormat::OriginalTimestamp);
    }

    #[test]
    fn quiet_and_verbose_conflict() {
        assert!(Cli::try_parse_from(["hap", "-q", "-v", "watch"]).is_err());
    }
}
