//! `hap` entry point: parse arguments, dispatch, render errors.

use clap::Parser;
use hap_cli::cli::{Cli, Command};
use hap_cli::commands::{self, OutputOptions};
use hap_cli::error;
use hap_config::BuildProfile;
use miette::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    let output = OutputOptions {
        verbose: args.verbose,
        quiet: args.quiet,
        no_color: args.no_color,
    };

    let result = match args.command {
        Command::Build(build_args) => commands::build_execute(&build_args, BuildProfile::Dev, output).map(drop),
        Command::Release(build_args) => commands::build_execute(&build_args, BuildProfile::Release, output).map(drop),
        Command::Watch(watch_args) => commands::watch_execute(watch_args, output).await.map(drop),
    };

    result.map_err(error::cli_error_to_miette)
}
