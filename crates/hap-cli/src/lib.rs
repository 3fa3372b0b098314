//! hap CLI: compile, bundle and package quick app projects.
//!
//! - [`cli`] - clap definitions
//! - [`commands`] - `build`, `release` and `watch`
//! - [`error`] - CLI errors and miette rendering
//! - [`logger`] - tracing subscriber setup
//! - [`ui`] - colored status lines
//!
//! # Example
//!
//! ```rust,no_run
//! use hap_cli::cli::BuildArgs;
//! use hap_cli::commands::{OutputOptions, build_execute};
//! use hap_config::BuildProfile;
//!
//! let report = build_execute(&BuildArgs::default(), BuildProfile::Dev, OutputOptions::default())?;
//! println!("{}", report.stats.asset_listing());
//! # Ok::<(), hap_cli::CliError>(())
//! ```

pub mod cli;
pub mod commands;
pub mod error;
pub mod logger;
pub mod ui;

pub use error::{CliError, Result};
