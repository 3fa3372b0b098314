//! # hap-bundler
//!
//! Builds a quick app project into a sorted [`AssetList`](hap_graph::AssetList)
//! and drives the packager.
//!
//! ## Overview
//!
//! - [`Bundler`]: breadth-first traversal from the manifest's entry points.
//!   Each unit is compiled exactly once per build; units of one layer compile
//!   in parallel. [`BuildMode::Watch`] reuses the prior graph and compiles
//!   only invalidated, failed and newly reachable units.
//! - [`WatchSession`] / [`WatchLoop`]: change batching, importer
//!   invalidation and last-good retention.
//! - [`Orchestrator`]: `Idle → Resolving → Compiling → Bundled → Packaging →
//!   Done` state machine over bundler, build-directory writer and packager.
//! - [`LogChannel`] / [`Dialogs`]: user-facing log lines and pattern-driven
//!   reactions to them.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hap_bundler::{Orchestrator, Target};
//! use hap_config::BuildProfile;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut orchestrator = Orchestrator::for_project("/work/demo", BuildProfile::Dev)?;
//! let report = orchestrator.run(Target::Package)?;
//! println!("{}", report.stats.asset_listing());
//! # Ok(())
//! # }
//! ```

pub mod bundler;
pub mod emit;
pub mod error;
pub mod log;
pub mod orchestrator;
pub mod stats;
pub mod watch;
pub mod watcher;
pub mod writer;

pub use bundler::{BuildMode, BuildOutput, Bundler};
pub use emit::{EmitOptions, chunk_source};
pub use error::{BuildError, Result};
pub use log::{DialogMatch, Dialogs, LogChannel, MISSING_RELEASE_KEY, MemorySink, Pattern, Stream, size_kb};
pub use orchestrator::{BuildReport, BuildState, Orchestrator, OrchestratorError, Target};
pub use stats::{AssetStat, BuildStats, BuildWarning, ModuleStat};
pub use watch::{Rebuild, WatchLoop, WatchSession};
pub use watcher::{FileChange, FileWatcher};
pub use writer::{WriteSummary, write_assets};
