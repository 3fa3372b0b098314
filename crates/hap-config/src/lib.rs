//! # hap-config
//!
//! Project configuration for the hap toolchain.
//!
//! - [`HapConfig`]: `hap.toml` layered over built-in defaults and `HAP_*`
//!   environment variables, with `[profiles.<name>]` overrides merged on top.
//! - [`BuildProfile`]: `dev` or `release`.
//! - [`BuildNameFormat`]: how the package file name is tagged.
//! - [`ProjectManifest`]: the project's `src/manifest.json`.

pub mod build_name;
pub mod config;
pub mod error;
pub mod manifest;
pub mod profile;
pub mod settings;

pub use build_name::BuildNameFormat;
pub use config::{CONFIG_FILE, HapConfig, SignConfig, WatchConfig};
pub use error::{ConfigError, Result};
pub use manifest::{APP_ENTRY, Feature, MANIFEST_FILE, Page, ProjectManifest, Router};
pub use profile::BuildProfile;
pub use settings::GlobalSettings;
