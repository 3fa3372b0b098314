//! Tracing setup for the `hap` binary.
//!
//! Verbosity is picked in this order: `--verbose` (debug for hap crates),
//! `--quiet` (errors only), `RUST_LOG`, the `[settings] log_level` of
//! `hap.toml`, and finally info for hap crates.
//!
//! The contract lines of the build log (`LogChannel`) do not go through
//! tracing and are printed regardless of these settings.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const HAP_CRATES: [&str; 6] = ["hap_cli", "hap_bundler", "hap_config", "hap_graph", "hap_packager", "hap_ux"];

/// Filter directive for every hap crate at `level`.
pub fn directive(level: &str) -> String {
    HAP_CRATES
        .iter()
        .map(|name| format!("{name}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Pick the filter for the given flags. `configured` is the level from the
/// project configuration, used only when `RUST_LOG` is unset.
pub fn filter(verbose: bool, quiet: bool, configured: Option<&str>) -> EnvFilter {
    if verbose {
        EnvFilter::new(directive("debug"))
    } else if quiet {
        EnvFilter::new(directive("error"))
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(directive(configured.unwrap_or("info"))))
    }
}

/// Install the global subscriber. Call once, before anything logs.
pub fn init_logger(verbose: bool, quiet: bool, no_color: bool, configured: Option<&str>) {
    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_ansi(!no_color)
        .with_writer(std::io::stderr)
        .compact();

    // A second call (tests driving several commands) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter(verbose, quiet, configured))
        .with(fmt_layer)
        .try_init();
}

/// Whether stderr should be colored.
///
/// `NO_COLOR` disables colors, `FORCE_COLOR` forces them, otherwise the
/// terminal decides.
pub fn should_use_colors() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if std::env::var_os("FORCE_COLOR").is_some() {
        return true;
    }
    console::Term::stderr().features().colors_supported()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directive_covers_every_crate() {
        let directive = directive("debug");
        for name in HAP_CRATES {
            assert!(directive.contains(&format!("{name}=debug")));
        }
    }

    #[test]
    fn verbose_wins() {
        assert_eq!(filter(true, false, Some("warn")).to_string(), EnvFilter::new(directive("debug")).to_string());
        assert_eq!(filter(false, true, None).to_string(), EnvFilter::new(directive("error")).to_string());
    }
}
