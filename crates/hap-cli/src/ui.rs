//! Status lines for the terminal.

use std::sync::atomic::{AtomicBool, Ordering};

use hap_bundler::{BuildReport, size_kb};
use owo_colors::OwoColorize;

static COLORS: AtomicBool = AtomicBool::new(true);

/// Enable or disable colored status lines.
pub fn init_colors(enabled: bool) {
    COLORS.store(enabled, Ordering::Relaxed);
}

fn colored() -> bool {
    COLORS.load(Ordering::Relaxed)
}

pub fn success(message: &str) {
    if colored() {
        eprintln!("{} {}", "✓".green().bold(), message);
    } else {
        eprintln!("✓ {message}");
    }
}

pub fn info(message: &str) {
    if colored() {
        eprintln!("{} {}", "ℹ".blue().bold(), message);
    } else {
        eprintln!("ℹ {message}");
    }
}

pub fn warning(message: &str) {
    if colored() {
        eprintln!("{} {}", "⚠".yellow().bold(), message.yellow());
    } else {
        eprintln!("⚠ {message}");
    }
}

pub fn error(message: &str) {
    if colored() {
        eprintln!("{} {}", "✗".red().bold(), message.red());
    } else {
        eprintln!("✗ {message}");
    }
}

/// One-line summary of a finished build.
pub fn summary(report: &BuildReport) -> String {
    let mut line = format!(
        "{} assets, {} KB, {} compiled",
        report.stats.asset_count(),
        size_kb(report.stats.total_size() as u64),
        report.compiled.len()
    );
    if let Some(package) = &report.package {
        line.push_str(&format!(" -> {}", package.path.display()));
    }
    line
}
