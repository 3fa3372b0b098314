//! Atomic writing of an asset list into the build directory.
//!
//! Every asset is first written next to its destination as `<name>.tmp`.
//! Only when all temp files exist are they renamed into place, so a failed
//! write leaves the previous build directory intact. Asset names are
//! validated so nothing is written outside the build directory.
//!
//! Files left over from an earlier build that are no longer part of the
//! asset list are removed once the new set is in place. Files whose content
//! is unchanged are not rewritten.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use hap_graph::AssetList;
use path_clean::PathClean;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{BuildError, Result};

/// What a write changed on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteSummary {
    pub written: Vec<String>,
    pub unchanged: Vec<String>,
    pub removed: Vec<PathBuf>,
}

/// Write `assets` into `dir`, replacing its previous content.
pub fn write_assets(assets: &AssetList, dir: &Path) -> Result<WriteSummary> {
    let dir = normalize_dir(dir)?;
    fs::create_dir_all(&dir).map_err(|e| {
        BuildError::WriteFailure(format!("Failed to create output directory '{}': {}", dir.display(), e))
    })?;

    let mut summary = WriteSummary::default();
    let mut operations = Vec::new();
    let mut keep = BTreeSet::new();
    for asset in assets {
        let target = validate_output_path(&dir, &asset.name)?;
        keep.insert(target.clone());
        if fs::read(&target).is_ok_and(|existing| existing == *asset.content) {
            summary.unchanged.push(asset.name.clone());
            continue;
        }
        operations.push((target, &asset.content[..]));
        summary.written.push(asset.name.clone());
    }

    write_files_atomic(&operations)?;
    summary.removed = remove_stale(&dir, &keep);

    debug!(
        dir = %dir.display(),
        written = summary.written.len(),
        unchanged = summary.unchanged.len(),
        removed = summary.removed.len(),
        "wrote build directory"
    );
    Ok(summary)
}

fn normalize_dir(dir: &Path) -> Result<PathBuf> {
    let cleaned = dir.clean();
    if cleaned.is_absolute() {
        return Ok(cleaned);
    }
    let cwd = std::env::current_dir()
        .map_err(|e| BuildError::InvalidOutputPath(format!("Failed to get current directory: {}", e)))?;
    Ok(cwd.join(cleaned).clean())
}

/// Resolve `name` under `base_dir`, rejecting anything that escapes it.
fn validate_output_path(base_dir: &Path, name: &str) -> Result<PathBuf> {
    if name.is_empty() || name.contains('\0') {
        return Err(BuildError::InvalidOutputPath(format!("Invalid asset name '{}'", name.escape_debug())));
    }
    if Path::new(name).is_absolute() {
        return Err(BuildError::InvalidOutputPath(format!("Asset name '{}' is absolute", name)));
    }

    let full_path = base_dir.join(Path::new(name).clean()).clean();
    if !full_path.starts_with(base_dir) || full_path == base_dir {
        return Err(BuildError::InvalidOutputPath(format!(
            "Path '{}' escapes output directory '{}' (resolved to '{}')",
            name,
            base_dir.display(),
            full_path.display()
        )));
    }
    Ok(full_path)
}

fn temp_path(target: &Path) -> PathBuf {
    let mut name = target.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    target.with_file_name(name)
}

/// Two-phase write: all temp files, then all renames. Any failure removes
/// every temp file written so far.
fn write_files_atomic(operations: &[(PathBuf, &[u8])]) -> Result<()> {
    let mut temp_files: Vec<(PathBuf, PathBuf)> = Vec::new();

    for (target, content) in operations {
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                cleanup_temp_files(&temp_files);
                BuildError::WriteFailure(format!("Failed to create directory '{}': {}", parent.display(), e))
            })?;
        }

        let temp = temp_path(target);
        fs::write(&temp, content).map_err(|e| {
            cleanup_temp_files(&temp_files);
            BuildError::WriteFailure(format!("Failed to write temporary file '{}': {}", temp.display(), e))
        })?;
        temp_files.push((temp, target.clone()));
    }

    for (temp, target) in &temp_files {
        fs::rename(temp, target).map_err(|e| {
            cleanup_temp_files(&temp_files);
            BuildError::WriteFailure(format!(
                "Failed to rename '{}' to '{}': {}",
                temp.display(),
                target.display(),
                e
            ))
        })?;
    }
    Ok(())
}

fn cleanup_temp_files(temp_files: &[(PathBuf, PathBuf)]) {
    for (temp, _) in temp_files {
        if temp.exists() {
            if let Err(e) = fs::remove_file(temp) {
                warn!(path = %temp.display(), error = %e, "failed to clean up temporary file");
            }
        }
    }
}

/// Delete files under `dir` that are not in `keep`, then any directory the
/// deletion left empty.
fn remove_stale(dir: &Path, keep: &BTreeSet<PathBuf>) -> Vec<PathBuf> {
    let mut removed = Vec::new();
    let mut dirs = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).into_iter().filter_map(|entry| entry.ok()) {
        let path = entry.path();
        if entry.file_type().is_dir() {
            dirs.push(path.to_path_buf());
        } else if !keep.contains(path) {
            match fs::remove_file(path) {
                Ok(()) => removed.push(path.to_path_buf()),
                Err(e) => warn!(path = %path.display(), error = %e, "failed to remove stale file"),
            }
        }
    }
    // Deepest first.
    dirs.sort_by(|a, b| b.components().count().cmp(&a.components().count()));
    for dir in dirs {
        let _ = fs::remove_dir(&dir);
    }
    removed.sort();
    removed
}
