//! Core resolution algorithm: path joining and extension probing.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use path_clean::PathClean;

use crate::layout::ProjectLayout;
use crate::runtime::Runtime;
use crate::source::SourceKind;
use crate::ModuleId;

/// Resolve `./x`, `../x` or `/x` imported by `from`.
pub fn resolve_relative(
    specifier: &str,
    from: &ModuleId,
    layout: &ProjectLayout,
    runtime: &dyn Runtime,
) -> Option<ModuleId> {
    let candidate = if let Some(rooted) = specifier.strip_prefix('/') {
        layout.src_root().join(rooted)
    } else {
        let importer = layout.path_for(from);
        let base = importer.parent().unwrap_or(layout.src_root());
        base.join(specifier)
    }
    .clean();

    if !layout.contains(&candidate) {
        return None;
    }

    probe(&candidate, layout, runtime)
}

/// Resolve a bare specifier through the module lookup directories.
pub fn resolve_package_local(
    specifier: &str,
    module_dirs: &[PathBuf],
    layout: &ProjectLayout,
    runtime: &dyn Runtime,
) -> Option<ModuleId> {
    for dir in module_dirs {
        let candidate = dir.join(specifier).clean();
        if !candidate.starts_with(dir) {
            continue;
        }

        if let Some(id) = probe(&candidate, layout, runtime) {
            return Some(id);
        }

        if let Some(id) = probe_package_main(&candidate, layout, runtime) {
            return Some(id);
        }
    }
    None
}

/// Try the exact path, then each probe extension, then `index.<ext>`.
fn probe(candidate: &Path, layout: &ProjectLayout, runtime: &dyn Runtime) -> Option<ModuleId> {
    if let Some(id) = accept(candidate, layout, runtime) {
        return Some(id);
    }

    for ext in SourceKind::PROBE_EXTENSIONS {
        let mut with_ext = OsString::from(candidate.as_os_str());
        with_ext.push(".");
        with_ext.push(ext);
        if let Some(id) = accept(Path::new(&with_ext), layout, runtime) {
            return Some(id);
        }
    }

    for ext in SourceKind::PROBE_EXTENSIONS {
        let index = candidate.join(format!("index.{ext}"));
        if let Some(id) = accept(&index, layout, runtime) {
            return Some(id);
        }
    }

    None
}

fn probe_package_main(dir: &Path, layout: &ProjectLayout, runtime: &dyn Runtime) -> Option<ModuleId> {
    let manifest = dir.join("package.json");
    if !runtime.is_file(&manifest) {
        return None;
    }
    let text = runtime.read_to_string(&manifest).ok()?;
    let parsed: serde_json::Value = serde_json::from_str(&text).ok()?;
    let main = parsed.get("main")?.as_str()?;
    let target = dir.join(main).clean();
    if !target.starts_with(dir) {
        return None;
    }
    probe(&target, layout, runtime)
}

fn accept(path: &Path, layout: &ProjectLayout, runtime: &dyn Runtime) -> Option<ModuleId> {
    if !runtime.is_file(path) {
        return None;
    }
    let id = layout.id_for(path)?;
    SourceKind::detect(&id)?;
    Some(id)
}
