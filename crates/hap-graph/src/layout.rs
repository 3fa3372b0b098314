//! Mapping between file-system paths and module identities.

use std::path::{Component, Path, PathBuf};

use path_clean::PathClean;

use crate::ModuleId;

/// Where a project lives on disk.
///
/// Module ids are relative to `src_root`. Files found in an external lookup
/// directory (a module dir outside the source root, such as `node_modules`)
/// keep their project-relative path as id, so the first segment of the id
/// names that directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    project_root: PathBuf,
    src_root: PathBuf,
    external_dirs: Vec<String>,
}

impl ProjectLayout {
    /// Create a layout. `src_dir` is relative to `project_root` (usually `src`).
    pub fn new(project_root: impl Into<PathBuf>, src_dir: impl AsRef<Path>) -> Self {
        let project_root = project_root.into().clean();
        let src_root = project_root.join(src_dir.as_ref()).clean();
        Self {
            project_root,
            src_root,
            external_dirs: Vec::new(),
        }
    }

    /// Register a top-level project directory (e.g. `node_modules`) whose
    /// files are addressed by project-relative ids.
    pub fn with_external_dir(mut self, dir: impl Into<String>) -> Self {
        let dir = dir.into();
        if !self.external_dirs.contains(&dir) {
            self.external_dirs.push(dir);
        }
        self
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn src_root(&self) -> &Path {
        &self.src_root
    }

    /// Module id for an absolute path, or `None` if the path is outside the
    /// source root and every external dir.
    pub fn id_for(&self, path: &Path) -> Option<ModuleId> {
        let cleaned = path.clean();
        if let Ok(relative) = cleaned.strip_prefix(&self.src_root) {
            return ModuleId::new(to_slash(relative)?).ok();
        }
        let relative = cleaned.strip_prefix(&self.project_root).ok()?;
        let slashed = to_slash(relative)?;
        let first = slashed.split('/').next()?;
        if self.external_dirs.iter().any(|dir| dir == first) {
            return ModuleId::new(slashed).ok();
        }
        None
    }

    /// Absolute path of a file-backed module.
    pub fn path_for(&self, id: &ModuleId) -> PathBuf {
        let first = id.as_str().split('/').next().unwrap_or_default();
        if self.external_dirs.iter().any(|dir| dir == first) {
            self.project_root.join(id.as_str())
        } else {
            self.src_root.join(id.as_str())
        }
    }

    /// Returns `true` if `path` is inside the project root.
    pub fn contains(&self, path: &Path) -> bool {
        path.clean().starts_with(&self.project_root)
    }
}

fn to_slash(path: &Path) -> Option<String> {
    let mut parts = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str()?.to_string()),
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some(parts.join("/"))
}
