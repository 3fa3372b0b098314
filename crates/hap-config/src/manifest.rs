//! The project manifest (`src/manifest.json`).

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ConfigError, Result};

/// File name of the manifest inside the source root.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Application entry unit.
pub const APP_ENTRY: &str = "app.ux";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectManifest {
    /// Package identity, e.g. `com.example.demo`.
    pub package: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version_name: String,
    #[serde(default)]
    pub version_code: u64,
    #[serde(default = "default_platform_version")]
    pub min_platform_version: u64,
    #[serde(default)]
    pub features: Vec<Feature>,
    #[serde(default)]
    pub router: Router,
    /// Keys this type does not model, passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feature {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Router {
    #[serde(default)]
    pub entry: String,
    #[serde(default)]
    pub pages: IndexMap<String, Page>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    #[serde(default = "default_component")]
    pub component: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_platform_version() -> u64 {
    1070
}

fn default_component() -> String {
    "index".to_string()
}

impl ProjectManifest {
    /// Read `manifest.json` from `src_root`.
    pub fn load(src_root: &Path) -> Result<Self> {
        let path = src_root.join(MANIFEST_FILE);
        if !path.is_file() {
            return Err(ConfigError::ManifestNotFound(path));
        }
        let text = fs::read_to_string(&path)?;
        Self::from_json_str(&text, &path)
    }

    pub fn from_json_str(text: &str, path: &Path) -> Result<Self> {
        let manifest: ProjectManifest = serde_json::from_str(text).map_err(|e| ConfigError::InvalidManifest {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        if manifest.package.trim().is_empty() {
            return Err(ConfigError::InvalidManifest {
                path: path.to_path_buf(),
                message: "'package' must not be empty".to_string(),
            });
        }
        if !manifest.router.entry.is_empty() && !manifest.router.pages.contains_key(&manifest.router.entry) {
            return Err(ConfigError::InvalidManifest {
                path: path.to_path_buf(),
                message: format!("router entry '{}' is not a declared page", manifest.router.entry),
            });
        }
        Ok(manifest)
    }

    /// Entry unit paths relative to the source root: the app unit followed
    /// by every page component in declaration order.
    pub fn entry_points(&self) -> Vec<PathBuf> {
        let mut entries = vec![PathBuf::from(APP_ENTRY)];
        for (page, spec) in &self.router.pages {
            entries.push(Path::new(page).join(format!("{}.ux", spec.component)));
        }
        entries
    }

    /// The manifest with `features` extended by `capabilities` (built-in
    /// specifiers such as `@system.fetch`), sorted and de-duplicated.
    pub fn with_capabilities<'a>(&self, capabilities: impl IntoIterator<Item = &'a str>) -> Self {
        let names: BTreeSet<String> = self
            .features
            .iter()
            .map(|feature| feature.name.clone())
            .chain(
                capabilities
                    .into_iter()
                    .map(|capability| capability.trim_start_matches('@').to_string()),
            )
            .collect();
        let mut manifest = self.clone();
        manifest.features = names.into_iter().map(|name| Feature { name }).collect();
        manifest
    }

    /// Pretty JSON as written into the package.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(self).map_err(|e| ConfigError::InvalidValue {
            field: "manifest".to_string(),
            hint: e.to_string(),
        })
    }
}
