//! Build statistics.

use std::fmt::Write as _;

use hap_graph::{AssetList, ModuleId};
use hap_ux::{CompileError, ErrorRecord};
use serde::Serialize;

/// Name and size of one emitted asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetStat {
    pub name: String,
    pub size: usize,
}

/// Informational finding that does not fail the build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildWarning {
    pub kind: String,
    pub modules: Vec<String>,
    pub message: String,
}

impl BuildWarning {
    pub fn cycle(members: &[ModuleId]) -> Self {
        let modules: Vec<String> = members.iter().map(ToString::to_string).collect();
        let message = format!("import cycle: {}", modules.join(" -> "));
        Self {
            kind: "CycleDetected".to_string(),
            modules,
            message,
        }
    }
}

/// Per-module compile sizes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleStat {
    pub id: String,
    pub source_size: usize,
    pub output_size: usize,
}

/// Statistics of one build, serialized as the stats JSON document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildStats {
    pub assets: Vec<AssetStat>,
    pub errors: Vec<ErrorRecord>,
    pub warnings: Vec<BuildWarning>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub modules: Vec<ModuleStat>,
}

impl BuildStats {
    pub fn new(assets: &AssetList, warnings: Vec<BuildWarning>, modules: Vec<ModuleStat>) -> Self {
        Self {
            assets: assets
                .iter()
                .map(|asset| AssetStat {
                    name: asset.name.clone(),
                    size: asset.size(),
                })
                .collect(),
            errors: Vec::new(),
            warnings,
            modules,
        }
    }

    /// Stats of a failed build: no assets, every error.
    pub fn failed(errors: &[CompileError]) -> Self {
        Self {
            errors: errors.iter().map(CompileError::record).collect(),
            ..Self::default()
        }
    }

    pub fn asset_count(&self) -> usize {
        self.assets.len()
    }

    pub fn total_size(&self) -> usize {
        self.assets.iter().map(|asset| asset.size).sum()
    }

    pub fn asset_names(&self) -> Vec<&str> {
        self.assets.iter().map(|asset| asset.name.as_str()).collect()
    }

    /// `length: N` followed by one asset name per line.
    pub fn asset_listing(&self) -> String {
        let mut listing = format!("length: {}", self.assets.len());
        for asset in &self.assets {
            let _ = write!(listing, "\n{}", asset.name);
        }
        listing
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
