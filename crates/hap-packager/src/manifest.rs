//! `META-INF/MANIFEST.json`.

use hap_config::BuildProfile;
use hap_graph::AssetList;
use serde::{Deserialize, Serialize};

use crate::signing::sha256_hex;

/// Identity and digest list of one package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageManifest {
    pub package: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_tag: Option<String>,
    pub profile: BuildProfile,
    pub entries: Vec<ManifestEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub name: String,
    pub size: u64,
    pub sha256: String,
}

impl PackageManifest {
    pub fn new(package: &str, build_tag: Option<&str>, profile: BuildProfile, assets: &AssetList) -> Self {
        let entries = assets
            .iter()
            .map(|asset| ManifestEntry {
                name: asset.name.clone(),
                size: asset.size() as u64,
                sha256: sha256_hex(&asset.content),
            })
            .collect();
        Self {
            package: package.to_string(),
            build_tag: build_tag.map(str::to_string),
            profile,
            entries,
        }
    }

    pub fn to_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec_pretty(self)
    }
}
