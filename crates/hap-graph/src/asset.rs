//! Assets destined for the package.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What an asset carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssetKind {
    /// Compiled script chunk (`<stem>.js`).
    Chunk,
    /// Split style object (`<stem>.css.json`).
    Style,
    /// Package manifest (`manifest.json`).
    Manifest,
    /// Verbatim media file.
    Media,
}

/// A named, content-bearing unit of the package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    /// Logical `/`-separated path inside the package.
    pub name: String,
    pub kind: AssetKind,
    pub content: Arc<[u8]>,
}

impl Asset {
    pub fn new(name: impl Into<String>, kind: AssetKind, content: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            kind,
            content: content.into(),
        }
    }

    pub fn size(&self) -> usize {
        self.content.len()
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AssetError {
    #[error("duplicate asset name '{0}'")]
    DuplicateName(String),
}

/// Assets sorted by logical path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetList {
    assets: Vec<Asset>,
}

impl AssetList {
    /// Sort `assets` by name. Two assets with one name are rejected.
    pub fn new(mut assets: Vec<Asset>) -> Result<Self, AssetError> {
        assets.sort_by(|a, b| a.name.cmp(&b.name));
        if let Some(pair) = assets.windows(2).find(|pair| pair[0].name == pair[1].name) {
            return Err(AssetError::DuplicateName(pair[0].name.clone()));
        }
        Ok(Self { assets })
    }

    pub fn get(&self, name: &str) -> Option<&Asset> {
        self.assets
            .binary_search_by(|asset| asset.name.as_str().cmp(name))
            .ok()
            .map(|index| &self.assets[index])
    }

    pub fn names(&self) -> Vec<&str> {
        self.assets.iter().map(|asset| asset.name.as_str()).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Asset> {
        self.assets.iter()
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Sum of all asset sizes in bytes.
    pub fn total_size(&self) -> usize {
        self.assets.iter().map(Asset::size).sum()
    }
}

impl<'a> IntoIterator for &'a AssetList {
    type Item = &'a Asset;
    type IntoIter = std::slice::Iter<'a, Asset>;

    fn into_iter(self) -> Self::IntoIter {
        self.assets.iter()
    }
}

impl IntoIterator for AssetList {
    type Item = Asset;
    type IntoIter = std::vec::IntoIter<Asset>;

    fn into_iter(self) -> Self::IntoIter {
        self.assets.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(name: &str, body: &str) -> Asset {
        Asset::new(name, AssetKind::Chunk, body.as_bytes())
    }

    #[test]
    fn sorted_by_name() {
        let list = AssetList::new(vec![
            asset("pages/Demo/index.js", "b"),
            asset("app.js", "a"),
            asset("manifest.json", "{}"),
        ])
        .unwrap();
        assert_eq!(list.names(), vec!["app.js", "manifest.json", "pages/Demo/index.js"]);
        assert_eq!(list.total_size(), 4);
        assert_eq!(list.get("manifest.json").unwrap().size(), 2);
        assert!(list.get("missing.js").is_none());
    }

    #[test]
    fn duplicate_names_rejected() {
        let err = AssetList::new(vec![asset("app.js", "a"), asset("app.js", "b")]).unwrap_err();
        assert_eq!(err, AssetError::DuplicateName("app.js".into()));
    }
}
