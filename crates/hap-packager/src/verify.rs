//! Archive verification.

use std::io::{Cursor, Read};

use zip::ZipArchive;

use crate::error::{PackageError, Result};
use crate::manifest::PackageManifest;
use crate::packager::{CERT_ENTRY, MANIFEST_ENTRY, META_INF_DIR};
use crate::signing::{CertBlock, sha256_hex};

/// What [`verify`] found in an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyReport {
    /// Entry names in archive order.
    pub entries: Vec<String>,
    pub manifest: Option<PackageManifest>,
    pub signed: bool,
}

impl VerifyReport {
    pub fn has_meta_inf(&self) -> bool {
        self.entries.iter().any(|name| name.starts_with(META_INF_DIR))
    }
}

/// Re-read an archive, recompute every digest listed in its manifest and
/// check the certificate signature.
///
/// Archives without a manifest (streaming output) only have their entries
/// listed.
pub fn verify(archive: &[u8]) -> Result<VerifyReport> {
    let mut zip = ZipArchive::new(Cursor::new(archive))?;
    let mut entries = Vec::with_capacity(zip.len());
    for index in 0..zip.len() {
        entries.push(zip.by_index(index)?.name().to_string());
    }

    let Some(manifest_bytes) = read_entry(&mut zip, MANIFEST_ENTRY)? else {
        return Ok(VerifyReport {
            entries,
            manifest: None,
            signed: false,
        });
    };
    let manifest: PackageManifest = serde_json::from_slice(&manifest_bytes)?;

    for entry in &manifest.entries {
        let content = read_entry(&mut zip, &entry.name)?
            .ok_or_else(|| PackageError::Verification(format!("entry '{}' is missing", entry.name)))?;
        if content.len() as u64 != entry.size || sha256_hex(&content) != entry.sha256 {
            return Err(PackageError::Verification(format!("entry '{}' does not match the manifest", entry.name)));
        }
    }

    let signed = match read_entry(&mut zip, CERT_ENTRY)? {
        Some(cert) => {
            let block: CertBlock = serde_json::from_slice(&cert)?;
            block.verify(&manifest_bytes)?;
            true
        }
        None => false,
    };

    Ok(VerifyReport {
        entries,
        manifest: Some(manifest),
        signed,
    })
}

fn read_entry(zip: &mut ZipArchive<Cursor<&[u8]>>, name: &str) -> Result<Option<Vec<u8>>> {
    let mut file = match zip.by_name(name) {
        Ok(file) => file,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut content = Vec::with_capacity(file.size() as usize);
    file.read_to_end(&mut content)
        .map_err(|e| PackageError::io(name, e))?;
    Ok(Some(content))
}
