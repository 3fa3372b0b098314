//! Archive assembly.

use std::fs;
use std::io::{Cursor, Seek, Write};
use std::path::{Path, PathBuf};

use hap_config::BuildProfile;
use hap_graph::{Asset, AssetList};
use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use crate::error::{PackageError, Result};
use crate::manifest::PackageManifest;
use crate::signing::SigningMaterial;

pub const META_INF_DIR: &str = "META-INF/";
pub const MANIFEST_ENTRY: &str = "META-INF/MANIFEST.json";
pub const CERT_ENTRY: &str = "META-INF/CERT";

/// Options of one packaging attempt.
#[derive(Debug, Clone, Default)]
pub struct PackOptions {
    /// Write entries as they are produced, without `META-INF/`.
    pub streaming: bool,
    pub build_tag: Option<String>,
    pub signing: Option<SigningMaterial>,
    pub profile: BuildProfile,
}

/// A package written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageOutput {
    pub path: PathBuf,
    pub size: u64,
}

/// Writes `.rpk` archives for one application package.
#[derive(Debug, Clone)]
pub struct Packager {
    package: String,
}

/// `<package>.<profile>[.<build_tag>].rpk`.
pub fn package_file_name(package: &str, profile: BuildProfile, build_tag: Option<&str>) -> String {
    match build_tag {
        Some(tag) => format!("{package}.{profile}.{tag}.rpk"),
        None => format!("{package}.{profile}.rpk"),
    }
}

fn entry_options() -> SimpleFileOptions {
    SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default())
        .unix_permissions(0o644)
}

impl Packager {
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
        }
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn file_name(&self, options: &PackOptions) -> String {
        package_file_name(&self.package, options.profile, options.build_tag.as_deref())
    }

    /// Build the archive in memory.
    pub fn pack(&self, assets: &AssetList, options: &PackOptions) -> Result<Vec<u8>> {
        check_signing(options)?;
        let mut buffer = Cursor::new(Vec::new());
        if options.streaming {
            self.stream_into(assets.iter(), &mut buffer)?;
        } else {
            self.write_archive(assets, options, &mut buffer)?;
        }
        Ok(buffer.into_inner())
    }

    /// Write the archive into `dist_dir`. The archive is assembled in a
    /// temporary file next to its destination and renamed into place only
    /// once complete.
    pub fn pack_to(&self, assets: &AssetList, options: &PackOptions, dist_dir: &Path) -> Result<PackageOutput> {
        check_signing(options)?;
        fs::create_dir_all(dist_dir).map_err(|e| PackageError::io(dist_dir, e))?;
        let path = dist_dir.join(self.file_name(options));

        let mut temp = tempfile::Builder::new()
            .prefix(".rpk-")
            .suffix(".tmp")
            .tempfile_in(dist_dir)
            .map_err(|e| PackageError::io(dist_dir, e))?;
        if options.streaming {
            self.stream_into(assets.iter(), temp.as_file_mut())?;
        } else {
            self.write_archive(assets, options, temp.as_file_mut())?;
        }
        temp.as_file().sync_all().map_err(|e| PackageError::io(temp.path(), e))?;
        let size = temp
            .as_file()
            .metadata()
            .map_err(|e| PackageError::io(temp.path(), e))?
            .len();
        temp.persist(&path).map_err(|e| PackageError::io(&path, e.error))?;

        info!(path = %path.display(), size, "package written");
        Ok(PackageOutput { path, size })
    }

    /// Streaming mode: every asset becomes an entry the moment it is pulled
    /// from `assets`. The destination need not be seekable.
    pub fn stream_into<'a, W: Write>(&self, assets: impl IntoIterator<Item = &'a Asset>, dest: W) -> Result<()> {
        let mut zip = ZipWriter::new_stream(dest);
        let options = entry_options();
        let mut count = 0usize;
        for asset in assets {
            zip.start_file(asset.name.as_str(), options)?;
            zip.write_all(&asset.content).map_err(|e| PackageError::io(&asset.name, e))?;
            count += 1;
        }
        zip.finish()?;
        debug!(package = %self.package, entries = count, "streamed archive");
        Ok(())
    }

    /// Non-streaming mode: assets, then `META-INF/` with the manifest and,
    /// when signing material is present, the certificate block.
    fn write_archive<W: Write + Seek>(&self, assets: &AssetList, options: &PackOptions, dest: W) -> Result<()> {
        let mut zip = ZipWriter::new(dest);
        let file_options = entry_options();
        for asset in assets {
            zip.start_file(asset.name.as_str(), file_options)?;
            zip.write_all(&asset.content).map_err(|e| PackageError::io(&asset.name, e))?;
        }

        let manifest = PackageManifest::new(&self.package, options.build_tag.as_deref(), options.profile, assets);
        let manifest_bytes = manifest.to_bytes()?;

        zip.add_directory(META_INF_DIR, file_options)?;
        zip.start_file(MANIFEST_ENTRY, file_options)?;
        zip.write_all(&manifest_bytes).map_err(|e| PackageError::io(MANIFEST_ENTRY, e))?;

        if let Some(material) = &options.signing {
            let cert = serde_json::to_vec_pretty(&material.sign(&manifest_bytes))?;
            zip.start_file(CERT_ENTRY, file_options)?;
            zip.write_all(&cert).map_err(|e| PackageError::io(CERT_ENTRY, e))?;
        }

        zip.finish()?;
        debug!(
            package = %self.package,
            entries = assets.len(),
            signed = options.signing.is_some(),
            "wrote archive"
        );
        Ok(())
    }
}

/// Release builds must be signed. Checked before any byte is produced.
fn check_signing(options: &PackOptions) -> Result<()> {
    if options.profile.requires_signing() && options.signing.is_none() {
        return Err(PackageError::MissingSigningMaterial {
            profile: options.profile,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names() {
        assert_eq!(package_file_name("com.a.b", BuildProfile::Dev, None), "com.a.b.dev.rpk");
        assert_eq!(
            package_file_name("com.a.b", BuildProfile::Release, Some("202401010000")),
            "com.a.b.release.202401010000.rpk"
        );
    }

    #[test]
    fn release_without_material_fails_first() {
        let options = PackOptions {
            profile: BuildProfile::Release,
            ..PackOptions::default()
        };
        let assets = AssetList::new(Vec::new()).unwrap();
        let err = Packager::new("com.a.b").pack(&assets, &options).unwrap_err();
        assert!(matches!(err, PackageError::MissingSigningMaterial { .. }));
    }
}
