use std::fs;
use std::io::{Cursor, Read, Write};

use ed25519_dalek::SigningKey;
use ed25519_dalek::pkcs8::EncodePrivateKey;
use ed25519_dalek::pkcs8::spki::der::pem::LineEnding;
use hap_config::BuildProfile;
use hap_graph::{Asset, AssetKind, AssetList};
use hap_packager::{
    CERT_ENTRY, MANIFEST_ENTRY, META_INF_DIR, PackOptions, PackageError, Packager, SigningMaterial, verify,
};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

fn assets() -> AssetList {
    AssetList::new(vec![
        Asset::new("pages/Demo/index.js", AssetKind::Chunk, b"$app_define$(...)".to_vec()),
        Asset::new("app.js", AssetKind::Chunk, b"var app = {};".to_vec()),
        Asset::new("manifest.json", AssetKind::Manifest, b"{\"package\":\"com.example.demo\"}".to_vec()),
        Asset::new("common/logo.png", AssetKind::Media, vec![0x89, b'P', b'N', b'G']),
    ])
    .unwrap()
}

fn material() -> SigningMaterial {
    SigningMaterial::new(SigningKey::from_bytes(&[42u8; 32]), b"-----BEGIN CERTIFICATE-----".to_vec())
}

fn options(streaming: bool, profile: BuildProfile, signing: Option<SigningMaterial>) -> PackOptions {
    PackOptions {
        streaming,
        build_tag: None,
        signing,
        profile,
    }
}

#[test]
fn signed_archive_has_meta_inf_and_cert() {
    let packager = Packager::new("com.example.demo");
    let bytes = packager
        .pack(&assets(), &options(false, BuildProfile::Release, Some(material())))
        .unwrap();

    let report = verify(&bytes).unwrap();
    assert_eq!(
        report.entries,
        [
            "app.js",
            "common/logo.png",
            "manifest.json",
            "pages/Demo/index.js",
            META_INF_DIR,
            MANIFEST_ENTRY,
            CERT_ENTRY,
        ]
    );
    assert!(report.signed);
    let manifest = report.manifest.unwrap();
    assert_eq!(manifest.package, "com.example.demo");
    assert_eq!(manifest.profile, BuildProfile::Release);
    assert_eq!(manifest.entries.len(), 4);
}

#[test]
fn streaming_archive_has_no_meta_inf() {
    let packager = Packager::new("com.example.demo");
    for profile in [BuildProfile::Dev, BuildProfile::Release] {
        let bytes = packager.pack(&assets(), &options(true, profile, Some(material()))).unwrap();
        let report = verify(&bytes).unwrap();
        assert!(!report.has_meta_inf());
        assert!(!report.signed);
        assert_eq!(report.entries.len(), 4);
    }
}

#[test]
fn streaming_writes_to_unseekable_destination() {
    let assets = assets();
    let mut out: Vec<u8> = Vec::new();
    Packager::new("com.example.demo").stream_into(assets.iter(), &mut out).unwrap();

    let report = verify(&out).unwrap();
    let names: Vec<&str> = assets.iter().map(|asset| asset.name.as_str()).collect();
    assert_eq!(report.entries, names);
}

#[test]
fn unsigned_dev_archive_has_manifest_without_cert() {
    let bytes = Packager::new("com.example.demo")
        .pack(&assets(), &options(false, BuildProfile::Dev, None))
        .unwrap();
    let report = verify(&bytes).unwrap();
    assert!(report.has_meta_inf());
    assert!(report.entries.iter().any(|name| name == MANIFEST_ENTRY));
    assert!(!report.entries.iter().any(|name| name == CERT_ENTRY));
    assert!(!report.signed);
}

#[test]
fn archives_are_reproducible() {
    let packager = Packager::new("com.example.demo");
    let opts = options(false, BuildProfile::Release, Some(material()));
    assert_eq!(packager.pack(&assets(), &opts).unwrap(), packager.pack(&assets(), &opts).unwrap());
}

#[test]
fn release_without_material_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let dist = dir.path().join("dist");
    let packager = Packager::new("com.example.demo");

    for streaming in [false, true] {
        let err = packager
            .pack_to(&assets(), &options(streaming, BuildProfile::Release, None), &dist)
            .unwrap_err();
        assert!(matches!(err, PackageError::MissingSigningMaterial { .. }));
    }
    assert!(!dist.join("com.example.demo.release.rpk").exists());
}

#[test]
fn failed_attempt_keeps_previous_package() {
    let dir = TempDir::new().unwrap();
    let packager = Packager::new("com.example.demo");
    let mut opts = options(false, BuildProfile::Release, Some(material()));
    opts.build_tag = Some("dev".into());

    let first = packager.pack_to(&assets(), &opts, dir.path()).unwrap();
    assert_eq!(first.path, dir.path().join("com.example.demo.release.dev.rpk"));
    let before = fs::read(&first.path).unwrap();
    assert_eq!(before.len() as u64, first.size);

    opts.signing = None;
    assert!(packager.pack_to(&assets(), &opts, dir.path()).is_err());
    assert_eq!(fs::read(&first.path).unwrap(), before);

    let names: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(names, ["com.example.demo.release.dev.rpk"]);
}

#[test]
fn signing_material_loads_from_pem_files() {
    let dir = TempDir::new().unwrap();
    let key_path = dir.path().join("private.pem");
    let cert_path = dir.path().join("certificate.pem");
    let key = SigningKey::from_bytes(&[9u8; 32]);
    fs::write(&key_path, key.to_pkcs8_pem(LineEnding::LF).unwrap().as_bytes()).unwrap();
    fs::write(&cert_path, "CERT").unwrap();

    let material = SigningMaterial::load(&key_path, &cert_path).unwrap();
    assert_eq!(material.verifying_key(), key.verifying_key());

    assert!(SigningMaterial::load_optional(&dir.path().join("absent.pem"), &cert_path).unwrap().is_none());

    fs::write(&key_path, "not a key").unwrap();
    assert!(matches!(
        SigningMaterial::load(&key_path, &cert_path),
        Err(PackageError::InvalidSigningMaterial { .. })
    ));
}

#[test]
fn tampered_entries_fail_verification() {
    let bytes = Packager::new("com.example.demo")
        .pack(&assets(), &options(false, BuildProfile::Dev, Some(material())))
        .unwrap();
    assert!(verify(&bytes).unwrap().signed);

    let tampered = rewrite(&bytes, "app.js", b"var app = { evil: true };");
    assert!(matches!(verify(&tampered), Err(PackageError::Verification(_))));
}

/// Copy an archive, replacing the content of one entry.
fn rewrite(bytes: &[u8], replace: &str, content: &[u8]) -> Vec<u8> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut out = ZipWriter::new(Cursor::new(Vec::new()));
    for index in 0..archive.len() {
        let mut file = archive.by_index(index).unwrap();
        let name = file.name().to_string();
        if file.is_dir() {
            out.add_directory(name, SimpleFileOptions::default()).unwrap();
            continue;
        }
        let mut data = Vec::new();
        file.read_to_end(&mut data).unwrap();
        if name == replace {
            data = content.to_vec();
        }
        out.start_file(name, SimpleFileOptions::default()).unwrap();
        out.write_all(&data).unwrap();
    }
    out.finish().unwrap().into_inner()
}
