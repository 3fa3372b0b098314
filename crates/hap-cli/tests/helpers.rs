//! Project fixtures for CLI tests.

#![allow(dead_code)]

use std::fs;
use std::path::Path;

use ed25519_dalek::SigningKey;
use ed25519_dalek::pkcs8::EncodePrivateKey;
use ed25519_dalek::pkcs8::spki::der::pem::LineEnding;
use tempfile::TempDir;

pub const MANIFEST: &str = r#"{
  "package": "com.example.demo",
  "name": "demo",
  "versionName": "1.0.0",
  "versionCode": 1,
  "router": {
    "entry": "pages/Demo",
    "pages": { "pages/Demo": { "component": "index" } }
  }
}"#;

pub const DEMO: &str = r#"<template>
  <div class="page"><text>{{ title }}</text></div>
</template>
<style>
  .page { flex-direction: column; }
</style>
<script>
import fetch from '@system.fetch'
export default { data: { title: 'hi' } }
</script>
"#;

/// A project with an app unit, one page and an image.
pub fn project() -> TempDir {
    project_with(&[])
}

/// [`project`] with `extra` files written over it.
pub fn project_with(extra: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().expect("temp dir");
    let base = [
        ("src/manifest.json", MANIFEST),
        ("src/app.ux", "<script>\nexport default {}\n</script>\n"),
        ("src/pages/Demo/index.ux", DEMO),
        ("src/common/logo.png", "PNG"),
    ];
    for (path, content) in base.iter().chain(extra) {
        let target = dir.path().join(path);
        fs::create_dir_all(target.parent().unwrap()).unwrap();
        fs::write(target, content).unwrap();
    }
    dir
}

pub fn write_signing(root: &Path, profile: &str) {
    let key = SigningKey::from_bytes(&[9u8; 32]);
    let dir = root.join("sign").join(profile);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("private.pem"), key.to_pkcs8_pem(LineEnding::LF).unwrap().as_bytes()).unwrap();
    fs::write(dir.join("certificate.pem"), "-----BEGIN CERTIFICATE-----\n").unwrap();
}

pub fn dist_files(root: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(root.join("dist")) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .map(|entry| entry.unwrap().file_name().into_string().unwrap())
        .collect();
    names.sort();
    names
}
