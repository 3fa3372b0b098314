//! Shared fixtures for hap-bundler tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ed25519_dalek::SigningKey;
use ed25519_dalek::pkcs8::EncodePrivateKey;
use ed25519_dalek::pkcs8::spki::der::pem::LineEnding;
use hap_bundler::{BuildOutput, Bundler, EmitOptions};
use hap_graph::{MemoryRuntime, ModuleId, ProjectLayout, Resolver, ResolverConfig};
use tempfile::TempDir;

pub const ROOT: &str = "/proj";

pub const MANIFEST: &str = r#"{
  "package": "com.example.demo",
  "name": "demo",
  "versionName": "1.0.0",
  "versionCode": 1,
  "features": [{ "name": "system.prompt" }],
  "router": {
    "entry": "pages/Demo",
    "pages": { "pages/Demo": { "component": "index" } }
  }
}"#;

pub const APP: &str = "<script>\nexport default { onCreate () {} }\n</script>\n";

pub const DEMO: &str = r#"<import name="comp-part" src="./part"></import>
<template>
  <div class="page">
    <comp-part title="{{ title }}"></comp-part>
  </div>
</template>
<style>
  .page { flex-direction: column; }
</style>
<script>
import fetch from '@system.fetch'
import util from '../../common/util'
export default {
  data: { title: 'hi' }
}
</script>
"#;

pub const PART: &str = "<template>\n  <text>part</text>\n</template>\n";

/// A small but complete project: app, one page importing a component, a
/// script module and a built-in, plus one image.
pub fn demo_files() -> Vec<(&'static str, &'static str)> {
    vec![
        ("src/manifest.json", MANIFEST),
        ("src/app.ux", APP),
        ("src/pages/Demo/index.ux", DEMO),
        ("src/pages/Demo/part.ux", PART),
        ("src/common/util.js", "export default { add (a, b) { return a + b } }\n"),
        ("src/common/logo.png", "PNG"),
    ]
}

pub fn memory_runtime(files: &[(&str, &str)]) -> Arc<MemoryRuntime> {
    Arc::new(MemoryRuntime::with_files(Path::new(ROOT), files.iter().copied()))
}

pub fn bundler(runtime: Arc<MemoryRuntime>, options: EmitOptions) -> Bundler {
    let config = ResolverConfig::new(ProjectLayout::new(ROOT, "src"));
    Bundler::new(Arc::new(Resolver::new(config, runtime)), options)
}

pub fn src(path: &str) -> PathBuf {
    Path::new(ROOT).join("src").join(path)
}

pub fn id(value: &str) -> ModuleId {
    ModuleId::new(value).unwrap()
}

pub fn names(output: &BuildOutput) -> Vec<&str> {
    output.assets.names()
}

pub fn asset_text(output: &BuildOutput, name: &str) -> String {
    let asset = output.assets.get(name).unwrap_or_else(|| panic!("missing asset {name}"));
    String::from_utf8(asset.content.to_vec()).unwrap()
}

/// Write `files` into a fresh temporary project directory.
pub fn disk_project(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().expect("temp dir");
    for (path, content) in files {
        let target = dir.path().join(path);
        fs::create_dir_all(target.parent().unwrap()).unwrap();
        fs::write(target, content).unwrap();
    }
    dir
}

/// Place a PKCS#8 key and a certificate at the default signing paths.
pub fn write_signing(root: &Path, profile: &str) -> SigningKey {
    let key = SigningKey::from_bytes(&[7u8; 32]);
    let dir = root.join("sign").join(profile);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("private.pem"), key.to_pkcs8_pem(LineEnding::LF).unwrap().as_bytes()).unwrap();
    fs::write(dir.join("certificate.pem"), "-----BEGIN CERTIFICATE-----\n").unwrap();
    key
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
