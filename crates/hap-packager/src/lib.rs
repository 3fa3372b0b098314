//! # hap-packager
//!
//! Serializes an [`AssetList`](hap_graph::AssetList) into a zip-compatible
//! `.rpk` archive.
//!
//! - Non-streaming: every asset in list order, then `META-INF/` holding
//!   `MANIFEST.json` (digest of every entry) and, when signing material is
//!   supplied, `CERT` (Ed25519 signature over the manifest).
//! - Streaming: entries are written as assets are pulled; no `META-INF/`.
//!
//! Release builds without signing material fail before any byte is written.
//! Entry timestamps are fixed at 1980-01-01 so identical inputs give
//! identical archives.

pub mod error;
pub mod manifest;
pub mod packager;
pub mod signing;
pub mod verify;

pub use error::{PackageError, Result};
pub use manifest::{ManifestEntry, PackageManifest};
pub use packager::{CERT_ENTRY, MANIFEST_ENTRY, META_INF_DIR, PackOptions, PackageOutput, Packager, package_file_name};
pub use signing::{CertBlock, SigningMaterial};
pub use verify::{VerifyReport, verify};
