//! Signing material and the `META-INF/CERT` block.

use std::fmt;
use std::fs;
use std::path::Path;

use ed25519_dalek::pkcs8::DecodePrivateKey;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{PackageError, Result};

/// Ed25519 key plus the certificate that vouches for it. Loaded per build,
/// never written anywhere.
#[derive(Clone)]
pub struct SigningMaterial {
    key: SigningKey,
    certificate: Vec<u8>,
}

impl fmt::Debug for SigningMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningMaterial")
            .field("public_key", &hex::encode(self.key.verifying_key().as_bytes()))
            .field("certificate_len", &self.certificate.len())
            .finish()
    }
}

impl SigningMaterial {
    pub fn new(key: SigningKey, certificate: impl Into<Vec<u8>>) -> Self {
        Self {
            key,
            certificate: certificate.into(),
        }
    }

    /// Load a PKCS#8 PEM private key and a certificate file.
    pub fn load(private_key: &Path, certificate: &Path) -> Result<Self> {
        let pem = fs::read_to_string(private_key).map_err(|e| PackageError::io(private_key, e))?;
        let key = SigningKey::from_pkcs8_pem(&pem).map_err(|e| PackageError::InvalidSigningMaterial {
            path: private_key.to_path_buf(),
            message: e.to_string(),
        })?;
        let certificate = fs::read(certificate).map_err(|e| PackageError::io(certificate, e))?;
        Ok(Self::new(key, certificate))
    }

    /// Like [`SigningMaterial::load`], but a missing private key yields
    /// `Ok(None)`.
    pub fn load_optional(private_key: &Path, certificate: &Path) -> Result<Option<Self>> {
        if !private_key.is_file() {
            return Ok(None);
        }
        Self::load(private_key, certificate).map(Some)
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.key.verifying_key()
    }

    /// Sign `manifest` and build the certificate block.
    pub fn sign(&self, manifest: &[u8]) -> CertBlock {
        let signature = self.key.sign(manifest);
        CertBlock {
            algorithm: CertBlock::ALGORITHM.to_string(),
            digest: sha256_hex(manifest),
            signature: hex::encode(signature.to_bytes()),
            public_key: hex::encode(self.key.verifying_key().as_bytes()),
            certificate: String::from_utf8_lossy(&self.certificate).into_owned(),
        }
    }
}

/// Contents of `META-INF/CERT`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertBlock {
    pub algorithm: String,
    /// SHA-256 of the manifest bytes, hex.
    pub digest: String,
    /// Ed25519 signature over the manifest bytes, hex.
    pub signature: String,
    pub public_key: String,
    pub certificate: String,
}

impl CertBlock {
    pub const ALGORITHM: &'static str = "ed25519";

    /// Check the block against the manifest bytes it claims to sign.
    pub fn verify(&self, manifest: &[u8]) -> Result<()> {
        let fail = |message: &str| PackageError::Verification(message.to_string());

        if self.algorithm != Self::ALGORITHM {
            return Err(fail("unsupported signature algorithm"));
        }
        if self.digest != sha256_hex(manifest) {
            return Err(fail("manifest digest mismatch"));
        }
        let key: [u8; 32] = hex::decode(&self.public_key)
            .ok()
            .and_then(|bytes| bytes.try_into().ok())
            .ok_or_else(|| fail("malformed public key"))?;
        let key = VerifyingKey::from_bytes(&key).map_err(|_| fail("malformed public key"))?;
        let signature: [u8; 64] = hex::decode(&self.signature)
            .ok()
            .and_then(|bytes| bytes.try_into().ok())
            .ok_or_else(|| fail("malformed signature"))?;
        key.verify(manifest, &Signature::from_bytes(&signature))
            .map_err(|_| fail("bad signature"))
    }
}

pub(crate) fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn material() -> SigningMaterial {
        SigningMaterial::new(SigningKey::from_bytes(&[7u8; 32]), b"CERT".to_vec())
    }

    #[test]
    fn signed_block_verifies() {
        let block = material().sign(b"manifest");
        assert_eq!(block.algorithm, "ed25519");
        assert_eq!(block.certificate, "CERT");
        block.verify(b"manifest").unwrap();
    }

    #[test]
    fn tampered_manifest_is_rejected() {
        let block = material().sign(b"manifest");
        assert!(matches!(block.verify(b"manifest!"), Err(PackageError::Verification(_))));

        let mut forged = block.clone();
        forged.digest = sha256_hex(b"other");
        assert!(forged.verify(b"other").is_err());
    }

    #[test]
    fn debug_hides_the_private_key() {
        let debug = format!("{:?}", material());
        assert!(debug.contains("public_key"));
        assert!(!debug.contains("SigningKey"));
    }

    #[test]
    fn sha256_of_empty_input() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
