//! Credential-at-rest handling.
//!
//! The pool never stores or returns plaintext passwords; everything that
//! touches storage goes through a [`CredentialVault`]. Deployments provide
//! their own implementation backed by real encryption.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use crate::error::{PoolError, Result};

/// Seals plaintext credentials into opaque blobs and back
pub trait CredentialVault: Send + Sync {
    fn encrypt(&self, plaintext: &str) -> Result<Vec<u8>>;
    fn decrypt(&self, blob: &[u8]) -> Result<String>;
}

/// Base64-encoding vault for development and tests.
///
/// Provides no secrecy; it only guarantees the stored blob is not the raw
/// password bytes so the plaintext-never-persisted invariant is exercised.
#[derive(Debug, Clone, Default)]
pub struct PassthroughVault;

impl CredentialVault for PassthroughVault {
    fn encrypt(&self, plaintext: &str) -> Result<Vec<u8>> {
        Ok(BASE64.encode(plaintext.as_bytes()).into_bytes())
    }

    fn decrypt(&self, blob: &[u8]) -> Result<String> {
        let raw = BASE64
            .decode(blob)
            .map_err(|e| PoolError::Vault(format!("invalid credential blob: {}", e)))?;
        String::from_utf8(raw)
            .map_err(|e| PoolError::Vault(format!("credential blob is not UTF-8: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let vault = PassthroughVault;
        let blob = vault.encrypt("s3cret").unwrap();
        assert_eq!(vault.decrypt(&blob).unwrap(), "s3cret");
    }

    #[test]
    fn test_blob_is_not_plaintext() {
        let vault = PassthroughVault;
        let blob = vault.encrypt("s3cret").unwrap();
        assert_ne!(blob.as_slice(), b"s3cret");
    }

    #[test]
    fn test_decrypt_rejects_garbage() {
        let vault = PassthroughVault;
        let err = vault.decrypt(b"\xff\xfe not base64").unwrap_err();
        assert!(matches!(err, PoolError::Vault(_)));
    }
}
