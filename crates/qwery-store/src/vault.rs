//! Field-level encryption for secret configuration values.
//!
//! A protected value is self-describing:
//! `enc:{hex nonce}:{hex tag}:{hex ciphertext}`. Anything without the `enc:`
//! marker is treated as plaintext, so stores holding a mix of legacy
//! plaintext and protected values read back correctly.
//!
//! ## Security Model
//!
//! - AES-256-GCM with a fresh random 96-bit nonce per value
//! - The configured key string is stretched with Argon2id, never used directly
//! - Derived key material is zeroized on drop
//! - Key material is supplied by the caller and never persisted

use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce, Tag};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::rngs::OsRng;
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use tracing::warn;
use zeroize::Zeroizing;

use crate::error::{Result, StoreError};

/// Marker prefix of every protected value.
pub const PROTECTED_PREFIX: &str = "enc:";

/// Length of derived key in bytes (32 bytes = 256 bits for AES-256).
const KEY_LENGTH: usize = 32;
const NONCE_LENGTH: usize = 12;
const TAG_LENGTH: usize = 16;

/// Fixed application salt; the key string is the only secret input.
const KEY_SALT: &[u8] = b"qwery-store/secret-vault/v1";

/// Argon2id parameters: 19 MiB, 2 passes, single lane.
const ARGON2_MEMORY_KB: u32 = 19 * 1024;
const ARGON2_ITERATIONS: u32 = 2;
const ARGON2_PARALLELISM: u32 = 1;

/// Encrypts and decrypts individual string values.
pub trait SecretVault: Send + Sync {
    /// Encrypt `plaintext`. Empty input is returned unchanged.
    fn protect(&self, plaintext: &str) -> Result<String>;

    /// Decrypt a protected value.
    ///
    /// Values without the `enc:` marker are returned unchanged. A value that
    /// cannot be decrypted is also returned unchanged (still `enc:`-prefixed);
    /// callers detect that with [`SecretVault::is_protected`].
    fn reveal(&self, value: &str) -> String;

    /// True when `value` carries the `enc:` marker.
    fn is_protected(&self, value: &str) -> bool {
        is_protected(value)
    }
}

/// Pure prefix check for protected values.
pub fn is_protected(value: &str) -> bool {
    value.starts_with(PROTECTED_PREFIX)
}

/// Vault keyed by a locally configured string.
pub struct LocalVault {
    key: Zeroizing<[u8; KEY_LENGTH]>,
}

impl LocalVault {
    /// Derive the vault key from `encryption_key`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidInput` if the key is empty, and
    /// `StoreError::Crypto` if key derivation fails.
    pub fn new(encryption_key: &SecretString) -> Result<Self> {
        let input = encryption_key.expose_secret();
        if input.trim().is_empty() {
            return Err(StoreError::InvalidInput(
                "Encryption key is required".to_string(),
            ));
        }

        let params = Params::new(
            ARGON2_MEMORY_KB,
            ARGON2_ITERATIONS,
            ARGON2_PARALLELISM,
            Some(KEY_LENGTH),
        )
        .map_err(|e| StoreError::Crypto(format!("Failed to create Argon2 params: {}", e)))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let mut key = Zeroizing::new([0u8; KEY_LENGTH]);
        argon2
            .hash_password_into(input.as_bytes(), KEY_SALT, &mut key[..])
            .map_err(|e| StoreError::Crypto(format!("Key derivation failed: {}", e)))?;

        Ok(Self { key })
    }

    /// Convenience constructor from a plain string.
    pub fn from_key(encryption_key: &str) -> Result<Self> {
        Self::new(&SecretString::from(encryption_key.to_string()))
    }

    fn cipher(&self) -> Result<Aes256Gcm> {
        Aes256Gcm::new_from_slice(&self.key[..])
            .map_err(|e| StoreError::Crypto(format!("Invalid key: {}", e)))
    }

    fn try_reveal(&self, value: &str) -> std::result::Result<String, String> {
        let body = &value[PROTECTED_PREFIX.len()..];
        let parts: Vec<&str> = body.split(':').collect();
        let [nonce_hex, tag_hex, ciphertext_hex] = parts.as_slice() else {
            return Err(format!("expected 3 parts, found {}", parts.len()));
        };
        if nonce_hex.is_empty() || tag_hex.is_empty() || ciphertext_hex.is_empty() {
            return Err("empty component".to_string());
        }

        let nonce = hex::decode(nonce_hex).map_err(|e| format!("nonce: {}", e))?;
        let tag = hex::decode(tag_hex).map_err(|e| format!("tag: {}", e))?;
        let mut buffer = hex::decode(ciphertext_hex).map_err(|e| format!("ciphertext: {}", e))?;
        if nonce.len() != NONCE_LENGTH {
            return Err(format!("invalid nonce length {}", nonce.len()));
        }
        if tag.len() != TAG_LENGTH {
            return Err(format!("invalid tag length {}", tag.len()));
        }

        let cipher = self.cipher().map_err(|e| e.to_string())?;
        cipher
            .decrypt_in_place_detached(
                Nonce::from_slice(&nonce),
                b"",
                &mut buffer,
                Tag::from_slice(&tag),
            )
            .map_err(|_| "authentication failed".to_string())?;

        String::from_utf8(buffer).map_err(|e| format!("plaintext is not UTF-8: {}", e))
    }
}

impl SecretVault for LocalVault {
    fn protect(&self, plaintext: &str) -> Result<String> {
        if plaintext.is_empty() {
            return Ok(String::new());
        }

        let mut nonce = [0u8; NONCE_LENGTH];
        OsRng
            .try_fill_bytes(&mut nonce)
            .map_err(|e| StoreError::Crypto(format!("secure random source unavailable: {}", e)))?;

        let cipher = self.cipher()?;
        let mut buffer = plaintext.as_bytes().to_vec();
        let tag = cipher
            .encrypt_in_place_detached(Nonce::from_slice(&nonce), b"", &mut buffer)
            .map_err(|e| StoreError::Crypto(format!("Encryption failed: {}", e)))?;

        Ok(format!(
            "{}{}:{}:{}",
            PROTECTED_PREFIX,
            hex::encode(nonce),
            hex::encode(tag),
            hex::encode(buffer)
        ))
    }

    fn reveal(&self, value: &str) -> String {
        if !is_protected(value) {
            return value.to_string();
        }
        match self.try_reveal(value) {
            Ok(plaintext) => plaintext,
            Err(reason) => {
                warn!(%reason, "failed to decrypt secret");
                value.to_string()
            }
        }
    }
}

impl std::fmt::Debug for LocalVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalVault")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::OnceLock;

    fn vault() -> &'static LocalVault {
        static VAULT: OnceLock<LocalVault> = OnceLock::new();
        VAULT.get_or_init(|| LocalVault::from_key("test-encryption-key").unwrap())
    }

    #[test]
    fn test_round_trip() {
        let protected = vault().protect("my-secret").unwrap();
        assert!(protected.starts_with("enc:"));
        assert_ne!(protected, "my-secret");
        assert_eq!(vault().reveal(&protected), "my-secret");
    }

    #[test]
    fn test_format_has_three_hex_parts() {
        let protected = vault().protect("value").unwrap();
        let parts: Vec<&str> = protected["enc:".len()..].split(':').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].len(), NONCE_LENGTH * 2);
        assert_eq!(parts[1].len(), TAG_LENGTH * 2);
        assert_eq!(parts[2].len(), "value".len() * 2);
    }

    #[test]
    fn test_each_protect_uses_fresh_nonce() {
        let a = vault().protect("same").unwrap();
        let b = vault().protect("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_empty_passes_through() {
        assert_eq!(vault().protect("").unwrap(), "");
    }

    #[test]
    fn test_reveal_plaintext_passes_through() {
        assert_eq!(vault().reveal("plain"), "plain");
    }

    #[test]
    fn test_is_protected() {
        assert!(is_protected("enc:abc"));
        assert!(!is_protected("plain"));
        assert!(vault().is_protected("enc:"));
    }

    #[test]
    fn test_tampered_value_is_returned_unchanged() {
        let protected = vault().protect("secret").unwrap();
        let mut tampered = protected.clone();
        let last = tampered.pop().unwrap();
        tampered.push(if last == '0' { '1' } else { '0' });
        assert_eq!(vault().reveal(&tampered), tampered);
    }

    #[test]
    fn test_malformed_values_are_returned_unchanged() {
        for value in ["enc:", "enc:zz:yy:xx", "enc:00:11", "enc:00:11:22:33"] {
            assert_eq!(vault().reveal(value), value);
        }
    }

    #[test]
    fn test_wrong_key_cannot_reveal() {
        let protected = vault().protect("secret").unwrap();
        let other = LocalVault::from_key("another-key").unwrap();
        assert_eq!(other.reveal(&protected), protected);
    }

    #[test]
    fn test_empty_key_rejected() {
        let result = LocalVault::from_key("");
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Encryption key is required"));
    }

    #[test]
    fn test_debug_redacts() {
        let debug_output = format!("{:?}", vault());
        assert!(debug_output.contains("REDACTED"));
        let key_hex = hex::encode(&vault().key[..4]);
        assert!(!debug_output.contains(&key_hex));
    }
}
