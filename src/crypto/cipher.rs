//! AES-256-GCM session cipher
//!
//! A `PasskeyCipher` wraps one random 256-bit key. Each encryption generates a
//! unique nonce and yields a self-contained base64 token:
//!
//! ```text
//! base64( version (1 byte) || nonce (12 bytes) || ciphertext + tag )
//! ```
//!
//! The key is never derived from a user's passkey. It is generated when a
//! session starts and dies with it, so records sealed in one session cannot be
//! opened in another.

use std::fmt;

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use zeroize::Zeroizing;

use crate::error::{SealboxError, SealboxResult};

/// Size of the AES-GCM nonce in bytes (96 bits)
const NONCE_SIZE: usize = 12;

/// Size of the AES-GCM authentication tag in bytes
const TAG_SIZE: usize = 16;

/// Key length for AES-256
pub const KEY_SIZE: usize = 32;

/// Token format version
const TOKEN_VERSION: u8 = 1;

/// Symmetric cipher bound to a single session key
pub struct PasskeyCipher {
    key: Zeroizing<[u8; KEY_SIZE]>,
}

impl PasskeyCipher {
    /// Create a cipher with a freshly generated random key
    pub fn generate() -> Self {
        let mut key = Zeroizing::new([0u8; KEY_SIZE]);
        OsRng.fill_bytes(&mut key[..]);
        Self { key }
    }

    /// Create a cipher from existing key material
    pub fn from_key(key: [u8; KEY_SIZE]) -> Self {
        Self {
            key: Zeroizing::new(key),
        }
    }

    fn cipher(&self) -> SealboxResult<Aes256Gcm> {
        Aes256Gcm::new_from_slice(&self.key[..])
            .map_err(|e| SealboxError::Decryption(format!("Failed to create cipher: {}", e)))
    }

    /// Encrypt plaintext bytes into a transport-safe token
    pub fn encrypt(&self, plaintext: &[u8]) -> SealboxResult<String> {
        let cipher = self.cipher()?;

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext)
            .map_err(|e| SealboxError::Decryption(format!("Encryption failed: {}", e)))?;

        let mut raw = Vec::with_capacity(1 + NONCE_SIZE + ciphertext.len());
        raw.push(TOKEN_VERSION);
        raw.extend_from_slice(&nonce_bytes);
        raw.extend_from_slice(&ciphertext);

        Ok(STANDARD.encode(raw))
    }

    /// Decrypt a token produced by [`PasskeyCipher::encrypt`]
    ///
    /// Any malformed, tampered or foreign token yields `Decryption`; no partial
    /// plaintext is ever returned.
    pub fn decrypt(&self, token: &str) -> SealboxResult<Vec<u8>> {
        let raw = STANDARD
            .decode(token.trim())
            .map_err(|e| SealboxError::Decryption(format!("Invalid token encoding: {}", e)))?;

        if raw.len() < 1 + NONCE_SIZE + TAG_SIZE {
            return Err(SealboxError::Decryption(format!(
                "Token too short: {} bytes",
                raw.len()
            )));
        }

        let (version, rest) = raw.split_at(1);
        if version[0] != TOKEN_VERSION {
            return Err(SealboxError::Decryption(format!(
                "Unsupported token version: {}",
                version[0]
            )));
        }

        let (nonce_bytes, ciphertext) = rest.split_at(NONCE_SIZE);
        let nonce = Nonce::from_slice(nonce_bytes);

        self.cipher()?.decrypt(nonce, ciphertext).map_err(|_| {
            SealboxError::Decryption("invalid key or corrupted data".to_string())
        })
    }
}

// Never print key material
impl fmt::Debug for PasskeyCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasskeyCipher")
            .field("key", &"[REDACTED]")
            .finish()
    }
}
