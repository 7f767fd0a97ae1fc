//! Symmetric encryption of stored secrets.
//!
//! Token format (standard base64 of):
//! - nonce: 24 bytes (XChaCha20-Poly1305)
//! - ciphertext: AEAD output (ciphertext + 16-byte tag)

use std::fmt;

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use chacha20poly1305::{
    Key, XChaCha20Poly1305, XNonce,
    aead::{Aead, KeyInit},
};
use rand::Rng;
use zeroize::Zeroize;

use crate::error::{ConfigError, DecryptionError, Error, StorageError};

/// Key length (256-bit).
pub const KEY_LEN: usize = 32;

/// Nonce length for XChaCha20-Poly1305.
pub const NONCE_LEN: usize = 24;

/// Poly1305 tag length.
const TAG_LEN: usize = 16;

/// Encrypts and decrypts secrets with a key derived from configuration.
///
/// The key is derived once from the configured secret: its bytes are padded
/// with spaces or truncated to [`KEY_LEN`]. Encryption uses a fresh random
/// nonce, so the same plaintext yields different tokens.
#[derive(Clone)]
pub struct Cipher {
    aead: XChaCha20Poly1305,
}

impl Cipher {
    /// Build a cipher from the configured secret.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the secret is empty.
    pub fn from_secret(secret: &str) -> Result<Self, Error> {
        if secret.is_empty() {
            return Err(ConfigError::Invalid {
                name: "encryption key",
                reason: "must not be empty".to_string(),
            }
            .into());
        }

        let mut key = [b' '; KEY_LEN];
        let bytes = secret.as_bytes();
        let len = bytes.len().min(KEY_LEN);
        key[..len].copy_from_slice(&bytes[..len]);

        let aead = XChaCha20Poly1305::new(Key::from_slice(&key));
        key.zeroize();

        Ok(Self { aead })
    }

    /// Encrypt a plaintext secret into a storable token.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, Error> {
        let mut nonce = [0u8; NONCE_LEN];
        rand::thread_rng().fill(&mut nonce);

        let ciphertext = self
            .aead
            .encrypt(XNonce::from_slice(&nonce), plaintext.as_bytes())
            .map_err(|_| StorageError::Encryption)?;

        let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&ciphertext);

        Ok(BASE64.encode(out))
    }

    /// Decrypt a token produced by [`Cipher::encrypt`].
    ///
    /// # Errors
    ///
    /// Fails with [`DecryptionError`] on malformed, truncated or tampered
    /// tokens and on tokens produced under a different key. Never returns
    /// corrupted plaintext.
    pub fn decrypt(&self, token: &str) -> Result<String, DecryptionError> {
        let raw = BASE64
            .decode(token.trim())
            .map_err(|_| DecryptionError::Encoding)?;

        if raw.len() < NONCE_LEN + TAG_LEN {
            return Err(DecryptionError::Truncated { len: raw.len() });
        }

        let (nonce, ciphertext) = raw.split_at(NONCE_LEN);
        let plaintext = self
            .aead
            .decrypt(XNonce::from_slice(nonce), ciphertext)
            .map_err(|_| DecryptionError::Authentication)?;

        String::from_utf8(plaintext).map_err(|e| {
            let mut bytes = e.into_bytes();
            bytes.zeroize();
            DecryptionError::Utf8
        })
    }
}

impl fmt::Debug for Cipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cipher").field("key", &"[REDACTED]").finish()
    }
}
