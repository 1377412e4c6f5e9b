//! # Symmetric Encryption
//!
//! XChaCha20-Poly1305 with one-time keys. Payment preimages double as
//! content keys, so a [`SecretKey`] is also what a settled invoice reveals.
//!
//! ## Security Properties
//!
//! - 192-bit random nonce per message, no nonce bookkeeping required
//! - Authenticated: a wrong key or a flipped bit fails decryption

use crate::{codec, CryptoError};
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    XChaCha20Poly1305, XNonce,
};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Secret key (256-bit).
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop, Serialize, Deserialize)]
pub struct SecretKey([u8; 32]);

impl SecretKey {
    /// Create from bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Generate random key.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut bytes);
        Self(bytes)
    }

    /// Get inner bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretKey(..)")
    }
}

/// Nonce for encryption.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nonce([u8; 24]); // XChaCha20 uses 24-byte nonce

impl Nonce {
    /// Create from bytes.
    pub fn from_bytes(bytes: [u8; 24]) -> Self {
        Self(bytes)
    }

    /// Generate random nonce (safe with XChaCha20's 192-bit nonce).
    pub fn generate() -> Self {
        let mut bytes = [0u8; 24];
        rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut bytes);
        Self(bytes)
    }

    /// Get inner bytes.
    pub fn as_bytes(&self) -> &[u8; 24] {
        &self.0
    }
}

/// Ciphertext together with the nonce it was produced under.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedBox {
    /// Encryption nonce.
    pub nonce: Nonce,
    /// Ciphertext with authentication tag.
    pub ciphertext: Vec<u8>,
}

/// Encrypt plaintext with XChaCha20-Poly1305.
///
/// Returns (ciphertext, nonce).
///
/// # Errors
///
/// Returns `CryptoError::EncryptionFailed` if encryption fails.
pub fn encrypt(key: &SecretKey, plaintext: &[u8]) -> Result<(Vec<u8>, Nonce), CryptoError> {
    let cipher = XChaCha20Poly1305::new(key.as_bytes().into());
    let nonce = Nonce::generate();

    let ciphertext = cipher
        .encrypt(XNonce::from_slice(nonce.as_bytes()), plaintext)
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

    Ok((ciphertext, nonce))
}

/// Decrypt ciphertext with XChaCha20-Poly1305.
///
/// # Errors
///
/// Returns `CryptoError::DecryptionFailed` if decryption fails.
pub fn decrypt(key: &SecretKey, ciphertext: &[u8], nonce: &Nonce) -> Result<Vec<u8>, CryptoError> {
    let cipher = XChaCha20Poly1305::new(key.as_bytes().into());

    cipher
        .decrypt(XNonce::from_slice(nonce.as_bytes()), ciphertext)
        .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))
}

/// Encrypt `plaintext` into a self-contained blob (nonce included).
pub fn symmetric_encrypt(key: &SecretKey, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let (ciphertext, nonce) = encrypt(key, plaintext)?;
    codec::to_canonical_bytes(&SealedBox { nonce, ciphertext })
}

/// Decrypt a blob produced by [`symmetric_encrypt`].
pub fn symmetric_decrypt(key: &SecretKey, blob: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let sealed: SealedBox = codec::from_canonical_bytes(blob)
        .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))?;
    decrypt(key, &sealed.ciphertext, &sealed.nonce)
}
