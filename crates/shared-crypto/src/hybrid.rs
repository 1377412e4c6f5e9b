//! # Hybrid Encryption
//!
//! Public-key encryption of arbitrary objects:
//!
//! ```text
//!   content key K (one-time, random) ──XChaCha20──► body
//!   ECDH(ephemeral, recipient) ─BLAKE3 KDF─► wrap key ──XChaCha20(K)──► wrapped key
//!   blob = bincode(HybridEnvelope { ephemeral pub, wrapped key, body })
//! ```
//!
//! Only the holder of the recipient's private key can recompute the wrap
//! key. Any other key fails the AEAD check on the wrapped key.

use crate::{
    codec, ecdsa::PublicKey, hashing::blake3_derive_key, symmetric, CryptoError, KeyPair,
    SecretKey,
};
use k256::ecdh::diffie_hellman;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

const KDF_CONTEXT: &str = "sweet-gossip 2024 hybrid key wrap v1";

#[derive(Serialize, Deserialize)]
struct HybridEnvelope {
    ephemeral: PublicKey,
    wrapped_key: symmetric::SealedBox,
    body: symmetric::SealedBox,
}

fn wrap_key(ephemeral: &PublicKey, shared_secret: &[u8]) -> SecretKey {
    let mut material = Vec::with_capacity(33 + shared_secret.len());
    material.extend_from_slice(ephemeral.as_bytes());
    material.extend_from_slice(shared_secret);
    SecretKey::from_bytes(blake3_derive_key(KDF_CONTEXT, &material))
}

/// Encrypt raw bytes for `recipient`.
pub fn hybrid_encrypt(plaintext: &[u8], recipient: &PublicKey) -> Result<Vec<u8>, CryptoError> {
    let recipient_key = recipient.to_k256()?;

    let ephemeral_secret = k256::SecretKey::random(&mut rand::thread_rng());
    let ephemeral = PublicKey::from_k256(&ephemeral_secret.public_key());
    let shared = diffie_hellman(
        ephemeral_secret.to_nonzero_scalar(),
        recipient_key.as_affine(),
    );
    let kek = wrap_key(&ephemeral, shared.raw_secret_bytes());

    let content_key = SecretKey::generate();
    let (body, body_nonce) = symmetric::encrypt(&content_key, plaintext)?;
    let (wrapped, wrapped_nonce) = symmetric::encrypt(&kek, content_key.as_bytes())?;

    codec::to_canonical_bytes(&HybridEnvelope {
        ephemeral,
        wrapped_key: symmetric::SealedBox {
            nonce: wrapped_nonce,
            ciphertext: wrapped,
        },
        body: symmetric::SealedBox {
            nonce: body_nonce,
            ciphertext: body,
        },
    })
}

/// Decrypt a blob produced by [`hybrid_encrypt`].
///
/// # Errors
///
/// `CryptoError::DecryptionFailed` for a wrong key or a malformed blob.
pub fn hybrid_decrypt(blob: &[u8], keypair: &KeyPair) -> Result<Vec<u8>, CryptoError> {
    let envelope: HybridEnvelope = codec::from_canonical_bytes(blob)
        .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))?;

    let ephemeral = envelope
        .ephemeral
        .to_k256()
        .map_err(|_| CryptoError::DecryptionFailed("bad ephemeral key".into()))?;
    let secret = keypair.secret_key();
    let shared = diffie_hellman(secret.to_nonzero_scalar(), ephemeral.as_affine());
    let kek = wrap_key(&envelope.ephemeral, shared.raw_secret_bytes());

    let key_bytes = symmetric::decrypt(
        &kek,
        &envelope.wrapped_key.ciphertext,
        &envelope.wrapped_key.nonce,
    )?;
    let key_bytes: [u8; 32] =
        key_bytes
            .as_slice()
            .try_into()
            .map_err(|_| CryptoError::InvalidKeyLength {
                expected: 32,
                actual: key_bytes.len(),
            })?;
    let content_key = SecretKey::from_bytes(key_bytes);

    symmetric::decrypt(&content_key, &envelope.body.ciphertext, &envelope.body.nonce)
}

/// Encrypt any serializable object for `recipient`.
pub fn encrypt_for<T: Serialize>(value: &T, recipient: &PublicKey) -> Result<Vec<u8>, CryptoError> {
    hybrid_encrypt(&codec::to_canonical_bytes(value)?, recipient)
}

/// Decrypt an object produced by [`encrypt_for`].
pub fn decrypt_with<T: DeserializeOwned>(blob: &[u8], keypair: &KeyPair) -> Result<T, CryptoError> {
    codec::from_canonical_bytes(&hybrid_decrypt(blob, keypair)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_matching_key() {
        let recipient = KeyPair::generate();
        let blob = hybrid_encrypt(b"only for you", &recipient.public_key()).unwrap();
        assert_eq!(hybrid_decrypt(&blob, &recipient).unwrap(), b"only for you");
    }

    #[test]
    fn test_other_key_fails() {
        let recipient = KeyPair::generate();
        let intruder = KeyPair::generate();
        let blob = hybrid_encrypt(b"only for you", &recipient.public_key()).unwrap();
        assert!(matches!(
            hybrid_decrypt(&blob, &intruder),
            Err(CryptoError::DecryptionFailed(_))
        ));
    }

    #[test]
    fn test_object_roundtrip() {
        let recipient = KeyPair::generate();
        let value = ("layer".to_string(), vec![9u8; 40]);
        let blob = encrypt_for(&value, &recipient.public_key()).unwrap();
        let decoded: (String, Vec<u8>) = decrypt_with(&blob, &recipient).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn test_truncated_blob_fails() {
        let recipient = KeyPair::generate();
        let blob = hybrid_encrypt(b"payload", &recipient.public_key()).unwrap();
        assert!(hybrid_decrypt(&blob[..blob.len() / 2], &recipient).is_err());
    }

    #[test]
    fn test_encryption_is_randomized() {
        let recipient = KeyPair::generate();
        let a = hybrid_encrypt(b"same", &recipient.public_key()).unwrap();
        let b = hybrid_encrypt(b"same", &recipient.public_key()).unwrap();
        assert_ne!(a, b);
    }
}
