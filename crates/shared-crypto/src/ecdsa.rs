//! # ECDSA Signatures (secp256k1)
//!
//! Identity keys for every protocol participant: gossip nodes, the
//! certification authority and the settler all sign with secp256k1.
//!
//! ## Security Properties
//!
//! - RFC 6979 deterministic nonces (no RNG dependency for signing)
//! - Messages are hashed with SHA-256 before signing
//! - Public keys travel in compressed SEC1 form (33 bytes)

use std::fmt;

use crate::CryptoError;
use k256::ecdsa::{
    signature::{Signer, Verifier},
    Signature as K256Signature, SigningKey, VerifyingKey,
};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};

/// Compressed secp256k1 public key (33 bytes).
#[serde_as]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PublicKey(#[serde_as(as = "Bytes")] [u8; 33]);

impl PublicKey {
    /// Create from compressed bytes (33 bytes, starting with 0x02 or 0x03).
    pub fn from_bytes(bytes: [u8; 33]) -> Result<Self, CryptoError> {
        VerifyingKey::from_sec1_bytes(&bytes).map_err(|_| CryptoError::InvalidPublicKey)?;
        Ok(Self(bytes))
    }

    /// Get raw compressed bytes.
    pub fn as_bytes(&self) -> &[u8; 33] {
        &self.0
    }

    /// Verify a signature over `message`.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> Result<(), CryptoError> {
        let verifying_key =
            VerifyingKey::from_sec1_bytes(&self.0).map_err(|_| CryptoError::InvalidPublicKey)?;

        let sig =
            K256Signature::from_slice(&signature.0).map_err(|_| CryptoError::InvalidSignature)?;

        verifying_key
            .verify(message, &sig)
            .map_err(|_| CryptoError::SignatureVerificationFailed)
    }

    /// Short hex form used in logs.
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[1..7])
    }

    pub(crate) fn to_k256(self) -> Result<k256::PublicKey, CryptoError> {
        k256::PublicKey::from_sec1_bytes(&self.0).map_err(|_| CryptoError::InvalidPublicKey)
    }

    pub(crate) fn from_k256(key: &k256::PublicKey) -> Self {
        let verifying_key = VerifyingKey::from(key);
        Self::from_verifying_key(&verifying_key)
    }

    fn from_verifying_key(verifying_key: &VerifyingKey) -> Self {
        let sec1_bytes = verifying_key.to_sec1_bytes();
        let mut bytes = [0u8; 33];
        bytes.copy_from_slice(&sec1_bytes[..33]);
        Self(bytes)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.short_hex())
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.short_hex())
    }
}

/// ECDSA signature (64 bytes, r||s format).
#[serde_as]
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature(#[serde_as(as = "Bytes")] [u8; 64]);

impl Signature {
    /// Create from bytes (64 bytes).
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({}..)", hex::encode(&self.0[..6]))
    }
}

/// secp256k1 keypair.
#[derive(Clone)]
pub struct KeyPair {
    signing_key: SigningKey,
}

impl KeyPair {
    /// Generate random keypair.
    pub fn generate() -> Self {
        let signing_key = SigningKey::random(&mut rand::thread_rng());
        Self { signing_key }
    }

    /// Create from secret key bytes (32 bytes).
    pub fn from_bytes(bytes: [u8; 32]) -> Result<Self, CryptoError> {
        let signing_key =
            SigningKey::from_bytes((&bytes).into()).map_err(|_| CryptoError::InvalidPrivateKey)?;
        Ok(Self { signing_key })
    }

    /// Get public key (compressed, 33 bytes).
    pub fn public_key(&self) -> PublicKey {
        PublicKey::from_verifying_key(self.signing_key.verifying_key())
    }

    /// Sign a message (deterministic RFC 6979).
    pub fn sign(&self, message: &[u8]) -> Signature {
        let sig: K256Signature = self.signing_key.sign(message);
        let mut bytes = [0u8; 64];
        bytes.copy_from_slice(&sig.to_bytes());
        Signature(bytes)
    }

    pub(crate) fn secret_key(&self) -> k256::SecretKey {
        k256::SecretKey::from(self.signing_key.as_nonzero_scalar())
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key())
            .finish_non_exhaustive()
    }
}

/// Generate a fresh identity keypair.
pub fn generate_keypair() -> KeyPair {
    KeyPair::generate()
}
