//! # Hashing
//!
//! SHA-256 is the commitment hash: payment hashes, content hashes in
//! settlement promises, and proof-of-work digests all use it. BLAKE3 is
//! used only as a key-derivation function for hybrid encryption.

use sha2::{Digest, Sha256};

/// 256-bit digest.
pub type Hash = [u8; 32];

/// Hash data with SHA-256 (one-shot).
pub fn sha256(data: &[u8]) -> Hash {
    Sha256::digest(data).into()
}

/// Hash the concatenation of several inputs.
pub fn sha256_many(inputs: &[&[u8]]) -> Hash {
    let mut hasher = Sha256::new();
    for input in inputs {
        hasher.update(input);
    }
    hasher.finalize().into()
}

/// Derive key from context and input key material.
pub fn blake3_derive_key(context: &str, key_material: &[u8]) -> [u8; 32] {
    blake3::derive_key(context, key_material)
}
