//! # Shared Crypto - Protocol Cryptographic Primitives
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `ecdsa` | secp256k1 | Identity keys, detached signatures |
//! | `hybrid` | ECDH + BLAKE3 KDF + XChaCha20-Poly1305 | Onion layers, reply payloads |
//! | `symmetric` | XChaCha20-Poly1305 | Preimage-locked reply content |
//! | `hashing` | SHA-256 | Payment hashes, commitments, proof-of-work |
//! | `signable` | canonical encoding + ECDSA | Signed protocol objects |
//!
//! ## Contract
//!
//! `hybrid_decrypt(hybrid_encrypt(x, pub), priv) == x` for the matching
//! keypair, and an error for any other key. Signing never covers the
//! signature field itself.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod codec;
pub mod ecdsa;
pub mod errors;
pub mod hashing;
pub mod hybrid;
pub mod signable;
pub mod symmetric;

// Re-exports
pub use codec::{from_canonical_bytes, to_canonical_bytes};
pub use ecdsa::{generate_keypair, KeyPair, PublicKey, Signature};
pub use errors::CryptoError;
pub use hashing::{sha256, sha256_many, Hash};
pub use hybrid::{decrypt_with, encrypt_for, hybrid_decrypt, hybrid_encrypt};
pub use signable::{sign_object, verify_object, Signable};
pub use symmetric::{symmetric_decrypt, symmetric_encrypt, Nonce, SecretKey};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
