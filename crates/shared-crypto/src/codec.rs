//! Canonical object encoding.
//!
//! Signatures, commitments and proof-of-work all hash the same byte image
//! of an object, so every one of them goes through these two functions.
//! bincode with its default fixed-int little-endian layout is stable for a
//! given type definition.

use serde::{de::DeserializeOwned, Serialize};

use crate::CryptoError;

/// Encode `value` into its canonical byte representation.
pub fn to_canonical_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, CryptoError> {
    Ok(bincode::serialize(value)?)
}

/// Decode a value previously produced by [`to_canonical_bytes`].
pub fn from_canonical_bytes<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CryptoError> {
    Ok(bincode::deserialize(bytes)?)
}
