//! Detached signatures over canonical object encodings.
//!
//! A signable object names the part of itself that is covered by the
//! signature. The signature field is never part of that image.

use serde::Serialize;

use crate::{codec, CryptoError, KeyPair, PublicKey, Signature};

/// Sign the canonical encoding of `value`.
pub fn sign_object<T: Serialize + ?Sized>(
    value: &T,
    keypair: &KeyPair,
) -> Result<Signature, CryptoError> {
    Ok(keypair.sign(&codec::to_canonical_bytes(value)?))
}

/// Verify a detached signature over the canonical encoding of `value`.
pub fn verify_object<T: Serialize + ?Sized>(
    value: &T,
    signature: &Signature,
    public_key: &PublicKey,
) -> Result<(), CryptoError> {
    public_key.verify(&codec::to_canonical_bytes(value)?, signature)
}

/// An object carrying its own signature.
pub trait Signable {
    /// The signed image: everything except the signature.
    type Body: Serialize;

    /// Borrow the signed image.
    fn body(&self) -> &Self::Body;

    /// The attached signature.
    fn signature(&self) -> &Signature;

    /// Check the attached signature against `public_key`.
    fn verify_signature(&self, public_key: &PublicKey) -> Result<(), CryptoError> {
        verify_object(self.body(), self.signature(), public_key)
    }
}
