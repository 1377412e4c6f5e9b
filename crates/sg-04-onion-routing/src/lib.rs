//! # Onion Routing
//!
//! A reply route built while a request floods outward and consumed while
//! the reply travels back. Each hop wraps `(layer, previous onion)` for the
//! public key of the peer it forwards to, so a hop can only learn the one
//! name inside its own layer.
//!
//! ```text
//! grow(A, pk_B) ──► [B: A | ∅]
//! grow(B, pk_C) ──► [C: B | [B: A | ∅]]
//!
//! C peels ──► B, remainder [B: A | ∅]
//! B peels ──► A, remainder ∅ (empty)
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]

use serde::{Deserialize, Serialize};
use shared_crypto::{decrypt_with, encrypt_for, CryptoError, KeyPair, PublicKey};
use shared_types::NodeName;
use thiserror::Error;

/// Onion failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OnionError {
    /// Nothing left to peel.
    #[error("onion route is empty")]
    Empty,

    /// The outermost layer is not addressed to this key, or is corrupt.
    #[error("cannot peel layer: {0}")]
    NotForThisKey(CryptoError),

    /// Layer could not be encrypted.
    #[error("cannot grow route: {0}")]
    Encryption(CryptoError),
}

/// One hop's entry: the peer to hand the reply to next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnionLayer {
    /// Next peer on the way back.
    pub peer_name: NodeName,
}

impl OnionLayer {
    /// Layer naming `peer_name`.
    pub fn new(peer_name: impl Into<NodeName>) -> Self {
        Self {
            peer_name: peer_name.into(),
        }
    }
}

/// Opaque accumulated route.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnionRoute {
    onion: Vec<u8>,
}

impl OnionRoute {
    /// Route with zero layers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether no layers remain.
    pub fn is_empty(&self) -> bool {
        self.onion.is_empty()
    }

    /// Size of the encoded route in bytes.
    pub fn encoded_len(&self) -> usize {
        self.onion.len()
    }

    /// New route with `layer` wrapped around this one for `public_key`.
    /// `self` is left unchanged.
    pub fn grow(&self, layer: OnionLayer, public_key: &PublicKey) -> Result<OnionRoute, OnionError> {
        let onion = encrypt_for(&(layer, &self.onion), public_key).map_err(OnionError::Encryption)?;
        Ok(OnionRoute { onion })
    }

    /// Remove the outermost layer. On success the route becomes the
    /// remainder; on failure it is left untouched.
    pub fn peel(&mut self, keypair: &KeyPair) -> Result<OnionLayer, OnionError> {
        let (layer, rest) = self.peeled(keypair)?;
        *self = rest;
        Ok(layer)
    }

    /// Non-destructive peel: the outermost layer and the remaining route.
    pub fn peeled(&self, keypair: &KeyPair) -> Result<(OnionLayer, OnionRoute), OnionError> {
        if self.is_empty() {
            return Err(OnionError::Empty);
        }
        let (layer, rest): (OnionLayer, Vec<u8>) =
            decrypt_with(&self.onion, keypair).map_err(OnionError::NotForThisKey)?;
        Ok((layer, OnionRoute { onion: rest }))
    }
}
