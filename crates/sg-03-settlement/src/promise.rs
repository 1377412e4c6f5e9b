//! Settlement promises and the reply payload they lock.

use serde::{Deserialize, Serialize};
use sg_01_certification::{AuthorityDirectory, Certificate};
use shared_crypto::{sha256, sign_object, Hash, KeyPair, Signable, Signature};
use shared_types::SimTime;

use crate::error::{PaymentError, Result};
use crate::invoice::HodlInvoice;

/// What the settler commits to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementPromise {
    /// Settler identity.
    pub settler_certificate: Certificate,
    /// Hash of the network preimage that unlocks the reply content.
    pub network_payment_hash: Hash,
    /// SHA-256 of the encrypted reply payload this promise is about.
    pub hash_of_encrypted_reply_payload: Hash,
    /// Fee the replier asked for.
    pub reply_payment_amount: u64,
}

/// A settlement promise signed by the settler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedSettlementPromise {
    promise: SettlementPromise,
    signature: Signature,
}

impl SignedSettlementPromise {
    /// Sign `promise` with the settler's key.
    pub fn sign(promise: SettlementPromise, keypair: &KeyPair) -> Result<Self> {
        let signature = sign_object(&promise, keypair)?;
        Ok(Self { promise, signature })
    }

    /// The promise itself.
    pub fn promise(&self) -> &SettlementPromise {
        &self.promise
    }

    /// Payment hash the promise binds.
    pub fn network_payment_hash(&self) -> &Hash {
        &self.promise.network_payment_hash
    }

    /// Check settler certificate, promise signature, and that
    /// `encrypted_reply_payload` is the exact ciphertext promised.
    pub fn verify_all(
        &self,
        encrypted_reply_payload: &[u8],
        directory: &dyn AuthorityDirectory,
        now: SimTime,
    ) -> Result<()> {
        let certificate = &self.promise.settler_certificate;
        certificate
            .verify(directory, now)
            .map_err(|e| PaymentError::InvalidCertificate(e.to_string()))?;

        self.verify_signature(certificate.public_key())
            .map_err(|_| PaymentError::BadPromiseSignature)?;

        if sha256(encrypted_reply_payload) != self.promise.hash_of_encrypted_reply_payload {
            return Err(PaymentError::ContentHashMismatch);
        }
        Ok(())
    }

    /// Test hook: same signature over a different promise.
    #[doc(hidden)]
    pub fn with_promise_unchecked(&self, promise: SettlementPromise) -> Self {
        Self {
            promise,
            signature: self.signature,
        }
    }
}

impl Signable for SignedSettlementPromise {
    type Body = SettlementPromise;

    fn body(&self) -> &SettlementPromise {
        &self.promise
    }

    fn signature(&self) -> &Signature {
        &self.signature
    }
}

/// What the requester finds after decrypting a reply.
///
/// `R` is the signed request the reply answers; the settlement layer treats
/// it as opaque.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyPayload<R> {
    /// Replier identity.
    pub replier_certificate: Certificate,
    /// The request being answered.
    pub signed_request_payload: R,
    /// Reply message, encrypted under the network preimage.
    pub encrypted_reply_message: Vec<u8>,
    /// Invoice paying the replier's fee.
    pub reply_invoice: HodlInvoice,
}
