//! The certificate value type.

use serde::{Deserialize, Serialize};
use shared_crypto::{sha256, to_canonical_bytes, Hash, PublicKey, Signable, Signature};
use shared_types::{NodeName, SimTime};

use crate::error::{CertificateError, Result};
use crate::registry::AuthorityDirectory;

/// Signed part of a certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateBody {
    /// Name of the issuing authority.
    pub issuer: NodeName,
    /// Key the claim is about.
    pub subject_public_key: PublicKey,
    /// Claim name, e.g. `"is_ok"` or `"geohash"`.
    pub claim_name: String,
    /// Claim value.
    pub claim_value: Vec<u8>,
    /// First instant the certificate is valid.
    pub not_before: SimTime,
    /// Last instant the certificate is valid.
    pub not_after: SimTime,
}

/// Content-derived certificate identifier, used for revocation.
pub type CertificateId = Hash;

/// Authority-issued attestation. Immutable once issued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    body: CertificateBody,
    signature: Signature,
}

impl Certificate {
    pub(crate) fn new(body: CertificateBody, signature: Signature) -> Self {
        Self { body, signature }
    }

    /// Issuing authority.
    pub fn issuer(&self) -> &NodeName {
        &self.body.issuer
    }

    /// Subject's public key.
    pub fn public_key(&self) -> &PublicKey {
        &self.body.subject_public_key
    }

    /// Claim name.
    pub fn claim_name(&self) -> &str {
        &self.body.claim_name
    }

    /// Claim value.
    pub fn claim_value(&self) -> &[u8] {
        &self.body.claim_value
    }

    /// Validity window start.
    pub fn not_before(&self) -> SimTime {
        self.body.not_before
    }

    /// Validity window end.
    pub fn not_after(&self) -> SimTime {
        self.body.not_after
    }

    /// Hash of the signed body.
    pub fn id(&self) -> Result<CertificateId> {
        let bytes =
            to_canonical_bytes(&self.body).map_err(|e| CertificateError::Encoding(e.to_string()))?;
        Ok(sha256(&bytes))
    }

    /// Full check: window, issuer, revocation, signature.
    pub fn verify(&self, directory: &dyn AuthorityDirectory, now: SimTime) -> Result<()> {
        if now < self.body.not_before {
            return Err(CertificateError::NotYetValid {
                not_before: self.body.not_before,
                now,
            });
        }
        if now > self.body.not_after {
            return Err(CertificateError::Expired {
                not_after: self.body.not_after,
                now,
            });
        }

        let authority_key = directory
            .public_key_of(&self.body.issuer)
            .ok_or_else(|| CertificateError::UnknownAuthority(self.body.issuer.clone()))?;

        if directory.is_revoked(self) {
            return Err(CertificateError::Revoked);
        }

        self.verify_signature(&authority_key)
            .map_err(|_| CertificateError::BadSignature)
    }

    /// Boolean form of [`Certificate::verify`].
    pub fn is_valid(&self, directory: &dyn AuthorityDirectory, now: SimTime) -> bool {
        self.verify(directory, now).is_ok()
    }

    /// Test hook: the same certificate with a mutated body and the old signature.
    #[doc(hidden)]
    pub fn with_body_unchecked(&self, body: CertificateBody) -> Self {
        Self {
            body,
            signature: self.signature,
        }
    }
}

impl Signable for Certificate {
    type Body = CertificateBody;

    fn body(&self) -> &CertificateBody {
        &self.body
    }

    fn signature(&self) -> &Signature {
        &self.signature
    }
}
