//! Certificate issuance and revocation.

use std::collections::HashSet;

use parking_lot::RwLock;
use sg_telemetry::{log_event, subsystems};
use shared_crypto::{sign_object, KeyPair, PublicKey};
use shared_types::{NodeName, SimTime};

use crate::certificate::{Certificate, CertificateBody, CertificateId};
use crate::error::{CertificateError, Result};

/// A named signing authority.
#[derive(Debug)]
pub struct CertificationAuthority {
    name: NodeName,
    keypair: KeyPair,
    revoked: RwLock<HashSet<CertificateId>>,
}

impl CertificationAuthority {
    /// Authority with a fresh keypair.
    pub fn new(name: impl Into<NodeName>) -> Self {
        Self::with_keypair(name, KeyPair::generate())
    }

    /// Authority with a given keypair.
    pub fn with_keypair(name: impl Into<NodeName>, keypair: KeyPair) -> Self {
        Self {
            name: name.into(),
            keypair,
            revoked: RwLock::new(HashSet::new()),
        }
    }

    /// Authority name; certificates reference it as their issuer.
    pub fn name(&self) -> &NodeName {
        &self.name
    }

    /// Authority verification key.
    pub fn public_key(&self) -> PublicKey {
        self.keypair.public_key()
    }

    /// Issue a certificate over `(issuer, subject, claim, value, window)`.
    pub fn issue(
        &self,
        subject_public_key: PublicKey,
        claim_name: impl Into<String>,
        claim_value: impl Into<Vec<u8>>,
        not_before: SimTime,
        not_after: SimTime,
    ) -> Result<Certificate> {
        let body = CertificateBody {
            issuer: self.name.clone(),
            subject_public_key,
            claim_name: claim_name.into(),
            claim_value: claim_value.into(),
            not_before,
            not_after,
        };
        let signature = sign_object(&body, &self.keypair)
            .map_err(|e| CertificateError::Encoding(e.to_string()))?;

        log_event!(
            debug,
            subsystems::CERTIFICATION,
            "certificate issued",
            authority = %self.name,
            subject = %subject_public_key,
            claim = %body.claim_name
        );
        Ok(Certificate::new(body, signature))
    }

    /// Put a certificate on the revocation list.
    pub fn revoke(&self, certificate: &Certificate) -> Result<()> {
        let id = certificate.id()?;
        self.revoked.write().insert(id);
        log_event!(
            info,
            subsystems::CERTIFICATION,
            "certificate revoked",
            authority = %self.name,
            subject = %certificate.public_key()
        );
        Ok(())
    }

    /// Whether this authority revoked `certificate`.
    pub fn is_revoked(&self, certificate: &Certificate) -> bool {
        match certificate.id() {
            Ok(id) => self.revoked.read().contains(&id),
            Err(_) => true,
        }
    }
}
