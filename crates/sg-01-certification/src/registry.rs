//! Authority lookup.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use shared_crypto::PublicKey;
use shared_types::NodeName;

use crate::authority::CertificationAuthority;
use crate::certificate::Certificate;

/// Identity backend seen by verifiers.
pub trait AuthorityDirectory: Send + Sync {
    /// Verification key of the named authority, if known.
    fn public_key_of(&self, issuer: &NodeName) -> Option<PublicKey>;

    /// Whether the issuing authority revoked `certificate`.
    fn is_revoked(&self, certificate: &Certificate) -> bool;
}

/// In-process directory of known authorities.
#[derive(Debug, Default)]
pub struct AuthorityRegistry {
    authorities: RwLock<BTreeMap<NodeName, Arc<CertificationAuthority>>>,
}

impl AuthorityRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make an authority known. Replaces any authority with the same name.
    pub fn register(&self, authority: Arc<CertificationAuthority>) {
        self.authorities
            .write()
            .insert(authority.name().clone(), authority);
    }

    /// Look an authority up by name.
    pub fn get(&self, name: &NodeName) -> Option<Arc<CertificationAuthority>> {
        self.authorities.read().get(name).cloned()
    }

    /// Number of registered authorities.
    pub fn len(&self) -> usize {
        self.authorities.read().len()
    }

    /// Whether no authority is registered.
    pub fn is_empty(&self) -> bool {
        self.authorities.read().is_empty()
    }
}

impl AuthorityDirectory for AuthorityRegistry {
    fn public_key_of(&self, issuer: &NodeName) -> Option<PublicKey> {
        self.get(issuer).map(|authority| authority.public_key())
    }

    fn is_revoked(&self, certificate: &Certificate) -> bool {
        self.get(certificate.issuer())
            .map(|authority| authority.is_revoked(certificate))
            .unwrap_or(false)
    }
}
