//! # Certification
//!
//! Trust in the overlay is bootstrapped by certificate authorities. An
//! authority signs `(issuer, subject key, claim, value, not_before,
//! not_after)`; anyone holding the authority directory can check the
//! attestation.
//!
//! ```text
//! CertificationAuthority::issue ──► Certificate ──► verify(directory, now)
//!                                                      │
//!                        ┌─────────────────────────────┼──────────────────┐
//!                        ▼                             ▼                  ▼
//!              window contains now?          issuer known?       not revoked?
//!                                                      │
//!                                                      ▼
//!                                          signature over body verifies?
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod authority;
pub mod certificate;
pub mod error;
pub mod registry;

pub use authority::CertificationAuthority;
pub use certificate::{Certificate, CertificateBody, CertificateId};
pub use error::{CertificateError, Result};
pub use registry::{AuthorityDirectory, AuthorityRegistry};
