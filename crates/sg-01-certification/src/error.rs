//! Certificate verification errors.

use shared_types::{NodeName, SimTime};
use thiserror::Error;

/// Why a certificate was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CertificateError {
    /// `now` is before `not_before`.
    #[error("certificate not valid before {not_before}, now {now}")]
    NotYetValid {
        /// Start of the validity window.
        not_before: SimTime,
        /// Time of the check.
        now: SimTime,
    },

    /// `now` is after `not_after`.
    #[error("certificate expired at {not_after}, now {now}")]
    Expired {
        /// End of the validity window.
        not_after: SimTime,
        /// Time of the check.
        now: SimTime,
    },

    /// No authority with this name is known.
    #[error("unknown certificate authority: {0}")]
    UnknownAuthority(NodeName),

    /// The issuing authority revoked the certificate.
    #[error("certificate revoked")]
    Revoked,

    /// The authority's signature does not cover this body.
    #[error("certificate signature invalid")]
    BadSignature,

    /// The certificate could not be encoded for signing.
    #[error("certificate encoding failed: {0}")]
    Encoding(String),
}

/// Result alias for certificate operations.
pub type Result<T> = std::result::Result<T, CertificateError>;
