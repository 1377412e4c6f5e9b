//! Protocol rejection taxonomy.
//!
//! None of these cross the protocol boundary: `on_message` turns every
//! `Err` into a log line and drops the frame.

use shared_types::{NodeName, RequestId};
use thiserror::Error;

/// Why a frame, broadcast or payment was dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Bad signature, invalid certificate, failed proof or hash mismatch.
    #[error("verification failed: {0}")]
    VerificationFailure(String),

    /// A challenge was answered or received after its deadline.
    #[error("challenge expired")]
    ExpiredChallenge,

    /// An invoice could not be paid in time.
    #[error("invoice expired or no longer payable")]
    ExpiredInvoice,

    /// An ask id, request id or peer this node has no record of.
    #[error("unknown correlation: {0}")]
    UnknownCorrelation(String),

    /// A frame kind this node does not speak.
    #[error("unrecognized frame type: {0}")]
    UnrecognizedFrameType(String),

    /// The request was already forwarded as often as allowed.
    #[error("flood bound exceeded for request {0}")]
    FloodBoundExceeded(RequestId),

    /// The node's role filters this topic out.
    #[error("topic rejected")]
    TopicRejected,

    /// A node cannot be its own peer.
    #[error("cannot connect {0} to itself")]
    SelfConnection(NodeName),

    /// Payment backend or settler failure.
    #[error("settlement failure: {0}")]
    Settlement(String),
}

impl ProtocolError {
    /// Short label used as the `reason` field of drop logs.
    pub fn reason(&self) -> &'static str {
        match self {
            ProtocolError::VerificationFailure(_) => "verification_failure",
            ProtocolError::ExpiredChallenge => "expired_challenge",
            ProtocolError::ExpiredInvoice => "expired_invoice",
            ProtocolError::UnknownCorrelation(_) => "unknown_correlation",
            ProtocolError::UnrecognizedFrameType(_) => "unrecognized_frame_type",
            ProtocolError::FloodBoundExceeded(_) => "flood_bound_exceeded",
            ProtocolError::TopicRejected => "topic_rejected",
            ProtocolError::SelfConnection(_) => "self_connection",
            ProtocolError::Settlement(_) => "settlement",
        }
    }
}

impl From<sg_03_settlement::PaymentError> for ProtocolError {
    fn from(err: sg_03_settlement::PaymentError) -> Self {
        use sg_03_settlement::PaymentError;
        match err {
            PaymentError::InvalidCertificate(_)
            | PaymentError::BadPromiseSignature
            | PaymentError::ContentHashMismatch => ProtocolError::VerificationFailure(err.to_string()),
            other => ProtocolError::Settlement(other.to_string()),
        }
    }
}

impl From<sg_01_certification::CertificateError> for ProtocolError {
    fn from(err: sg_01_certification::CertificateError) -> Self {
        ProtocolError::VerificationFailure(err.to_string())
    }
}

impl From<sg_04_onion_routing::OnionError> for ProtocolError {
    fn from(err: sg_04_onion_routing::OnionError) -> Self {
        ProtocolError::VerificationFailure(err.to_string())
    }
}

impl From<shared_crypto::CryptoError> for ProtocolError {
    fn from(err: shared_crypto::CryptoError) -> Self {
        ProtocolError::VerificationFailure(err.to_string())
    }
}

impl From<sg_02_proof_of_work::PowError> for ProtocolError {
    fn from(err: sg_02_proof_of_work::PowError) -> Self {
        ProtocolError::VerificationFailure(err.to_string())
    }
}

/// Result alias for protocol handlers.
pub type Result<T> = std::result::Result<T, ProtocolError>;
