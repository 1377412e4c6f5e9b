//! Payment and settlement errors.

use shared_types::InvoiceId;
use thiserror::Error;

/// Payment backend and settler failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentError {
    /// An invoice with this id already exists.
    #[error("duplicate invoice id {0}")]
    DuplicateInvoice(InvoiceId),

    /// No invoice with this id.
    #[error("unknown invoice {0}")]
    UnknownInvoice(InvoiceId),

    /// Settler certificate failed verification.
    #[error("settler certificate invalid: {0}")]
    InvalidCertificate(String),

    /// Promise signature does not verify against the settler key.
    #[error("settlement promise signature invalid")]
    BadPromiseSignature,

    /// The reply ciphertext is not the one the promise commits to.
    #[error("reply payload does not match promised hash")]
    ContentHashMismatch,

    /// Encryption, decryption or encoding failed.
    #[error("crypto failure: {0}")]
    Crypto(String),
}

impl From<shared_crypto::CryptoError> for PaymentError {
    fn from(err: shared_crypto::CryptoError) -> Self {
        PaymentError::Crypto(err.to_string())
    }
}

/// Result alias for settlement operations.
pub type Result<T> = std::result::Result<T, PaymentError>;
