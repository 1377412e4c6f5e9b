//! Proof-of-work errors.

use thiserror::Error;

/// Proof-of-work failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PowError {
    /// Complexity that leaves no reachable target.
    #[error("complexity {0} out of range (max 255 bits)")]
    ComplexityOutOfRange(u32),

    /// Every nuance was tried without success.
    #[error("nuance space exhausted")]
    Exhausted,

    /// The object could not be encoded.
    #[error("payload encoding failed: {0}")]
    Encoding(String),
}

/// Result alias for proof-of-work operations.
pub type Result<T> = std::result::Result<T, PowError>;
