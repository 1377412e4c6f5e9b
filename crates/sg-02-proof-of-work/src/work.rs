//! Work requests, proofs and the nuance search.

use primitive_types::U256;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sg_telemetry::{log_event, subsystems};
use shared_crypto::{sha256_many, to_canonical_bytes};

use crate::error::{PowError, Result};

/// Largest complexity with a non-zero target. A zero target admits only the
/// all-zero digest, so the search would never end.
pub const MAX_COMPLEXITY: u32 = 255;

/// Nuances checked per parallel batch. `find_first` keeps the result
/// identical to a sequential scan.
const SEARCH_BATCH: u64 = 16_384;

/// Hash scheme used by a work request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PowScheme {
    /// Single SHA-256.
    #[default]
    Sha256,
}

impl PowScheme {
    fn digest(self, payload: &[u8], nuance: u64) -> U256 {
        match self {
            PowScheme::Sha256 => {
                U256::from_big_endian(&sha256_many(&[payload, &nuance.to_be_bytes()]))
            }
        }
    }
}

/// Target (ceiling) for a complexity level in bits.
pub fn target_from_complexity(scheme: PowScheme, complexity_bits: u32) -> Result<U256> {
    match scheme {
        PowScheme::Sha256 => match complexity_bits {
            bits if bits <= MAX_COMPLEXITY => Ok(U256::MAX >> bits as usize),
            bits => Err(PowError::ComplexityOutOfRange(bits)),
        },
    }
}

/// A challenge: find a nuance under `target` with `scheme`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkRequest {
    /// Hash scheme.
    pub scheme: PowScheme,
    /// Ceiling the digest must not exceed.
    pub target: U256,
}

impl WorkRequest {
    /// Work request for a complexity level.
    pub fn with_complexity(scheme: PowScheme, complexity_bits: u32) -> Result<Self> {
        Ok(Self {
            scheme,
            target: target_from_complexity(scheme, complexity_bits)?,
        })
    }

    /// Brute-force the smallest nuance that satisfies this request for `payload`.
    pub fn compute_proof<T: Serialize + ?Sized>(&self, payload: &T) -> Result<ProofOfWork> {
        let bytes = to_canonical_bytes(payload).map_err(|e| PowError::Encoding(e.to_string()))?;
        let nuance = self.search(&bytes)?;

        log_event!(
            trace,
            subsystems::PROOF_OF_WORK,
            "proof found",
            nuance = nuance,
            payload_len = bytes.len()
        );

        Ok(ProofOfWork {
            scheme: self.scheme,
            target: self.target,
            nuance,
        })
    }

    fn search(&self, payload: &[u8]) -> Result<u64> {
        let mut start = 0u64;
        loop {
            let end = start.saturating_add(SEARCH_BATCH);
            let found = (start..end)
                .into_par_iter()
                .find_first(|nuance| self.scheme.digest(payload, *nuance) <= self.target);

            if let Some(nuance) = found {
                return Ok(nuance);
            }
            if end == u64::MAX {
                return Err(PowError::Exhausted);
            }
            start = end;
        }
    }
}

/// A solved work request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofOfWork {
    /// Scheme the proof was computed with.
    pub scheme: PowScheme,
    /// Target the proof was computed against.
    pub target: U256,
    /// The nuance found.
    pub nuance: u64,
}

impl ProofOfWork {
    /// Single re-hash check against the proof's own scheme and target.
    pub fn validate<T: Serialize + ?Sized>(&self, payload: &T) -> bool {
        match to_canonical_bytes(payload) {
            Ok(bytes) => self.scheme.digest(&bytes, self.nuance) <= self.target,
            Err(_) => false,
        }
    }

    /// Whether this proof answers exactly `request`.
    pub fn answers(&self, request: &WorkRequest) -> bool {
        self.scheme == request.scheme && self.target == request.target
    }
}
