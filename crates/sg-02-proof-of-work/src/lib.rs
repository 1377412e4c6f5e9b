//! # Proof of Work
//!
//! Admission gate for broadcasts: a peer asking to be heard must find a
//! nuance such that
//!
//! ```text
//! SHA-256( canonical_bytes(payload) ++ nuance_be64 )  <=  target
//! ```
//!
//! **The target is a CEILING**: a higher target is easier, a lower target
//! is harder. `target_from_complexity(bits)` is `U256::MAX >> bits`, so each
//! extra bit of complexity halves the fraction of acceptable hashes.
//!
//! The search is unbounded. Freshness is the caller's concern: challenges
//! carry their own `valid_till`.

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod error;
pub mod work;

pub use error::{PowError, Result};
pub use work::{target_from_complexity, PowScheme, ProofOfWork, WorkRequest, MAX_COMPLEXITY};
