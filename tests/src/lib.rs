//! # Sweet Gossip Test Suite
//!
//! Cross-crate tests that need a whole network, plus criterion benchmarks.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── benchmarks/        # criterion groups, registered from benches/
//! │   ├── crypto.rs      # hybrid encryption
//! │   ├── onion.rs       # onion growth and peeling
//! │   └── pow.rs         # proof search and validation
//! │
//! └── integration/       # multi-node scenarios on the engine
//!     ├── network.rs     # shared builder
//!     ├── e2e.rs
//!     ├── flood_bound.rs
//!     ├── atomic_settlement.rs
//!     ├── certificate_expiry.rs
//!     └── pow_admission.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p sg-tests
//! cargo test -p sg-tests integration::flood_bound
//! cargo bench -p sg-tests
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod benchmarks;
pub mod integration;
