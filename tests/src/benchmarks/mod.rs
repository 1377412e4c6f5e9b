//! # Sweet Gossip Benchmarks
//!
//! One module per hot path of the protocol. Each exposes
//! `register_benchmarks`, called from `benches/protocol_benchmarks.rs`.

pub mod crypto;
pub mod onion;
pub mod pow;
