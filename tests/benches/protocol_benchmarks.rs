//! # Sweet Gossip Protocol Benchmarks
//!
//! | Group | Path measured |
//! |-------|---------------|
//! | `pow-compute`, `pow-validate` | admission handshake |
//! | `hybrid-encryption` | reply payloads and onion layers |
//! | `onion-grow`, `onion-peel` | broadcast and reply routing |

use criterion::{criterion_group, criterion_main, Criterion};
use sg_tests::benchmarks::{crypto, onion, pow};

fn protocol_benchmarks(c: &mut Criterion) {
    pow::register_benchmarks(c);
    crypto::register_benchmarks(c);
    onion::register_benchmarks(c);
}

criterion_group!(benches, protocol_benchmarks);
criterion_main!(benches);
