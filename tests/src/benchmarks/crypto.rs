//! Hybrid (ECDH + XChaCha20-Poly1305) encryption, the cost every reply and
//! onion layer pays.

use criterion::{black_box, BenchmarkId, Criterion, Throughput};
use rand::RngCore;
use shared_crypto::{hybrid_decrypt, hybrid_encrypt, KeyPair};

fn random_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}

/// Encrypt and decrypt payloads of growing size.
pub fn bench_hybrid_roundtrip(c: &mut Criterion) {
    let recipient = KeyPair::generate();
    let public_key = recipient.public_key();

    let mut group = c.benchmark_group("hybrid-encryption");
    for size in [64usize, 1024, 16 * 1024] {
        let plaintext = random_bytes(size);
        let sealed = hybrid_encrypt(&plaintext, &public_key)
            .unwrap_or_else(|e| panic!("encrypt {size}: {e}"));

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("encrypt", size), &plaintext, |b, plaintext| {
            b.iter(|| black_box(hybrid_encrypt(plaintext, &public_key).is_ok()))
        });
        group.bench_with_input(BenchmarkId::new("decrypt", size), &sealed, |b, sealed| {
            b.iter(|| black_box(hybrid_decrypt(sealed, &recipient).is_ok()))
        });
    }
    group.finish();
}

/// Register all crypto benchmarks.
pub fn register_benchmarks(c: &mut Criterion) {
    bench_hybrid_roundtrip(c);
}
