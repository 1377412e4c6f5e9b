//! Proof-of-work search and validation.
//!
//! Search cost doubles per complexity bit; validation is a single hash
//! whatever the complexity.

use criterion::{black_box, BenchmarkId, Criterion};
use sg_02_proof_of_work::{PowScheme, WorkRequest};

/// Proof search at increasing complexity.
pub fn bench_compute_proof(c: &mut Criterion) {
    let mut group = c.benchmark_group("pow-compute");
    group.sample_size(20);
    for bits in [4u32, 8, 12, 16] {
        let request = WorkRequest::with_complexity(PowScheme::Sha256, bits)
            .unwrap_or_else(|e| panic!("complexity {bits}: {e}"));
        group.bench_with_input(BenchmarkId::from_parameter(bits), &request, |b, request| {
            let mut payload = 0u64;
            b.iter(|| {
                payload = payload.wrapping_add(1);
                black_box(request.compute_proof(&payload).is_ok())
            })
        });
    }
    group.finish();
}

/// Validation of an existing proof.
pub fn bench_validate_proof(c: &mut Criterion) {
    let request = WorkRequest::with_complexity(PowScheme::Sha256, 12)
        .unwrap_or_else(|e| panic!("complexity 12: {e}"));
    let payload = b"ride to the airport".to_vec();
    let proof = request
        .compute_proof(&payload)
        .unwrap_or_else(|e| panic!("proof: {e}"));

    c.bench_function("pow-validate", |b| {
        b.iter(|| black_box(proof.validate(black_box(&payload))))
    });
}

/// Register all proof-of-work benchmarks.
pub fn register_benchmarks(c: &mut Criterion) {
    bench_compute_proof(c);
    bench_validate_proof(c);
}
