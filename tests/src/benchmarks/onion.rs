//! Onion growth along a broadcast path and peeling along the reply path.

use criterion::{black_box, BenchmarkId, Criterion};
use shared_crypto::KeyPair;
use sg_04_onion_routing::{OnionLayer, OnionRoute};

fn path(hops: usize) -> Vec<KeyPair> {
    (0..hops).map(|_| KeyPair::generate()).collect()
}

fn grown(keys: &[KeyPair]) -> OnionRoute {
    keys.iter()
        .enumerate()
        .fold(OnionRoute::new(), |route, (i, key)| {
            route
                .grow(OnionLayer::new(format!("hop_{i}")), &key.public_key())
                .unwrap_or_else(|e| panic!("grow hop {i}: {e}"))
        })
}

/// Growing a route hop by hop.
pub fn bench_grow(c: &mut Criterion) {
    let mut group = c.benchmark_group("onion-grow");
    for hops in [1usize, 4, 8] {
        let keys = path(hops);
        group.bench_with_input(BenchmarkId::from_parameter(hops), &keys, |b, keys| {
            b.iter(|| black_box(grown(keys).encoded_len()))
        });
    }
    group.finish();
}

/// Peeling every layer of a grown route.
pub fn bench_peel(c: &mut Criterion) {
    let mut group = c.benchmark_group("onion-peel");
    for hops in [1usize, 4, 8] {
        let keys = path(hops);
        let route = grown(&keys);
        group.bench_with_input(BenchmarkId::from_parameter(hops), &route, |b, route| {
            b.iter(|| {
                let mut route = route.clone();
                for key in keys.iter().rev() {
                    black_box(route.peel(key).is_ok());
                }
                route.is_empty()
            })
        });
    }
    group.finish();
}

/// Register all onion benchmarks.
pub fn register_benchmarks(c: &mut Criterion) {
    bench_grow(c);
    bench_peel(c);
}
