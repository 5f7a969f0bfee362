use std::collections::BTreeMap;

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use taproot::BstMap;

const N: usize = 10_000;

// Ordered insertion degenerates the unbalanced tree into a chain, which
// makes it quadratic; keep that batch small.
const N_ORDERED: usize = 1_000;

fn random_keys(n: usize) -> Vec<u64> {
    // Simple LCG for a deterministic pseudo-random sequence.
    let mut keys = Vec::with_capacity(n);
    let mut state: u64 = 0x9e37_79b9_7f4a_7c15;
    for _ in 0..n {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        keys.push(state >> 11);
    }
    keys
}

fn bench_insert_random(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert_random");
    let keys = random_keys(N);

    group.bench_function(BenchmarkId::new("BstMap", N), |b| {
        b.iter(|| {
            let mut map = BstMap::new();
            for &key in &keys {
                map.insert(key, key);
            }
            map
        });
    });

    group.bench_function(BenchmarkId::new("BTreeMap", N), |b| {
        b.iter(|| {
            let mut map = BTreeMap::new();
            for &key in &keys {
                map.insert(key, key);
            }
            map
        });
    });

    group.finish();
}

fn bench_insert_ordered(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert_ordered");

    group.bench_function(BenchmarkId::new("BstMap", N_ORDERED), |b| {
        b.iter(|| {
            let mut map = BstMap::new();
            for key in 0..N_ORDERED as u64 {
                map.insert(key, key);
            }
            map
        });
    });

    group.bench_function(BenchmarkId::new("BTreeMap", N_ORDERED), |b| {
        b.iter(|| {
            let mut map = BTreeMap::new();
            for key in 0..N_ORDERED as u64 {
                map.insert(key, key);
            }
            map
        });
    });

    group.finish();
}

fn bench_find_random(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_random");
    let keys = random_keys(N);

    let mut unbalanced = BstMap::new();
    let mut btree = BTreeMap::new();
    for &key in &keys {
        unbalanced.insert(key, key);
        btree.insert(key, key);
    }

    let mut balanced = unbalanced.clone();
    balanced.balance();

    group.bench_function(BenchmarkId::new("BstMap/unbalanced", N), |b| {
        b.iter(|| {
            let mut hits = 0usize;
            for key in &keys {
                hits += usize::from(unbalanced.get(key).is_some());
            }
            hits
        });
    });

    group.bench_function(BenchmarkId::new("BstMap/balanced", N), |b| {
        b.iter(|| {
            let mut hits = 0usize;
            for key in &keys {
                hits += usize::from(balanced.get(key).is_some());
            }
            hits
        });
    });

    group.bench_function(BenchmarkId::new("BTreeMap", N), |b| {
        b.iter(|| {
            let mut hits = 0usize;
            for key in &keys {
                hits += usize::from(btree.get(key).is_some());
            }
            hits
        });
    });

    group.finish();
}

fn bench_balance(c: &mut Criterion) {
    let mut group = c.benchmark_group("balance");
    let keys = random_keys(N);

    let mut map = BstMap::new();
    for &key in &keys {
        map.insert(key, key);
    }

    group.bench_function(BenchmarkId::new("BstMap", N), |b| {
        b.iter_batched(
            || map.clone(),
            |mut map| {
                map.balance();
                map
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_insert_random,
    bench_insert_ordered,
    bench_find_random,
    bench_balance
);
criterion_main!(benches);
