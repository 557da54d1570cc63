//! Multi-store proof benchmarks using Criterion
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use msproof::primitives::{compute_multistore_root, Codec, Hasher, SubstoreCommit};
use msproof::store::MemMultiStore;
use msproof::verifier::MultiStoreVerifier;

fn sample_commits(count: usize) -> Vec<SubstoreCommit> {
    let hasher = Hasher::sha256();
    (0..count)
        .map(|i| {
            let name = format!("store{:03}", i);
            let hash = (i % 5 != 0).then(|| hasher.digest(name.as_bytes()));
            SubstoreCommit::new(name, 963, hash)
        })
        .collect()
}

fn sample_store(keys: usize) -> MemMultiStore {
    let mut store = MemMultiStore::new(Hasher::sha256(), 963);
    for i in 0..keys {
        store.set("acc", format!("account/{:06}", i), format!("{}", i * 10));
    }
    store.set("gov", "proposal/1", "passed");
    store.set("stake", "validator/1", "bonded");
    store.mount("ibc");
    store
}

fn bench_multistore_root(c: &mut Criterion) {
    let mut group = c.benchmark_group("multistore_root");
    let hasher = Hasher::sha256();

    for count in [4usize, 16, 64, 256].iter() {
        let commits = sample_commits(*count);
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::new("substores", count), &commits, |b, commits| {
            b.iter(|| compute_multistore_root(black_box(&hasher), black_box(commits)))
        });
    }

    group.finish();
}

fn bench_verification(c: &mut Criterion) {
    let mut group = c.benchmark_group("verification");
    let verifier = MultiStoreVerifier::default();

    // Pre-generate payloads for verification benchmarks
    for keys in [16usize, 256, 4096].iter() {
        let store = sample_store(*keys);
        let app_hash = store.app_hash();
        let key = format!("account/{:06}", keys / 2).into_bytes();
        let value = format!("{}", (keys / 2) * 10).into_bytes();
        let payload = store
            .prove("acc", &key)
            .expect("proof generation failed")
            .encode(&Codec::default())
            .expect("encoding failed");

        group.throughput(Throughput::Bytes(payload.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("existence", keys),
            &(payload, key, value, app_hash),
            |b, (payload, key, value, app_hash)| {
                b.iter(|| {
                    verifier
                        .verify(black_box(payload), "acc", key, value, app_hash)
                        .expect("verification failed")
                })
            },
        );
    }

    group.finish();
}

fn bench_absence(c: &mut Criterion) {
    let mut group = c.benchmark_group("absence");

    let store = sample_store(1024);
    let app_hash = store.app_hash();
    let key = b"account/000512x".to_vec();
    let payload = store
        .prove("acc", &key)
        .expect("proof generation failed")
        .encode(&Codec::default())
        .expect("encoding failed");
    let verifier = MultiStoreVerifier::default();

    group.bench_function("verify", |b| {
        b.iter(|| {
            verifier
                .verify(black_box(&payload), "acc", &key, b"", &app_hash)
                .expect("verification failed")
        })
    });

    group.finish();
}

fn bench_proof_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("proof_generation");

    let store = sample_store(1024);

    group.bench_function("existence", |b| {
        b.iter(|| store.prove("acc", black_box(b"account/000512")).expect("proof generation failed"))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_multistore_root,
    bench_verification,
    bench_absence,
    bench_proof_generation,
);

criterion_main!(benches);
