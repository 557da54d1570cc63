//! Fuzz target for multi-store root construction
//!
//! This target ensures:
//! 1. Root computation never panics
//! 2. The root does not depend on commit order
//! 3. Proofs produced by an in-memory store always verify

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use msproof_primitives::{compute_multistore_root, Codec, Hasher, SubstoreCommit};
use msproof_store::MemMultiStore;
use msproof_verifier::MultiStoreVerifier;

#[derive(Debug, Arbitrary)]
struct RootInput {
    commits: Vec<(String, i64, Option<Vec<u8>>)>,
    pairs: Vec<(Vec<u8>, Vec<u8>)>,
    probe: Vec<u8>,
}

fuzz_target!(|input: RootInput| {
    let hasher = Hasher::sha256();

    let commits: Vec<SubstoreCommit> = input
        .commits
        .into_iter()
        .take(64)
        .map(|(name, version, hash)| SubstoreCommit::new(name, version, hash))
        .collect();
    let root = compute_multistore_root(&hasher, &commits);
    let mut reversed = commits;
    reversed.reverse();
    assert_eq!(root, compute_multistore_root(&hasher, &reversed));

    let mut store = MemMultiStore::new(hasher, 1);
    store.mount("acc");
    for (key, value) in input.pairs.into_iter().take(256) {
        if !value.is_empty() {
            store.set("acc", key, value);
        }
    }

    let value = store
        .substore("acc")
        .and_then(|tree| tree.get(&input.probe))
        .map(<[u8]>::to_vec)
        .unwrap_or_default();
    let payload = store
        .prove("acc", &input.probe)
        .and_then(|proof| Ok(proof.encode(&Codec::default())?))
        .expect("in-memory proof must encode");
    MultiStoreVerifier::default()
        .verify(&payload, "acc", &input.probe, &value, &store.app_hash())
        .expect("in-memory proof must verify");
});
