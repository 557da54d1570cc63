//! Property-Based Tests for multi-store proofs
//!
//! These tests use proptest to verify invariants that should hold for all inputs:
//! - The multi-store root does not depend on commit order
//! - Changing any committed byte changes the root
//! - Every stored key has a verifying existence proof
//! - Every missing key has a verifying absence proof
//! - Forged values never verify

use proptest::prelude::*;
use std::collections::BTreeMap;

use msproof::primitives::{compute_multistore_root, Codec, Hasher, SubstoreCommit};
use msproof::store::MemMultiStore;
use msproof::verifier::MultiStoreVerifier;

// =============================================================================
// Strategies
// =============================================================================

fn commits_strategy() -> impl Strategy<Value = Vec<SubstoreCommit>> {
    prop::collection::btree_map(
        "[a-z]{1,8}",
        prop::option::of(prop::collection::vec(any::<u8>(), 32)),
        1..12,
    )
    .prop_map(|entries| {
        entries
            .into_iter()
            .map(|(name, hash)| SubstoreCommit::new(name, 7, hash))
            .collect()
    })
}

fn substore_strategy() -> impl Strategy<Value = BTreeMap<Vec<u8>, Vec<u8>>> {
    prop::collection::btree_map(
        prop::collection::vec(any::<u8>(), 1..12),
        prop::collection::vec(any::<u8>(), 1..16),
        1..40,
    )
}

fn store_from(pairs: &BTreeMap<Vec<u8>, Vec<u8>>) -> MemMultiStore {
    let mut store = MemMultiStore::new(Hasher::sha256(), 100);
    for (key, value) in pairs {
        store.set("acc", key.clone(), value.clone());
    }
    store.set("gov", "proposal/1", "passed");
    store.mount("ibc");
    store
}

fn verify(store: &MemMultiStore, key: &[u8], value: &[u8]) -> bool {
    let payload = store
        .prove("acc", key)
        .unwrap()
        .encode(&Codec::default())
        .unwrap();
    MultiStoreVerifier::default()
        .verify(&payload, "acc", key, value, &store.app_hash())
        .is_ok()
}

// =============================================================================
// Root Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_root_independent_of_order(
        (commits, shuffled) in commits_strategy()
            .prop_flat_map(|commits| (Just(commits.clone()), Just(commits).prop_shuffle()))
    ) {
        let hasher = Hasher::sha256();
        prop_assert_eq!(
            compute_multistore_root(&hasher, &commits),
            compute_multistore_root(&hasher, &shuffled)
        );
    }

    #[test]
    fn prop_any_hash_byte_change_alters_root(
        commits in commits_strategy(),
        pick in any::<prop::sample::Index>(),
        flip in 1u8..=255,
    ) {
        let hasher = Hasher::sha256();
        let original = compute_multistore_root(&hasher, &commits);

        let mut altered = commits.clone();
        let target = pick.index(altered.len());
        match &mut altered[target].commit_hash {
            Some(hash) => {
                let i = usize::from(flip) % hash.len();
                hash[i] ^= flip;
            }
            None => altered[target].commit_hash = Some(vec![flip]),
        }

        prop_assert_ne!(original, compute_multistore_root(&hasher, &altered));
    }

    #[test]
    fn prop_version_not_committed(
        commits in commits_strategy(),
        version in any::<i64>(),
    ) {
        let hasher = Hasher::sha256();
        let rewritten: Vec<SubstoreCommit> = commits
            .iter()
            .cloned()
            .map(|mut commit| {
                commit.version = version;
                commit
            })
            .collect();
        prop_assert_eq!(
            compute_multistore_root(&hasher, &commits),
            compute_multistore_root(&hasher, &rewritten)
        );
    }
}

// =============================================================================
// Range Proof Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_every_stored_key_verifies(pairs in substore_strategy()) {
        let store = store_from(&pairs);
        for (key, value) in &pairs {
            prop_assert!(verify(&store, key, value), "existence failed for {}", hex::encode(key));
        }
    }

    #[test]
    fn prop_missing_key_absence_verifies(
        pairs in substore_strategy(),
        probe in prop::collection::vec(any::<u8>(), 1..12),
    ) {
        prop_assume!(!pairs.contains_key(&probe));
        let store = store_from(&pairs);
        prop_assert!(verify(&store, &probe, b""));
    }

    #[test]
    fn prop_forged_value_never_verifies(
        pairs in substore_strategy(),
        pick in any::<prop::sample::Index>(),
        forged in prop::collection::vec(any::<u8>(), 1..16),
    ) {
        let store = store_from(&pairs);
        let (key, value) = pairs.iter().nth(pick.index(pairs.len())).unwrap();
        prop_assume!(&forged != value);
        prop_assert!(!verify(&store, key, &forged));
    }

    #[test]
    fn prop_stored_key_never_proven_absent(
        pairs in substore_strategy(),
        pick in any::<prop::sample::Index>(),
    ) {
        let store = store_from(&pairs);
        let (key, _) = pairs.iter().nth(pick.index(pairs.len())).unwrap();
        prop_assert!(!verify(&store, key, b""));
    }
}
