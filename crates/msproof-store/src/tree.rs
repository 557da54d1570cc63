//! In-memory substore tree
//!
//! Keeps key/value pairs sorted by key and commits to them with a simple
//! Merkle tree over domain-separated key/value leaves. Used to produce fixtures
//! and proofs for the verification pipeline.

use crate::range::{kv_leaf_hash, AbsenceProof, ExistenceProof, SubstoreProof};
use msproof_primitives::{hex_serde, simple_hash_from_hashes, simple_proofs_from_hashes, Hasher};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A key/value pair returned by subspace queries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KvPair {
    #[serde(with = "hex_serde::bytes")]
    pub key: Vec<u8>,

    #[serde(with = "hex_serde::bytes")]
    pub value: Vec<u8>,
}

impl KvPair {
    pub fn new(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Sorted key/value store with Merkle commitments
#[derive(Debug, Clone, Default)]
pub struct SubstoreTree {
    hasher: Hasher,
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl SubstoreTree {
    /// Create an empty tree
    pub fn new(hasher: Hasher) -> Self {
        Self {
            hasher,
            entries: BTreeMap::new(),
        }
    }

    /// Build a tree from pairs; later duplicates overwrite earlier ones
    pub fn from_pairs<I, K, V>(hasher: Hasher, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Vec<u8>>,
        V: Into<Vec<u8>>,
    {
        let mut tree = Self::new(hasher);
        for (key, value) in pairs {
            tree.insert(key, value);
        }
        tree
    }

    pub fn hasher(&self) -> &Hasher {
        &self.hasher
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert or replace a value, returning the previous one
    pub fn insert(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Option<Vec<u8>> {
        self.entries.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &[u8]) -> Option<Vec<u8>> {
        self.entries.remove(key)
    }

    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    /// Pairs in key order
    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &[u8])> {
        self.entries.iter().map(|(k, v)| (k.as_slice(), v.as_slice()))
    }

    /// All pairs whose key starts with `prefix`, in key order
    pub fn subspace(&self, prefix: &[u8]) -> Vec<KvPair> {
        self.entries
            .range(prefix.to_vec()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, value)| KvPair::new(key.clone(), value.clone()))
            .collect()
    }

    fn leaf_hashes(&self) -> Vec<Vec<u8>> {
        self.entries
            .iter()
            .map(|(key, value)| kv_leaf_hash(&self.hasher, key, value))
            .collect()
    }

    /// Root hash; `None` for an empty tree
    pub fn root_hash(&self) -> Option<Vec<u8>> {
        simple_hash_from_hashes(&self.hasher, &self.leaf_hashes())
    }

    /// Existence proof if `key` is present, absence proof otherwise
    pub fn prove(&self, key: &[u8]) -> SubstoreProof {
        let (_, proofs) = simple_proofs_from_hashes(&self.hasher, &self.leaf_hashes());
        let pairs: Vec<(&Vec<u8>, &Vec<u8>)> = self.entries.iter().collect();
        let total = pairs.len() as u64;

        let existence_at = |index: usize| ExistenceProof {
            key: pairs[index].0.clone(),
            value: pairs[index].1.clone(),
            proof: proofs[index].clone(),
        };

        match pairs.binary_search_by(|(probe, _)| probe.as_slice().cmp(key)) {
            Ok(index) => SubstoreProof::Existence(existence_at(index)),
            Err(insert_at) => {
                let left = (insert_at > 0).then(|| existence_at(insert_at - 1));
                let right = (insert_at < pairs.len()).then(|| existence_at(insert_at));
                SubstoreProof::Absence(AbsenceProof {
                    key: key.to_vec(),
                    total,
                    left,
                    right,
                })
            }
        }
    }
}
