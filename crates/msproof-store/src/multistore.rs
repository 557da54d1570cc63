//! Multi-store proof payload and an in-memory multi-store producing it

use crate::error::{ProofError, ProofResult};
use crate::ops::{ProofOp, ProofOperator};
use crate::range::SubstoreProof;
use crate::tree::SubstoreTree;
use msproof_primitives::{
    compute_multistore_root, Codec, CodecError, Hasher, MultiStoreCommitInfo, SubstoreCommit,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Proof carried by a store query response
///
/// Binds the substore commitments of one block to the app hash, plus the
/// substore-local proof for the queried key. `range_proof` is `None` when
/// no query ran against the substore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiStoreProof {
    pub commit_info: MultiStoreCommitInfo,
    pub range_proof: Option<SubstoreProof>,
}

impl MultiStoreProof {
    pub fn new(commit_info: MultiStoreCommitInfo, range_proof: Option<SubstoreProof>) -> Self {
        Self {
            commit_info,
            range_proof,
        }
    }

    /// Name of the substore the range proof targets
    pub fn store_name(&self) -> &str {
        &self.commit_info.store_name
    }

    /// Multi-store root implied by the commit records
    pub fn compute_root_hash(&self, hasher: &Hasher) -> Vec<u8> {
        self.commit_info.root_hash(hasher)
    }

    /// Length-prefixed wire form
    pub fn encode(&self, codec: &Codec) -> Result<Vec<u8>, CodecError> {
        codec.encode_length_prefixed(self)
    }

    /// Parse the length-prefixed wire form
    pub fn decode(codec: &Codec, bytes: &[u8]) -> Result<Self, CodecError> {
        codec.decode_length_prefixed(bytes)
    }
}

/// Named substore trees committed together under one app hash
#[derive(Debug, Clone)]
pub struct MemMultiStore {
    hasher: Hasher,
    version: i64,
    stores: BTreeMap<String, SubstoreTree>,
}

impl MemMultiStore {
    pub fn new(hasher: Hasher, version: i64) -> Self {
        Self {
            hasher,
            version,
            stores: BTreeMap::new(),
        }
    }

    pub fn hasher(&self) -> &Hasher {
        &self.hasher
    }

    pub fn version(&self) -> i64 {
        self.version
    }

    pub fn set_version(&mut self, version: i64) {
        self.version = version;
    }

    /// Mount an empty substore, if not already mounted
    pub fn mount(&mut self, name: impl Into<String>) -> &mut SubstoreTree {
        let hasher = self.hasher;
        self.stores
            .entry(name.into())
            .or_insert_with(|| SubstoreTree::new(hasher))
    }

    /// Write a value, mounting the substore on first use
    pub fn set(&mut self, store: &str, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) {
        self.mount(store).insert(key, value);
    }

    pub fn substore(&self, name: &str) -> Option<&SubstoreTree> {
        self.stores.get(name)
    }

    pub fn store_names(&self) -> impl Iterator<Item = &str> {
        self.stores.keys().map(String::as_str)
    }

    /// One commit record per mounted substore
    pub fn commits(&self) -> Vec<SubstoreCommit> {
        self.stores
            .iter()
            .map(|(name, tree)| SubstoreCommit::new(name.clone(), self.version, tree.root_hash()))
            .collect()
    }

    /// App hash over every mounted substore
    pub fn app_hash(&self) -> Vec<u8> {
        compute_multistore_root(&self.hasher, &self.commits())
    }

    fn tree(&self, store: &str) -> ProofResult<&SubstoreTree> {
        self.stores
            .get(store)
            .ok_or_else(|| ProofError::malformed(format!("substore '{}' is not mounted", store)))
    }

    /// Proof payload for `key` in `store`
    pub fn prove(&self, store: &str, key: &[u8]) -> ProofResult<MultiStoreProof> {
        let tree = self.tree(store)?;
        let commit_info = MultiStoreCommitInfo::new(self.version, store, self.commits());
        Ok(MultiStoreProof::new(commit_info, Some(tree.prove(key))))
    }

    /// Proof operator chain for `key` in `store`, innermost first
    pub fn prove_ops(&self, store: &str, key: &[u8], codec: &Codec) -> ProofResult<Vec<ProofOp>> {
        let tree = self.tree(store)?;
        let substore_op = match tree.prove(key) {
            SubstoreProof::Existence(proof) => ProofOperator::RangeValue {
                key: key.to_vec(),
                proof,
            },
            SubstoreProof::Absence(proof) => ProofOperator::RangeAbsence {
                key: key.to_vec(),
                proof,
            },
        };
        let store_op = ProofOperator::MultiStore {
            key: store.as_bytes().to_vec(),
            commits: self.commits(),
        };
        Ok(vec![substore_op.to_proof_op(codec)?, store_op.to_proof_op(codec)?])
    }
}
