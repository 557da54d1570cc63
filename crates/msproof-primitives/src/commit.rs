//! Substore commitments and the multi-store root
//!
//! A multi-store root is defined over the *set* of substore commitments:
//! entries are sorted by name before they are folded, so decode order never
//! affects the result. Leaves use the flat convention
//! `combine(name, commit_hash)`, with a missing commit hash hashed as the
//! empty byte string (an empty substore still contributes a leaf).

use crate::hash::Hasher;
use crate::hex_serde;
use crate::merkle::{simple_hash_from_hashes, simple_proofs_from_hashes, SimpleProof};
use serde::{Deserialize, Serialize};

/// One named substore's root at a block version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubstoreCommit {
    /// Substore name, unique within a snapshot
    pub name: String,

    /// Height at which the substore was last committed
    pub version: i64,

    /// Substore root hash; `None` for an empty substore
    #[serde(with = "hex_serde::option_bytes", default)]
    pub commit_hash: Option<Vec<u8>>,
}

impl SubstoreCommit {
    /// Create a commit record
    pub fn new(name: impl Into<String>, version: i64, commit_hash: Option<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            version,
            commit_hash,
        }
    }

    /// Commit hash, with `None` read as the empty byte string
    pub fn commit_hash_bytes(&self) -> &[u8] {
        self.commit_hash.as_deref().unwrap_or_default()
    }

    /// Leaf hash of this record in the multi-store tree
    pub fn leaf_hash(&self, hasher: &Hasher) -> Vec<u8> {
        hasher.combine(self.name.as_bytes(), self.commit_hash_bytes())
    }
}

/// Every substore commitment composing one application-wide commitment
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MultiStoreCommitInfo {
    /// Block version of the snapshot
    pub version: i64,

    /// Substore the accompanying range proof targets
    pub store_name: String,

    /// Substore records, in whatever order they were decoded
    pub commits: Vec<SubstoreCommit>,
}

impl MultiStoreCommitInfo {
    /// Create commit info for a snapshot
    pub fn new(version: i64, store_name: impl Into<String>, commits: Vec<SubstoreCommit>) -> Self {
        Self {
            version,
            store_name: store_name.into(),
            commits,
        }
    }

    /// Look up a substore record by name (first match)
    pub fn find(&self, name: &str) -> Option<&SubstoreCommit> {
        self.commits.iter().find(|c| c.name == name)
    }

    /// Multi-store root over all records
    pub fn root_hash(&self, hasher: &Hasher) -> Vec<u8> {
        compute_multistore_root(hasher, &self.commits)
    }

    /// Names occurring more than once, sorted
    pub fn duplicate_names(&self) -> Vec<String> {
        let sorted = sorted_by_name(&self.commits);
        let mut duplicates: Vec<String> = sorted
            .windows(2)
            .filter(|w| w[0].name == w[1].name)
            .map(|w| w[0].name.clone())
            .collect();
        duplicates.dedup();
        duplicates
    }
}

fn sorted_by_name(entries: &[SubstoreCommit]) -> Vec<&SubstoreCommit> {
    let mut sorted: Vec<&SubstoreCommit> = entries.iter().collect();
    sorted.sort_by(|a, b| a.name.as_bytes().cmp(b.name.as_bytes()));
    sorted
}

/// Leaf hashes of `entries` in canonical (name-sorted) order
pub fn sorted_leaf_hashes(hasher: &Hasher, entries: &[SubstoreCommit]) -> Vec<Vec<u8>> {
    sorted_by_name(entries)
        .into_iter()
        .map(|entry| entry.leaf_hash(hasher))
        .collect()
}

/// Compute the multi-store root of a set of substore commitments
///
/// Input order is irrelevant; entries are always sorted by name first.
/// An empty set yields an empty root.
pub fn compute_multistore_root(hasher: &Hasher, entries: &[SubstoreCommit]) -> Vec<u8> {
    simple_hash_from_hashes(hasher, &sorted_leaf_hashes(hasher, entries)).unwrap_or_default()
}

/// Inclusion proof of one substore's leaf in the multi-store tree
///
/// Returns `None` if `name` is not among `entries`.
pub fn multistore_inclusion_proof(
    hasher: &Hasher,
    entries: &[SubstoreCommit],
    name: &str,
) -> Option<SimpleProof> {
    let sorted = sorted_by_name(entries);
    let position = sorted.iter().position(|entry| entry.name == name)?;
    let leaves: Vec<Vec<u8>> = sorted.iter().map(|entry| entry.leaf_hash(hasher)).collect();
    let (_, mut proofs) = simple_proofs_from_hashes(hasher, &leaves);
    Some(proofs.swap_remove(position))
}
