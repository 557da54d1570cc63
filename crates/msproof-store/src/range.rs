//! Substore range proofs
//!
//! A substore proof attests either that `key -> value` is stored under a
//! substore root (existence) or that `key` is not (absence, via the two
//! adjacent leaves bracketing it). [`RangeProof`] is the capability the
//! verification pipeline depends on; [`BoundRangeProof`] implements it for
//! [`SubstoreProof`] under a concrete [`Hasher`].

use crate::error::{ProofError, ProofResult};
use msproof_primitives::{hex_serde, Hasher, SimpleProof};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Capability interface over a substore-local proof
pub trait RangeProof {
    /// Assert the proof's internal root equals `root`
    fn verify(&self, root: &[u8]) -> ProofResult<()>;

    /// Assert the proof attests `key -> value`; requires a prior `verify`
    fn verify_item(&self, key: &[u8], value: &[u8]) -> ProofResult<()>;

    /// Assert the proof attests `key` is absent; requires a prior `verify`
    fn verify_absence(&self, key: &[u8]) -> ProofResult<()>;
}

/// Leaf hash of a key/value pair in a substore tree
///
/// Leaves live in their own hash domain, so an inner node can never be
/// presented as a key/value pair.
pub fn kv_leaf_hash(hasher: &Hasher, key: &[u8], value: &[u8]) -> Vec<u8> {
    hasher.leaf(key, value)
}

/// Proof that `key -> value` is a leaf of the tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExistenceProof {
    #[serde(with = "hex_serde::bytes")]
    pub key: Vec<u8>,

    #[serde(with = "hex_serde::bytes")]
    pub value: Vec<u8>,

    /// Path from the leaf to the root
    pub proof: SimpleProof,
}

impl ExistenceProof {
    /// Leaf index of the proven pair
    pub fn index(&self) -> u64 {
        self.proof.index
    }

    /// Root implied by the leaf and its path
    pub fn compute_root(&self, hasher: &Hasher) -> ProofResult<Vec<u8>> {
        if kv_leaf_hash(hasher, &self.key, &self.value) != self.proof.leaf_hash {
            return Err(ProofError::malformed("leaf hash does not commit to key/value"));
        }
        self.proof
            .compute_root(hasher)
            .ok_or_else(|| ProofError::malformed("path is inconsistent with tree shape"))
    }
}

/// Proof that `key` is not a leaf of the tree
///
/// `left` and `right` are the adjacent leaves bracketing `key`; either may
/// be missing at the edges of the key space, and both are missing only for
/// an empty tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbsenceProof {
    #[serde(with = "hex_serde::bytes")]
    pub key: Vec<u8>,

    /// Number of leaves in the tree
    pub total: u64,

    pub left: Option<ExistenceProof>,

    pub right: Option<ExistenceProof>,
}

impl AbsenceProof {
    /// Root implied by the neighbour paths (empty for an empty tree)
    pub fn compute_root(&self, hasher: &Hasher) -> ProofResult<Vec<u8>> {
        match (&self.left, &self.right) {
            (None, None) if self.total == 0 => Ok(Vec::new()),
            (None, None) => Err(ProofError::malformed(
                "absence proof over a non-empty tree has no neighbours",
            )),
            (Some(left), None) => left.compute_root(hasher),
            (None, Some(right)) => right.compute_root(hasher),
            (Some(left), Some(right)) => {
                let left_root = left.compute_root(hasher)?;
                let right_root = right.compute_root(hasher)?;
                if left_root != right_root {
                    return Err(ProofError::malformed("neighbour proofs disagree on root"));
                }
                Ok(left_root)
            }
        }
    }

    /// Check the neighbours bracket `key` and are adjacent leaves
    pub fn check_neighbours(&self, key: &[u8]) -> ProofResult<()> {
        for neighbour in [&self.left, &self.right].into_iter().flatten() {
            if neighbour.proof.total != self.total {
                return Err(ProofError::invalid_absence("neighbour tree size differs"));
            }
        }

        if let Some(left) = &self.left {
            if left.key.as_slice() >= key {
                return Err(ProofError::invalid_absence("left neighbour is not below key"));
            }
        }
        if let Some(right) = &self.right {
            if right.key.as_slice() <= key {
                return Err(ProofError::invalid_absence("right neighbour is not above key"));
            }
        }

        match (&self.left, &self.right) {
            (None, None) if self.total == 0 => Ok(()),
            (None, None) => Err(ProofError::invalid_absence("missing neighbours")),
            (Some(left), Some(right)) if right.index() == left.index() + 1 => Ok(()),
            (None, Some(right)) if right.index() == 0 => Ok(()),
            (Some(left), None) if left.index() + 1 == self.total => Ok(()),
            _ => Err(ProofError::invalid_absence("neighbours are not adjacent leaves")),
        }
    }
}

/// Wire form of a substore proof
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubstoreProof {
    Existence(ExistenceProof),
    Absence(AbsenceProof),
}

impl SubstoreProof {
    /// Key the proof is about
    pub fn key(&self) -> &[u8] {
        match self {
            SubstoreProof::Existence(p) => &p.key,
            SubstoreProof::Absence(p) => &p.key,
        }
    }

    /// "existence" or "absence"
    pub fn kind(&self) -> &'static str {
        match self {
            SubstoreProof::Existence(_) => "existence",
            SubstoreProof::Absence(_) => "absence",
        }
    }

    /// Root implied by the proof
    pub fn compute_root(&self, hasher: &Hasher) -> ProofResult<Vec<u8>> {
        match self {
            SubstoreProof::Existence(p) => p.compute_root(hasher),
            SubstoreProof::Absence(p) => p.compute_root(hasher),
        }
    }

    /// Bind the proof to a hasher, producing a [`RangeProof`]
    pub fn with_hasher(&self, hasher: Hasher) -> BoundRangeProof<'_> {
        BoundRangeProof {
            proof: self,
            hasher,
            verified_root: OnceLock::new(),
        }
    }
}

/// A [`SubstoreProof`] bound to the hasher it is checked with
#[derive(Debug)]
pub struct BoundRangeProof<'a> {
    proof: &'a SubstoreProof,
    hasher: Hasher,
    verified_root: OnceLock<Vec<u8>>,
}

impl BoundRangeProof<'_> {
    /// Root accepted by a successful `verify`, if any
    pub fn verified_root(&self) -> Option<&[u8]> {
        self.verified_root.get().map(Vec::as_slice)
    }

    fn ensure_verified(&self) -> ProofResult<()> {
        if self.verified_root.get().is_none() {
            return Err(ProofError::RootNotVerified);
        }
        Ok(())
    }
}

impl RangeProof for BoundRangeProof<'_> {
    fn verify(&self, root: &[u8]) -> ProofResult<()> {
        let computed = self.proof.compute_root(&self.hasher)?;
        if computed.as_slice() != root {
            return Err(ProofError::root_mismatch(root, &computed));
        }
        let _ = self.verified_root.set(computed);
        Ok(())
    }

    fn verify_item(&self, key: &[u8], value: &[u8]) -> ProofResult<()> {
        self.ensure_verified()?;
        let SubstoreProof::Existence(existence) = self.proof else {
            return Err(ProofError::WrongProofKind {
                expected: "existence",
                actual: self.proof.kind(),
            });
        };
        if existence.key.as_slice() != key {
            return Err(ProofError::key_mismatch(key, &existence.key));
        }
        if existence.value.as_slice() != value {
            return Err(ProofError::ValueMismatch {
                key: hex::encode(key),
            });
        }
        Ok(())
    }

    fn verify_absence(&self, key: &[u8]) -> ProofResult<()> {
        self.ensure_verified()?;
        let SubstoreProof::Absence(absence) = self.proof else {
            return Err(ProofError::WrongProofKind {
                expected: "absence",
                actual: self.proof.kind(),
            });
        };
        if absence.key.as_slice() != key {
            return Err(ProofError::key_mismatch(key, &absence.key));
        }
        absence.check_neighbours(key)
    }
}
