//! Simple Merkle tree over an ordered list of leaf hashes
//!
//! The tree is not padded: a list of `n` hashes splits at `ceil(n/2)` and
//! both halves are folded recursively. Depth is `O(log n)`, so the fold is
//! kept as plain recursion.

use crate::hash::Hasher;
use crate::hex_serde;
use serde::{Deserialize, Serialize};

/// Fold an ordered list of leaf hashes into a root
///
/// Returns `None` for an empty list.
pub fn simple_hash_from_hashes(hasher: &Hasher, hashes: &[Vec<u8>]) -> Option<Vec<u8>> {
    match hashes.len() {
        0 => None,
        1 => Some(hashes[0].clone()),
        n => {
            let split = n.div_ceil(2);
            let left = simple_hash_from_hashes(hasher, &hashes[..split])?;
            let right = simple_hash_from_hashes(hasher, &hashes[split..])?;
            Some(hasher.combine(&left, &right))
        }
    }
}

/// Inclusion proof for one leaf of a simple Merkle tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleProof {
    /// Number of leaves in the tree
    pub total: u64,

    /// Position of the proven leaf
    pub index: u64,

    /// Hash of the proven leaf
    #[serde(with = "hex_serde::bytes")]
    pub leaf_hash: Vec<u8>,

    /// Sibling subtree roots, innermost first
    #[serde(with = "hex_serde::bytes_vec")]
    pub aunts: Vec<Vec<u8>>,
}

impl SimpleProof {
    /// Recompute the root implied by this proof
    ///
    /// Returns `None` when `index`/`total` are inconsistent or the number of
    /// aunts does not match the tree shape.
    pub fn compute_root(&self, hasher: &Hasher) -> Option<Vec<u8>> {
        compute_hash_from_aunts(hasher, self.index, self.total, &self.leaf_hash, &self.aunts)
    }

    /// Check that `leaf_hash` sits at `index` under `root`
    pub fn verify(&self, hasher: &Hasher, root: &[u8], leaf_hash: &[u8]) -> bool {
        if self.leaf_hash.as_slice() != leaf_hash {
            return false;
        }
        match self.compute_root(hasher) {
            Some(computed) => computed.as_slice() == root,
            None => false,
        }
    }
}

fn compute_hash_from_aunts(
    hasher: &Hasher,
    index: u64,
    total: u64,
    leaf_hash: &[u8],
    aunts: &[Vec<u8>],
) -> Option<Vec<u8>> {
    if total == 0 || index >= total {
        return None;
    }
    if total == 1 {
        return aunts.is_empty().then(|| leaf_hash.to_vec());
    }

    let (last, inner) = aunts.split_last()?;
    let num_left = total.div_ceil(2);
    if index < num_left {
        let left = compute_hash_from_aunts(hasher, index, num_left, leaf_hash, inner)?;
        Some(hasher.combine(&left, last))
    } else {
        let right =
            compute_hash_from_aunts(hasher, index - num_left, total - num_left, leaf_hash, inner)?;
        Some(hasher.combine(last, &right))
    }
}

/// Build the root and one inclusion proof per leaf
pub fn simple_proofs_from_hashes(
    hasher: &Hasher,
    hashes: &[Vec<u8>],
) -> (Option<Vec<u8>>, Vec<SimpleProof>) {
    let total = hashes.len() as u64;
    let (root, trails) = build_trails(hasher, hashes);
    let proofs = trails
        .into_iter()
        .enumerate()
        .map(|(index, aunts)| SimpleProof {
            total,
            index: index as u64,
            leaf_hash: hashes[index].clone(),
            aunts,
        })
        .collect();
    (root, proofs)
}

// Returns the subtree root and, per leaf, its aunts innermost first.
fn build_trails(hasher: &Hasher, hashes: &[Vec<u8>]) -> (Option<Vec<u8>>, Vec<Vec<Vec<u8>>>) {
    match hashes.len() {
        0 => (None, Vec::new()),
        1 => (Some(hashes[0].clone()), vec![Vec::new()]),
        n => {
            let split = n.div_ceil(2);
            let (left_root, mut left_trails) = build_trails(hasher, &hashes[..split]);
            let (right_root, mut right_trails) = build_trails(hasher, &hashes[split..]);
            let (Some(left_root), Some(right_root)) = (left_root, right_root) else {
                return (None, Vec::new());
            };

            for trail in &mut left_trails {
                trail.push(right_root.clone());
            }
            for trail in &mut right_trails {
                trail.push(left_root.clone());
            }
            left_trails.extend(right_trails);

            (Some(hasher.combine(&left_root, &right_root)), left_trails)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaves(n: usize) -> Vec<Vec<u8>> {
        let hasher = Hasher::sha256();
        (0..n).map(|i| hasher.digest(format!("leaf-{}", i).as_bytes())).collect()
    }

    #[test]
    fn test_empty_list_has_no_root() {
        assert_eq!(simple_hash_from_hashes(&Hasher::sha256(), &[]), None);
    }

    #[test]
    fn test_single_leaf_is_root() {
        let l = leaves(1);
        assert_eq!(simple_hash_from_hashes(&Hasher::sha256(), &l), Some(l[0].clone()));
    }

    #[test]
    fn test_three_leaves_split_left_heavy() {
        let hasher = Hasher::sha256();
        let l = leaves(3);
        let expected = hasher.combine(&hasher.combine(&l[0], &l[1]), &l[2]);
        assert_eq!(simple_hash_from_hashes(&hasher, &l), Some(expected));
    }

    #[test]
    fn test_five_leaves_shape() {
        let hasher = Hasher::sha256();
        let l = leaves(5);
        let left = hasher.combine(&hasher.combine(&l[0], &l[1]), &l[2]);
        let right = hasher.combine(&l[3], &l[4]);
        assert_eq!(simple_hash_from_hashes(&hasher, &l), Some(hasher.combine(&left, &right)));
    }

    #[test]
    fn test_proofs_verify_for_every_leaf() {
        let hasher = Hasher::sha256();
        for n in 1..=17 {
            let l = leaves(n);
            let (root, proofs) = simple_proofs_from_hashes(&hasher, &l);
            let root = root.unwrap();
            assert_eq!(Some(root.clone()), simple_hash_from_hashes(&hasher, &l));
            assert_eq!(proofs.len(), n);
            for (i, proof) in proofs.iter().enumerate() {
                assert!(proof.verify(&hasher, &root, &l[i]), "leaf {} of {}", i, n);
            }
        }
    }

    #[test]
    fn test_proof_rejects_wrong_leaf() {
        let hasher = Hasher::sha256();
        let l = leaves(6);
        let (root, proofs) = simple_proofs_from_hashes(&hasher, &l);
        assert!(!proofs[2].verify(&hasher, &root.unwrap(), &l[3]));
    }

    #[test]
    fn test_proof_rejects_tampered_aunt() {
        let hasher = Hasher::sha256();
        let l = leaves(6);
        let (root, mut proofs) = simple_proofs_from_hashes(&hasher, &l);
        proofs[4].aunts[0][0] ^= 0x01;
        assert!(!proofs[4].verify(&hasher, &root.unwrap(), &l[4]));
    }

    #[test]
    fn test_proof_inconsistent_shape() {
        let hasher = Hasher::sha256();
        let l = leaves(4);
        let (_, proofs) = simple_proofs_from_hashes(&hasher, &l);

        let mut bad_index = proofs[0].clone();
        bad_index.index = 4;
        assert_eq!(bad_index.compute_root(&hasher), None);

        let mut extra_aunt = proofs[0].clone();
        extra_aunt.aunts.push(vec![0u8; 32]);
        assert_eq!(extra_aunt.compute_root(&hasher), None);

        let mut missing_aunt = proofs[0].clone();
        missing_aunt.aunts.clear();
        assert_eq!(missing_aunt.compute_root(&hasher), None);
    }

    #[test]
    fn test_proofs_for_empty_tree() {
        let (root, proofs) = simple_proofs_from_hashes(&Hasher::sha256(), &[]);
        assert!(root.is_none());
        assert!(proofs.is_empty());
    }
}
