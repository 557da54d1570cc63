//! msproof Primitives
//!
//! Building blocks shared by the multi-store proof crates:
//! - Canonical two-child hasher (`Hasher`, `HashAlgorithm`)
//! - Simple Merkle fold and per-leaf aunt proofs
//! - Substore commitments and the multi-store root builder
//! - Length-prefixed binary codec
//! - Hex serde helpers for byte fields

pub mod codec;
pub mod commit;
pub mod hash;
pub mod hex_serde;
pub mod merkle;

pub use codec::{decode_uvarint, encode_uvarint, Codec, CodecError, DEFAULT_MAX_PAYLOAD_LEN};
pub use commit::{
    compute_multistore_root, multistore_inclusion_proof, sorted_leaf_hashes, MultiStoreCommitInfo,
    SubstoreCommit,
};
pub use hash::{HashAlgorithm, Hasher, LEAF_PREFIX, TMHASH_SIZE};
pub use merkle::{simple_hash_from_hashes, simple_proofs_from_hashes, SimpleProof};
