//! msproof Store
//!
//! Substore-side proof material for multi-store verification:
//! - Range proofs (existence/absence) and the `RangeProof` capability
//! - An in-memory substore tree and multi-store for producing proofs
//! - The `MultiStoreProof` query payload
//! - Proof operators chained by a `ProofRuntime` over a key path

pub mod error;
pub mod multistore;
pub mod ops;
pub mod range;
pub mod tree;

pub use error::{ProofError, ProofResult};
pub use multistore::{MemMultiStore, MultiStoreProof};
pub use ops::{
    KeyEncoding, KeyPath, OpDecoder, ProofOp, ProofOperator, ProofRuntime, PROOF_OP_MULTISTORE,
    PROOF_OP_RANGE_ABSENCE, PROOF_OP_RANGE_VALUE, PROOF_OP_SIMPLE_VALUE,
};
pub use range::{
    kv_leaf_hash, AbsenceProof, BoundRangeProof, ExistenceProof, RangeProof, SubstoreProof,
};
pub use tree::{KvPair, SubstoreTree};
