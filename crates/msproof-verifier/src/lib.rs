//! msproof Verifier
//!
//! Light-client verification of multi-store query proofs. A proof is
//! accepted only if the substore commitments it carries fold to the
//! trusted app hash and the substore range proof attests the queried key.
//!
//! # Usage
//!
//! ```ignore
//! use msproof_verifier::MultiStoreVerifier;
//! use msproof_primitives::Hasher;
//!
//! let verifier = MultiStoreVerifier::new(Hasher::sha256());
//! let verified = verifier.verify(&proof_bytes, "acc", b"alice", b"100", &app_hash)?;
//! assert_eq!(verified.height, 963);
//! ```

mod error;
mod verify;

pub use error::{Result, VerifierError};
pub use verify::{
    verify_multistore_commit_info, verify_range_proof, MultiStoreVerifier, VerifiedValue,
};
