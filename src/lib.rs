//! msproof - Multi-store Merkle proof verification for light clients
//!
//! A chain's application state is split into named substores, each a Merkle
//! tree with its own root. The app hash signed into every block header is a
//! Merkle root over `(substore name, substore root)` pairs. This workspace
//! lets a client that trusts only that app hash accept a single key/value
//! (or the absence of a key) returned by an untrusted node.
//!
//! # Crates
//!
//! - `msproof-primitives`: Hashing, simple Merkle trees, substore commitments, codec
//! - `msproof-store`: Range proofs, in-memory substores, proof operator chains
//! - `msproof-verifier`: Two-stage verification against a trusted app hash
//! - `msproof-client`: Node queries with verification before values are returned
//!
//! # Example
//!
//! ```
//! use msproof::primitives::{Codec, Hasher};
//! use msproof::store::MemMultiStore;
//! use msproof::verifier::MultiStoreVerifier;
//!
//! let mut store = MemMultiStore::new(Hasher::sha256(), 963);
//! store.set("acc", "alice", "100");
//! store.set("gov", "proposal/1", "passed");
//!
//! let payload = store.prove("acc", b"alice").unwrap().encode(&Codec::default()).unwrap();
//! let verified = MultiStoreVerifier::default()
//!     .verify(&payload, "acc", b"alice", b"100", &store.app_hash())
//!     .unwrap();
//! assert_eq!(verified.height, 963);
//! ```

// Re-export sub-crates
pub use msproof_client as client;
pub use msproof_primitives as primitives;
pub use msproof_store as store;
pub use msproof_verifier as verifier;
