//! Canonical two-child hashing
//!
//! Every Merkle step in the multi-store scheme combines two byte strings as
//! `H(uvarint(len(left)) || left || uvarint(len(right)) || right)`. The
//! producing node computes roots with exactly this rule, so verification
//! only succeeds when the byte layout here agrees with it bit-for-bit.

use crate::codec::encode_uvarint;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Width of a legacy `tmhash` digest (SHA-256 truncated)
pub const TMHASH_SIZE: usize = 20;

/// Domain byte prepended to key/value leaves so they never collide with
/// inner nodes (which start with a length prefix of a non-empty digest)
pub const LEAF_PREFIX: u8 = 0x00;

/// Digest primitive used for every node of the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// Full 32-byte SHA-256
    #[default]
    Sha256,
    /// SHA-256 truncated to 20 bytes
    Tmhash,
}

impl HashAlgorithm {
    /// Digest size in bytes
    pub const fn output_len(&self) -> usize {
        match self {
            HashAlgorithm::Sha256 => 32,
            HashAlgorithm::Tmhash => TMHASH_SIZE,
        }
    }

    /// Stable lowercase name
    pub const fn as_str(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Tmhash => "tmhash",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sha256" => Ok(HashAlgorithm::Sha256),
            "tmhash" => Ok(HashAlgorithm::Tmhash),
            other => Err(format!("unknown hash algorithm '{}'", other)),
        }
    }
}

/// Explicit hashing configuration passed into every root and proof computation
///
/// The hasher is a plain `Copy` value; nothing in this workspace keeps a
/// process-wide hashing state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Hasher {
    algorithm: HashAlgorithm,
}

impl Hasher {
    /// Create a hasher for the given algorithm
    pub const fn new(algorithm: HashAlgorithm) -> Self {
        Self { algorithm }
    }

    /// SHA-256 hasher (32-byte digests)
    pub const fn sha256() -> Self {
        Self::new(HashAlgorithm::Sha256)
    }

    /// Legacy truncated SHA-256 hasher (20-byte digests)
    pub const fn tmhash() -> Self {
        Self::new(HashAlgorithm::Tmhash)
    }

    /// The configured algorithm
    pub const fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Digest size in bytes
    pub const fn output_len(&self) -> usize {
        self.algorithm.output_len()
    }

    /// Hash raw bytes
    pub fn digest(&self, data: &[u8]) -> Vec<u8> {
        let mut hasher = Sha256::new();
        hasher.update(data);
        self.finish(hasher)
    }

    /// Combine two byte strings into one digest (one binary Merkle step)
    ///
    /// Each input is length-prefixed with an unsigned varint before
    /// concatenation. Order matters: `combine(a, b) != combine(b, a)`.
    pub fn combine(&self, left: &[u8], right: &[u8]) -> Vec<u8> {
        let mut hasher = Sha256::new();
        update_byte_slice(&mut hasher, left);
        update_byte_slice(&mut hasher, right);
        self.finish(hasher)
    }

    /// Hash a key/value leaf: `H(0x00 || uvarint(len(key)) || key || uvarint(len(value)) || value)`
    pub fn leaf(&self, key: &[u8], value: &[u8]) -> Vec<u8> {
        let mut hasher = Sha256::new();
        hasher.update([LEAF_PREFIX]);
        update_byte_slice(&mut hasher, key);
        update_byte_slice(&mut hasher, value);
        self.finish(hasher)
    }

    fn finish(&self, hasher: Sha256) -> Vec<u8> {
        let mut out = hasher.finalize().to_vec();
        out.truncate(self.output_len());
        out
    }
}

fn update_byte_slice(hasher: &mut Sha256, bytes: &[u8]) {
    let mut prefix = Vec::with_capacity(10);
    encode_uvarint(bytes.len() as u64, &mut prefix);
    hasher.update(&prefix);
    hasher.update(bytes);
}
