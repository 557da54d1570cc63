//! Proof verification implementation
//!
//! Verification runs in two stages. [`verify_multistore_commit_info`]
//! authenticates a multi-store snapshot against the trusted app hash and
//! yields the target substore's root; [`verify_range_proof`] then checks a
//! single key/value (or absence) claim against that root. Both are pure and
//! can be called concurrently.

use crate::error::{Result, VerifierError};
use msproof_primitives::{compute_multistore_root, hex_serde, Codec, Hasher, SubstoreCommit};
use msproof_store::{
    KeyEncoding, KeyPath, MultiStoreProof, ProofError, ProofOp, ProofRuntime, RangeProof,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Authenticate commit info against the trusted app hash
///
/// Returns the target substore's commit hash (`None` for an empty
/// substore) once the root over *all* entries matches `app_hash`.
pub fn verify_multistore_commit_info(
    hasher: &Hasher,
    target: &str,
    entries: &[SubstoreCommit],
    app_hash: &[u8],
) -> Result<Option<Vec<u8>>> {
    let entry = entries
        .iter()
        .find(|entry| entry.name == target)
        .ok_or_else(|| VerifierError::SubstoreNotFound(target.to_string()))?;

    let mut names: Vec<&str> = entries.iter().map(|entry| entry.name.as_str()).collect();
    names.sort_unstable();
    if let Some(pair) = names.windows(2).find(|pair| pair[0] == pair[1]) {
        return Err(VerifierError::DuplicateSubstore(pair[0].to_string()));
    }

    let computed = compute_multistore_root(hasher, entries);
    if computed.as_slice() != app_hash {
        warn!(
            store = target,
            expected = %hex::encode(app_hash),
            computed = %hex::encode(&computed),
            "multi-store root rejected"
        );
        return Err(VerifierError::root_mismatch(app_hash, &computed));
    }

    debug!(store = target, entries = entries.len(), "multi-store root verified");
    Ok(entry.commit_hash.clone())
}

/// Check a key/value claim against an authenticated substore root
///
/// An empty `value` asks for an absence proof. With neither a root nor a
/// proof there is nothing to prove and the call succeeds.
pub fn verify_range_proof(
    key: &[u8],
    value: &[u8],
    substore_root: Option<&[u8]>,
    proof: Option<&dyn RangeProof>,
) -> Result<()> {
    let proof = match (substore_root, proof) {
        (None, None) => {
            debug!("empty substore with no proof, nothing to verify");
            return Ok(());
        }
        (_, None) => return Err(VerifierError::ProofRootMismatch(ProofError::MissingProof)),
        (_, Some(proof)) => proof,
    };

    proof
        .verify(substore_root.unwrap_or_default())
        .map_err(VerifierError::ProofRootMismatch)?;

    if !value.is_empty() {
        proof
            .verify_item(key, value)
            .map_err(VerifierError::ExistenceVerificationFailed)
    } else {
        proof
            .verify_absence(key)
            .map_err(VerifierError::AbsenceVerificationFailed)
    }
}

/// A value accepted by the verifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedValue {
    pub store_name: String,

    #[serde(with = "hex_serde::bytes")]
    pub key: Vec<u8>,

    /// Empty when absence was proven
    #[serde(with = "hex_serde::bytes")]
    pub value: Vec<u8>,

    /// Root of the substore, `None` if it is empty
    #[serde(with = "hex_serde::option_bytes")]
    pub substore_root: Option<Vec<u8>>,

    /// Version recorded in the commit info
    pub height: i64,
}

impl VerifiedValue {
    /// True if the proof established absence rather than a value
    pub fn is_absence(&self) -> bool {
        self.value.is_empty()
    }
}

/// Stateless multi-store proof verifier
#[derive(Debug, Clone, Default)]
pub struct MultiStoreVerifier {
    hasher: Hasher,
    codec: Codec,
    expected_version: Option<i64>,
}

impl MultiStoreVerifier {
    /// Create a verifier with the default codec and no version check
    pub fn new(hasher: Hasher) -> Self {
        Self {
            hasher,
            codec: Codec::default(),
            expected_version: None,
        }
    }

    /// Use a specific codec for payload decoding
    pub fn with_codec(mut self, codec: Codec) -> Self {
        self.codec = codec;
        self
    }

    /// Require the target substore's version to equal `version`
    pub fn with_expected_version(mut self, version: i64) -> Self {
        self.expected_version = Some(version);
        self
    }

    pub fn hasher(&self) -> &Hasher {
        &self.hasher
    }

    pub fn codec(&self) -> &Codec {
        &self.codec
    }

    /// Decode a length-prefixed proof payload
    pub fn decode_proof(&self, proof_bytes: &[u8]) -> Result<MultiStoreProof> {
        MultiStoreProof::decode(&self.codec, proof_bytes).map_err(|e| {
            warn!(error = %e, "proof payload rejected");
            VerifierError::from(e)
        })
    }

    /// Decode and verify a proof payload for `store_name`/`key`
    pub fn verify(
        &self,
        proof_bytes: &[u8],
        store_name: &str,
        key: &[u8],
        value: &[u8],
        app_hash: &[u8],
    ) -> Result<VerifiedValue> {
        let proof = self.decode_proof(proof_bytes)?;
        self.verify_proof(&proof, store_name, key, value, app_hash)
    }

    /// Verify an already decoded proof payload
    pub fn verify_proof(
        &self,
        proof: &MultiStoreProof,
        store_name: &str,
        key: &[u8],
        value: &[u8],
        app_hash: &[u8],
    ) -> Result<VerifiedValue> {
        if proof.store_name() != store_name {
            return Err(VerifierError::malformed(format!(
                "proof targets substore '{}', expected '{}'",
                proof.store_name(),
                store_name
            )));
        }

        let commits = &proof.commit_info.commits;
        let substore_root =
            verify_multistore_commit_info(&self.hasher, store_name, commits, app_hash)?;

        let height = proof
            .commit_info
            .find(store_name)
            .map(|entry| entry.version)
            .unwrap_or(proof.commit_info.version);
        if let Some(expected) = self.expected_version {
            if height != expected {
                return Err(VerifierError::VersionMismatch {
                    store: store_name.to_string(),
                    expected,
                    actual: height,
                });
            }
        }

        let bound = proof
            .range_proof
            .as_ref()
            .map(|range_proof| range_proof.with_hasher(self.hasher));
        let range_proof = bound.as_ref().map(|b| b as &dyn RangeProof);
        if let Err(e) = verify_range_proof(key, value, substore_root.as_deref(), range_proof) {
            warn!(store = store_name, key = %hex::encode(key), error = %e, "range proof rejected");
            return Err(e);
        }

        debug!(store = store_name, key = %hex::encode(key), height, "value verified");
        Ok(VerifiedValue {
            store_name: store_name.to_string(),
            key: key.to_vec(),
            value: value.to_vec(),
            substore_root,
            height,
        })
    }

    /// Verify a proof operator chain for `store_name`/`key`
    ///
    /// The chain must consume the key path `/<store_name>/x:<key>`.
    pub fn verify_proof_ops(
        &self,
        ops: &[ProofOp],
        store_name: &str,
        key: &[u8],
        value: &[u8],
        app_hash: &[u8],
    ) -> Result<()> {
        let runtime = ProofRuntime::with_default_decoders(self.hasher, self.codec);
        let keypath = KeyPath::new()
            .append_key(store_name, KeyEncoding::Url)
            .append_key(key, KeyEncoding::Hex)
            .to_string();

        let result = if value.is_empty() {
            runtime.verify_absence(ops, app_hash, &keypath)
        } else {
            runtime.verify_value(ops, app_hash, &keypath, value)
        };

        result.map_err(|e| {
            warn!(keypath = %keypath, error = %e, "proof operator chain rejected");
            match e {
                e if e.is_decoding() => VerifierError::malformed(e.to_string()),
                ProofError::RootMismatch { expected, computed } => {
                    VerifierError::RootMismatch { expected, computed }
                }
                e @ ProofError::SubstoreRootMismatch { .. } => VerifierError::ProofRootMismatch(e),
                e if value.is_empty() => VerifierError::AbsenceVerificationFailed(e),
                e => VerifierError::ExistenceVerificationFailed(e),
            }
        })
    }
}
