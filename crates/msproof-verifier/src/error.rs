//! Error types for the multi-store proof verifier

use msproof_primitives::CodecError;
use msproof_store::ProofError;
use thiserror::Error;

/// Errors that can occur during proof verification
///
/// Every variant is terminal for the query that produced it.
#[derive(Debug, Error)]
pub enum VerifierError {
    /// Requested substore absent from the commit info
    #[error("Substore '{0}' not present in commit info")]
    SubstoreNotFound(String),

    /// Commit info lists the same substore more than once
    #[error("Substore '{0}' appears more than once in commit info")]
    DuplicateSubstore(String),

    /// Recomputed multi-store root differs from the trusted app hash
    #[error("Multi-store commitment does not match trusted application hash: expected {expected}, computed {computed}")]
    RootMismatch { expected: String, computed: String },

    /// Range proof root differs from the substore commit hash
    #[error("Proof root hash mismatch: {0}")]
    ProofRootMismatch(#[source] ProofError),

    /// Key/value existence is not proven
    #[error("Existence verification failed: {0}")]
    ExistenceVerificationFailed(#[source] ProofError),

    /// Key absence is not proven
    #[error("Absence verification failed: {0}")]
    AbsenceVerificationFailed(#[source] ProofError),

    /// Proof payload could not be decoded
    #[error("Malformed proof: {0}")]
    MalformedProof(String),

    /// Substore version differs from the expected height
    #[error("Version mismatch for substore '{store}': expected {expected}, got {actual}")]
    VersionMismatch {
        store: String,
        expected: i64,
        actual: i64,
    },
}

impl VerifierError {
    /// Create a malformed proof error
    pub fn malformed<S: Into<String>>(msg: S) -> Self {
        Self::MalformedProof(msg.into())
    }

    /// Create a root mismatch error from raw hashes
    pub fn root_mismatch(expected: &[u8], computed: &[u8]) -> Self {
        Self::RootMismatch {
            expected: hex::encode(expected),
            computed: hex::encode(computed),
        }
    }

    /// True for cryptographic rejections, false for lookup or decoding failures
    pub fn is_security_failure(&self) -> bool {
        matches!(
            self,
            Self::RootMismatch { .. }
                | Self::ProofRootMismatch(_)
                | Self::ExistenceVerificationFailed(_)
                | Self::AbsenceVerificationFailed(_)
        )
    }
}

impl From<CodecError> for VerifierError {
    fn from(err: CodecError) -> Self {
        Self::MalformedProof(err.to_string())
    }
}

/// Result type for verification
pub type Result<T> = std::result::Result<T, VerifierError>;
