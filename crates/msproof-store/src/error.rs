//! Error types for substore proofs and proof operators

use msproof_primitives::CodecError;
use thiserror::Error;

/// Errors raised by range proofs, proof operators and the proof runtime
#[derive(Debug, Error)]
pub enum ProofError {
    /// No proof was supplied where one is required
    #[error("Proof is missing")]
    MissingProof,

    /// Recomputed root differs from the expected root
    #[error("Root hash mismatch: expected {expected}, computed {computed}")]
    RootMismatch { expected: String, computed: String },

    /// Proof structure is internally inconsistent
    #[error("Malformed proof: {0}")]
    Malformed(String),

    /// Item or absence checks were attempted before the root was verified
    #[error("Proof root has not been verified")]
    RootNotVerified,

    /// Proof is for a different key
    #[error("Key mismatch: expected {expected}, proof has {actual}")]
    KeyMismatch { expected: String, actual: String },

    /// Proof attests a different value for the key
    #[error("Value mismatch for key {key}")]
    ValueMismatch { key: String },

    /// Existence was asked of an absence proof or vice versa
    #[error("Wrong proof kind: expected {expected} proof, got {actual} proof")]
    WrongProofKind {
        expected: &'static str,
        actual: &'static str,
    },

    /// Absence proof does not bracket the key with adjacent neighbours
    #[error("Invalid absence proof: {0}")]
    InvalidAbsence(String),

    /// No decoder registered for a proof operator tag
    #[error("Unknown proof operator type '{0}'")]
    UnknownOpType(String),

    /// Decoder invoked for a different tag
    #[error("Unexpected proof operator type: got '{got}', want '{want}'")]
    UnexpectedOpType { got: String, want: &'static str },

    /// A decoder is already registered for the tag
    #[error("Proof operator type '{0}' is already registered")]
    DuplicateOpType(String),

    /// Substore root produced by the chain differs from its commitment
    #[error("Substore root for '{store}' does not match its commitment")]
    SubstoreRootMismatch { store: String },

    /// Proof operator failed while running
    #[error("Proof operator {op} failed: {reason}")]
    OpFailed { op: &'static str, reason: String },

    /// Key path could not be parsed or was not fully consumed
    #[error("Invalid key path: {0}")]
    KeyPath(String),

    /// Payload framing or body decoding failed
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),
}

impl ProofError {
    /// Create a malformed proof error
    pub fn malformed<S: Into<String>>(msg: S) -> Self {
        Self::Malformed(msg.into())
    }

    /// Create an invalid absence error
    pub fn invalid_absence<S: Into<String>>(msg: S) -> Self {
        Self::InvalidAbsence(msg.into())
    }

    /// Create an operator failure error
    pub fn op_failed<S: Into<String>>(op: &'static str, reason: S) -> Self {
        Self::OpFailed {
            op,
            reason: reason.into(),
        }
    }

    /// Create a root mismatch error from raw hashes
    pub fn root_mismatch(expected: &[u8], computed: &[u8]) -> Self {
        Self::RootMismatch {
            expected: hex::encode(expected),
            computed: hex::encode(computed),
        }
    }

    /// Create a key mismatch error from raw keys
    pub fn key_mismatch(expected: &[u8], actual: &[u8]) -> Self {
        Self::KeyMismatch {
            expected: hex::encode(expected),
            actual: hex::encode(actual),
        }
    }

    /// True for framing or decoding failures rather than cryptographic ones
    pub fn is_decoding(&self) -> bool {
        matches!(
            self,
            Self::Codec(_) | Self::UnknownOpType(_) | Self::UnexpectedOpType { .. }
        )
    }
}

/// Result type for proof operations
pub type ProofResult<T> = Result<T, ProofError>;
