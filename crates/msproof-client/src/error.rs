//! Error types for the query client

use msproof_primitives::CodecError;
use msproof_verifier::VerifierError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Hex decode error: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("Payload decode error: {0}")]
    Codec(#[from] CodecError),

    #[error("API error ({status}): {message}")]
    ApiError { status: i64, message: String },

    #[error("Query failed: ({code}) {log}")]
    QueryFailed { code: u32, log: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid query path: {0}")]
    InvalidPath(String),

    #[error("Response is for key {returned}, requested {requested}")]
    KeyMismatch { requested: String, returned: String },

    #[error("Response height {0} has no following header")]
    InvalidHeight(i64),

    #[error("Missing app hash source to verify data from untrusted node")]
    MissingTrustSource,

    #[error("No trusted app hash for height {0}")]
    MissingAppHash(i64),

    #[error("Response for {0} carries no proof")]
    MissingProof(String),

    #[error("Proof verification failed: {0}")]
    Verification(#[from] VerifierError),
}

pub type Result<T> = std::result::Result<T, ClientError>;
