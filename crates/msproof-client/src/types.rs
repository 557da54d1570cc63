//! Type definitions for the node RPC and proof bundle files

use crate::error::{ClientError, Result};
use base64::Engine;
use msproof_primitives::{hex_serde, HashAlgorithm, Hasher};
use msproof_verifier::{MultiStoreVerifier, VerifiedValue};
use serde::{Deserialize, Deserializer, Serialize};

/// JSON-RPC 2.0 envelope returned by the node
#[derive(Debug, Clone, Deserialize)]
pub struct RpcResponse<T> {
    #[serde(default)]
    pub jsonrpc: String,
    #[serde(default)]
    pub id: serde_json::Value,
    pub result: Option<T>,
    pub error: Option<RpcError>,
}

/// JSON-RPC error object
#[derive(Debug, Clone, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Option<String>,
}

impl<T> RpcResponse<T> {
    /// Result payload, or the RPC error mapped to a client error
    pub fn into_result(self) -> Result<T> {
        if let Some(error) = self.error {
            let message = match error.data {
                Some(data) if !data.is_empty() => format!("{}: {}", error.message, data),
                _ => error.message,
            };
            return Err(ClientError::ApiError {
                status: error.code,
                message,
            });
        }
        self.result.ok_or_else(|| ClientError::ApiError {
            status: 0,
            message: "response has neither result nor error".to_string(),
        })
    }
}

/// `result` of an `abci_query` call
#[derive(Debug, Clone, Deserialize)]
pub struct AbciQueryResult {
    pub response: AbciQueryResponse,
}

/// ABCI query response as returned by the node
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbciQueryResponse {
    #[serde(default)]
    pub code: u32,

    #[serde(default)]
    pub log: String,

    #[serde(default, with = "b64")]
    pub key: Vec<u8>,

    #[serde(default, with = "b64")]
    pub value: Vec<u8>,

    /// Length-prefixed multi-store proof payload
    #[serde(default, with = "b64")]
    pub proof: Vec<u8>,

    #[serde(default, deserialize_with = "int_or_string")]
    pub height: i64,
}

impl AbciQueryResponse {
    pub fn is_ok(&self) -> bool {
        self.code == 0
    }
}

/// Nullable base64 strings, read as empty bytes when missing
mod b64 {
    use super::*;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(
        value: &[u8],
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&base64::engine::general_purpose::STANDARD.encode(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Vec<u8>, D::Error> {
        let encoded: Option<String> = Option::deserialize(deserializer)?;
        match encoded {
            Some(s) => base64::engine::general_purpose::STANDARD
                .decode(s)
                .map_err(serde::de::Error::custom),
            None => Ok(Vec::new()),
        }
    }
}

// Nodes encode int64 fields as JSON strings.
fn int_or_string<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<i64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IntOrString {
        Int(i64),
        Str(String),
    }

    match IntOrString::deserialize(deserializer)? {
        IntOrString::Int(value) => Ok(value),
        IntOrString::Str(s) if s.is_empty() => Ok(0),
        IntOrString::Str(s) => s.parse().map_err(serde::de::Error::custom),
    }
}

/// Self-contained proof for offline verification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofBundle {
    /// Trusted app hash the proof is checked against
    #[serde(with = "hex_serde::bytes")]
    pub app_hash: Vec<u8>,

    pub store_name: String,

    #[serde(with = "hex_serde::bytes")]
    pub key: Vec<u8>,

    /// Empty for an absence proof
    #[serde(with = "hex_serde::bytes", default)]
    pub value: Vec<u8>,

    pub height: i64,

    /// Base64 of the length-prefixed multi-store proof payload
    pub proof_b64: String,

    #[serde(default)]
    pub hash_algorithm: HashAlgorithm,
}

impl ProofBundle {
    /// Bundle a query response with the app hash that authenticates it
    pub fn from_response(
        store_name: &str,
        response: &AbciQueryResponse,
        app_hash: Vec<u8>,
        hash_algorithm: HashAlgorithm,
    ) -> Self {
        Self {
            app_hash,
            store_name: store_name.to_string(),
            key: response.key.clone(),
            value: response.value.clone(),
            height: response.height,
            proof_b64: base64::engine::general_purpose::STANDARD.encode(&response.proof),
            hash_algorithm,
        }
    }

    /// Decoded proof payload bytes
    pub fn proof_bytes(&self) -> Result<Vec<u8>> {
        Ok(base64::engine::general_purpose::STANDARD.decode(&self.proof_b64)?)
    }

    /// Verify with a verifier configured for the bundle's hash algorithm
    pub fn verify(&self) -> Result<VerifiedValue> {
        self.verify_with(&MultiStoreVerifier::new(Hasher::new(self.hash_algorithm)))
    }

    /// Verify with an explicit verifier
    pub fn verify_with(&self, verifier: &MultiStoreVerifier) -> Result<VerifiedValue> {
        let proof_bytes = self.proof_bytes()?;
        let verified = verifier.verify(
            &proof_bytes,
            &self.store_name,
            &self.key,
            &self.value,
            &self.app_hash,
        )?;
        Ok(verified)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use msproof_primitives::Codec;
    use msproof_store::MemMultiStore;

    const QUERY_JSON: &str = r#"{
        "jsonrpc": "2.0",
        "id": "",
        "result": {
            "response": {
                "code": 0,
                "log": "",
                "key": "YWxpY2U=",
                "value": "MTAw",
                "proof": null,
                "height": "963"
            }
        }
    }"#;

    #[test]
    fn test_parse_abci_query() {
        let rpc: RpcResponse<AbciQueryResult> = serde_json::from_str(QUERY_JSON).unwrap();
        let response = rpc.into_result().unwrap().response;
        assert!(response.is_ok());
        assert_eq!(response.key, b"alice");
        assert_eq!(response.value, b"100");
        assert!(response.proof.is_empty());
        assert_eq!(response.height, 963);
    }

    #[test]
    fn test_parse_numeric_height_and_missing_fields() {
        let json = r#"{"result":{"response":{"code":3,"log":"unknown store","height":12}}}"#;
        let rpc: RpcResponse<AbciQueryResult> = serde_json::from_str(json).unwrap();
        let response = rpc.into_result().unwrap().response;
        assert!(!response.is_ok());
        assert_eq!(response.height, 12);
        assert!(response.value.is_empty());
    }

    #[test]
    fn test_rpc_error_maps_to_api_error() {
        let json = r#"{"jsonrpc":"2.0","id":-1,"error":{"code":-32603,"message":"Internal error","data":"height 10 must be less than or equal to the current blockchain height 5"}}"#;
        let rpc: RpcResponse<AbciQueryResult> = serde_json::from_str(json).unwrap();
        match rpc.into_result() {
            Err(ClientError::ApiError { status, message }) => {
                assert_eq!(status, -32603);
                assert!(message.contains("current blockchain height"));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_bundle_verifies_offline() {
        let mut store = MemMultiStore::new(Hasher::sha256(), 963);
        store.set("acc", "alice", "100");
        store.set("gov", "proposal/1", "passed");
        let proof = store.prove("acc", b"alice").unwrap().encode(&Codec::default()).unwrap();

        let response = AbciQueryResponse {
            key: b"alice".to_vec(),
            value: b"100".to_vec(),
            proof,
            height: 963,
            ..Default::default()
        };
        let bundle =
            ProofBundle::from_response("acc", &response, store.app_hash(), HashAlgorithm::Sha256);

        let json = bundle.to_json_pretty().unwrap();
        let parsed = ProofBundle::from_json(&json).unwrap();
        assert_eq!(parsed, bundle);
        let verified = parsed.verify().unwrap();
        assert_eq!(verified.value, b"100");
    }

    #[test]
    fn test_bundle_rejects_bad_base64() {
        let bundle = ProofBundle {
            app_hash: vec![0; 32],
            store_name: "acc".into(),
            key: b"k".to_vec(),
            value: Vec::new(),
            height: 1,
            proof_b64: "not base64!".into(),
            hash_algorithm: HashAlgorithm::Sha256,
        };
        assert!(matches!(bundle.verify(), Err(ClientError::Base64(_))));
    }
}
