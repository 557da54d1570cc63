//! Query client configuration

use crate::error::{ClientError, Result};
use msproof_primitives::{Codec, HashAlgorithm, Hasher, DEFAULT_MAX_PAYLOAD_LEN};
use msproof_verifier::MultiStoreVerifier;
use serde::{Deserialize, Serialize};

/// Query client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Node RPC URL; a comma-separated list rotates between nodes
    pub node_uri: String,
    /// Height to query at (0 for latest)
    pub height: i64,
    /// Skip proof verification for this node
    pub trust_node: bool,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Hash algorithm the chain commits with
    pub hash_algorithm: HashAlgorithm,
    /// Largest proof payload accepted
    pub max_payload_len: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            node_uri: "http://localhost:26657".to_string(),
            height: 0,
            trust_node: false,
            timeout_secs: 30,
            hash_algorithm: HashAlgorithm::Sha256,
            max_payload_len: DEFAULT_MAX_PAYLOAD_LEN,
        }
    }
}

impl ClientConfig {
    /// Create a config for a local development node, trusted and unverified
    pub fn local() -> Self {
        Self {
            trust_node: true,
            timeout_secs: 5,
            ..Self::default()
        }
    }

    /// Untrusted config for the given node list
    pub fn untrusted(node_uri: impl Into<String>) -> Self {
        Self {
            node_uri: node_uri.into(),
            ..Self::default()
        }
    }

    /// Node URLs, trimmed, without trailing slashes
    pub fn node_uris(&self) -> Result<Vec<String>> {
        let nodes: Vec<String> = self
            .node_uri
            .split(',')
            .map(|uri| uri.trim().trim_end_matches('/').to_string())
            .filter(|uri| !uri.is_empty())
            .collect();
        if nodes.is_empty() {
            return Err(ClientError::InvalidConfig("missing node URIs".to_string()));
        }
        Ok(nodes)
    }

    pub fn hasher(&self) -> Hasher {
        Hasher::new(self.hash_algorithm)
    }

    pub fn codec(&self) -> Codec {
        Codec::new(self.max_payload_len)
    }

    /// Verifier matching this configuration
    pub fn verifier(&self) -> MultiStoreVerifier {
        MultiStoreVerifier::new(self.hasher()).with_codec(self.codec())
    }
}
