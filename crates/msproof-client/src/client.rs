//! Node query client with light-client proof verification

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use msproof_primitives::Codec;
use msproof_store::KvPair;
use msproof_verifier::MultiStoreVerifier;

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::path::{is_query_store_with_proof, store_name, store_query_path};
use crate::trust::AppHashSource;
use crate::types::{AbciQueryResponse, AbciQueryResult, RpcResponse};

/// HTTP client for a node's `abci_query` endpoint
///
/// Responses from untrusted nodes to proof-carrying paths are verified
/// against app hashes from the configured [`AppHashSource`] before their
/// value is returned.
pub struct QueryClient {
    http: reqwest::Client,
    nodes: Vec<String>,
    next_node: AtomicUsize,
    config: ClientConfig,
    verifier: MultiStoreVerifier,
    app_hashes: Option<Arc<dyn AppHashSource>>,
}

impl QueryClient {
    /// Create a new query client
    pub fn try_new(config: ClientConfig) -> Result<Self> {
        let nodes = config.node_uris()?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            nodes,
            next_node: AtomicUsize::new(0),
            verifier: config.verifier(),
            config,
            app_hashes: None,
        })
    }

    /// Attach the source of trusted app hashes
    pub fn with_app_hash_source(mut self, source: Arc<dyn AppHashSource>) -> Self {
        self.app_hashes = Some(source);
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn codec(&self) -> Codec {
        self.config.codec()
    }

    /// Round-robin over the configured nodes
    fn node(&self) -> &str {
        let index = self.next_node.fetch_add(1, Ordering::Relaxed) % self.nodes.len();
        &self.nodes[index]
    }

    /// Raw `abci_query` round-trip, without verification
    pub async fn abci_query(&self, path: &str, data: &[u8]) -> Result<AbciQueryResponse> {
        let url = format!("{}/abci_query", self.node());
        let params = [
            ("path", format!("\"{}\"", path)),
            ("data", format!("0x{}", hex::encode(data))),
            ("height", self.config.height.to_string()),
            ("prove", (!self.config.trust_node).to_string()),
        ];
        debug!(url = %url, path, height = self.config.height, "abci query");

        let response = self.http.get(&url).query(&params).send().await?;

        let status = response.status();
        if status.is_success() {
            let rpc: RpcResponse<AbciQueryResult> = response.json().await?;
            Ok(rpc.into_result()?.response)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(ClientError::ApiError {
                status: i64::from(status.as_u16()),
                message: body,
            })
        }
    }

    /// Query a path with no data
    pub async fn query(&self, path: &str) -> Result<Vec<u8>> {
        self.query_with_data(path, &[]).await
    }

    /// Query `key` in `store`; the value is verified unless the node is trusted
    pub async fn query_store(&self, key: &[u8], store: &str) -> Result<Vec<u8>> {
        self.query_with_data(&store_query_path(store, "key"), key).await
    }

    /// All pairs under `prefix` in `store`; subspace results carry no proof
    pub async fn query_subspace(&self, prefix: &[u8], store: &str) -> Result<Vec<KvPair>> {
        let raw = self
            .query_with_data(&store_query_path(store, "subspace"), prefix)
            .await?;
        decode_subspace(&self.codec(), &raw)
    }

    async fn query_with_data(&self, path: &str, data: &[u8]) -> Result<Vec<u8>> {
        let response = self.abci_query(path, data).await?;
        self.verify_response(path, data, response).await
    }

    /// Accept or reject the response to a query of `data` at `path`,
    /// returning its value
    pub async fn verify_response(
        &self,
        path: &str,
        data: &[u8],
        response: AbciQueryResponse,
    ) -> Result<Vec<u8>> {
        if !response.is_ok() {
            return Err(ClientError::QueryFailed {
                code: response.code,
                log: response.log,
            });
        }

        if self.config.trust_node || !is_query_store_with_proof(path) {
            debug!(path, trusted = self.config.trust_node, "returning unverified value");
            return Ok(response.value);
        }

        let source = self.app_hashes.as_ref().ok_or(ClientError::MissingTrustSource)?;
        let store = store_name(path).ok_or_else(|| ClientError::InvalidPath(path.to_string()))?;
        if response.proof.is_empty() {
            return Err(ClientError::MissingProof(path.to_string()));
        }
        if response.key != data {
            warn!(path, "response key differs from requested key");
            return Err(ClientError::KeyMismatch {
                requested: hex::encode(data),
                returned: hex::encode(&response.key),
            });
        }

        let app_hash = source.app_hash(app_hash_height(response.height)?).await?;

        match self
            .verifier
            .verify(&response.proof, store, data, &response.value, &app_hash)
        {
            Ok(verified) => {
                debug!(
                    path,
                    height = verified.height,
                    absent = verified.is_absence(),
                    "query verified"
                );
                Ok(response.value)
            }
            Err(e) => {
                warn!(path, height = response.height, error = %e, "query response rejected");
                Err(e.into())
            }
        }
    }
}

/// Height of the header carrying the app hash for state at `height`
pub fn app_hash_height(height: i64) -> Result<i64> {
    height.checked_add(1).ok_or(ClientError::InvalidHeight(height))
}

/// Decode a subspace query result
pub fn decode_subspace(codec: &Codec, raw: &[u8]) -> Result<Vec<KvPair>> {
    if raw.is_empty() {
        return Ok(Vec::new());
    }
    Ok(codec.decode_length_prefixed(raw)?)
}
