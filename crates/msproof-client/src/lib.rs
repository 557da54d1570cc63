//! msproof Client
//!
//! Light-client queries against a node's `abci_query` endpoint. Values from
//! untrusted nodes are only returned after their multi-store proof checks
//! out against a trusted app hash.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use msproof_client::{ClientConfig, QueryClient, StaticAppHashes};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // App hash for height H, as carried by the certified header H+1
//!     let trusted = StaticAppHashes::new().with(964, vec![0u8; 32]);
//!
//!     let client = QueryClient::try_new(ClientConfig::untrusted("http://localhost:26657"))?
//!         .with_app_hash_source(Arc::new(trusted));
//!
//!     let balance = client.query_store(b"alice", "acc").await?;
//!     println!("balance: {:?}", balance);
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod error;
pub mod path;
mod trust;
mod types;

pub use client::{app_hash_height, decode_subspace, QueryClient};
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use path::{is_query_store_with_proof, require_proof};
pub use trust::{AppHashSource, StaticAppHashes};
pub use types::*;
