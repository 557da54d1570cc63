//! Sources of trusted app hashes
//!
//! The app hash committed at height `H` is carried in the header of block
//! `H + 1`. Implementations return hashes that are already authenticated
//! (e.g. by a header certifier); the client treats them as ground truth.

use crate::error::{ClientError, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::RwLock;

/// Provider of authenticated app hashes keyed by header height
#[async_trait]
pub trait AppHashSource: Send + Sync {
    /// App hash carried in the header at `height`
    async fn app_hash(&self, height: i64) -> Result<Vec<u8>>;
}

/// In-memory table of app hashes, filled by the caller
#[derive(Debug, Default)]
pub struct StaticAppHashes {
    hashes: RwLock<BTreeMap<i64, Vec<u8>>>,
}

impl StaticAppHashes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`StaticAppHashes::insert`]
    pub fn with(self, height: i64, app_hash: Vec<u8>) -> Self {
        self.insert(height, app_hash);
        self
    }

    /// Record the app hash carried in the header at `height`
    pub fn insert(&self, height: i64, app_hash: Vec<u8>) {
        let mut hashes = match self.hashes.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        hashes.insert(height, app_hash);
    }

    pub fn get(&self, height: i64) -> Option<Vec<u8>> {
        let hashes = match self.hashes.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        hashes.get(&height).cloned()
    }

    pub fn len(&self) -> usize {
        match self.hashes.read() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl AppHashSource for StaticAppHashes {
    async fn app_hash(&self, height: i64) -> Result<Vec<u8>> {
        self.get(height).ok_or(ClientError::MissingAppHash(height))
    }
}
