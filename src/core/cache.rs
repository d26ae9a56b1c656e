//! Narration cache: the index from content keys to stored artifacts.
//!
//! The persistent side is a [`DocumentStore`] holding one JSON entry per
//! narration key. A moka layer sits in front of it because the UI polls
//! lookups aggressively while deciding what it can play; entries are
//! immutable once written, so the hot layer can never serve stale data.

use bytes::Bytes;
use moka::future::Cache as MokaCache;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

use super::store::{ArtifactRef, DocumentStore, StoreResult};
use super::tier::Tier;

/// A cached narration: which artifact answers a given content key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    pub tier: Tier,
    pub artifact: ArtifactRef,
    pub content_type: String,
    pub size: usize,
    pub created_at: u64,
}

impl CacheEntry {
    pub fn new(
        key: impl Into<String>,
        tier: Tier,
        artifact: ArtifactRef,
        content_type: impl Into<String>,
        size: usize,
    ) -> Self {
        let created_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_secs());
        Self {
            key: key.into(),
            tier,
            artifact,
            content_type: content_type.into(),
            size,
            created_at,
        }
    }
}

/// Cache index with a read-through in-memory layer.
pub struct NarrationCache {
    store: Arc<dyn DocumentStore>,
    hot: MokaCache<String, Arc<CacheEntry>>,
}

impl NarrationCache {
    pub fn new(store: Arc<dyn DocumentStore>, hot_capacity: u64) -> Self {
        Self {
            store,
            hot: MokaCache::new(hot_capacity),
        }
    }

    fn document_key(key: &str) -> String {
        format!("narration:{key}")
    }

    /// Looks up a cache entry by narration key.
    pub async fn lookup(&self, key: &str) -> StoreResult<Option<CacheEntry>> {
        if let Some(entry) = self.hot.get(key).await {
            debug!("Narration cache hit (hot): {}", key);
            return Ok(Some((*entry).clone()));
        }

        let Some(raw) = self.store.get(&Self::document_key(key)).await? else {
            debug!("Narration cache miss: {}", key);
            return Ok(None);
        };

        let entry: CacheEntry = serde_json::from_slice(&raw)?;
        self.hot
            .insert(key.to_string(), Arc::new(entry.clone()))
            .await;
        debug!("Narration cache hit (store): {}", key);
        Ok(Some(entry))
    }

    /// Writes a cache entry through to the document store.
    pub async fn insert(&self, entry: CacheEntry) -> StoreResult<()> {
        let raw = serde_json::to_vec(&entry)?;
        self.store
            .put(&Self::document_key(&entry.key), Bytes::from(raw))
            .await?;
        self.hot
            .insert(entry.key.clone(), Arc::new(entry))
            .await;
        Ok(())
    }
}
