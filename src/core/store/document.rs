//! Key-value document store backends.
//!
//! Documents are small JSON payloads: narration cache entries and rate-limit
//! counters. Entries never expire on their own; callers overwrite or delete.
//! Concurrent read-modify-write is tolerated, not serialized.

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;
use xxhash_rust::xxh3::xxh3_128;

use super::StoreResult;

/// Trait defining the interface for document store backends.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Retrieves a document by key.
    async fn get(&self, key: &str) -> StoreResult<Option<Bytes>>;

    /// Stores a document, replacing any existing value.
    async fn put(&self, key: &str, value: Bytes) -> StoreResult<()>;

    /// Deletes a document by key.
    async fn delete(&self, key: &str) -> StoreResult<()>;

    /// Returns the backend type as a string identifier.
    fn backend_type(&self) -> &str;
}

/// Memory-based document store.
///
/// Counters and cache entries must survive for the life of the process, so
/// this is a plain map rather than an evicting cache.
#[derive(Default)]
pub struct MemoryDocumentStore {
    documents: RwLock<HashMap<String, Bytes>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, key: &str) -> StoreResult<Option<Bytes>> {
        Ok(self.documents.read().get(key).cloned())
    }

    async fn put(&self, key: &str, value: Bytes) -> StoreResult<()> {
        self.documents.write().insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        self.documents.write().remove(key);
        Ok(())
    }

    fn backend_type(&self) -> &str {
        "memory"
    }
}

/// Filesystem-based document store.
///
/// Keys are hashed to fixed-width file names and sharded into two-hex-char
/// directories to keep listings small. Writes go through a temp file and a
/// rename so readers never observe a partial document.
pub struct FsDocumentStore {
    base_path: PathBuf,
}

impl FsDocumentStore {
    pub async fn new(base_path: PathBuf) -> StoreResult<Self> {
        fs::create_dir_all(&base_path).await?;
        Ok(Self { base_path })
    }

    fn document_path(&self, key: &str) -> PathBuf {
        let hash = format!("{:032x}", xxh3_128(key.as_bytes()));
        let dir = &hash[0..2];
        self.base_path.join(dir).join(format!("{hash}.json"))
    }
}

#[async_trait]
impl DocumentStore for FsDocumentStore {
    async fn get(&self, key: &str) -> StoreResult<Option<Bytes>> {
        let path = self.document_path(key);
        match fs::read(&path).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn put(&self, key: &str, value: Bytes) -> StoreResult<()> {
        let path = self.document_path(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // Atomic write using temp file
        let temp_path = path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(&value).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&temp_path, &path).await?;

        debug!("Stored document: {} ({} bytes)", key, value.len());
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        let path = self.document_path(key);
        let _ = fs::remove_file(&path).await;
        Ok(())
    }

    fn backend_type(&self) -> &str {
        "filesystem"
    }
}
