//! Content-addressed blob storage for narration payloads.
//!
//! Blobs are immutable once written: the artifact id is the xxh3 hash of the
//! payload, so identical payloads share storage and re-writes are idempotent.
//! Each blob carries a small metadata sidecar with its content type so it can
//! be served back without guessing.

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;
use xxhash_rust::xxh3::xxh3_128;

use super::StoreResult;

/// Opaque handle to a stored payload.
///
/// The id is a 32-hex-char content hash; it is stable across processes and
/// safe to embed in URLs and cache entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactRef(String);

impl ArtifactRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Computes the artifact id for a payload.
    pub fn for_payload(bytes: &[u8]) -> Self {
        Self(format!("{:032x}", xxh3_128(bytes)))
    }

    pub fn id(&self) -> &str {
        &self.0
    }

    /// Ids are lowercase hex only; anything else could walk the filesystem.
    pub fn is_well_formed(&self) -> bool {
        self.0.len() == 32 && self.0.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    }
}

impl fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A stored payload with its content type.
#[derive(Debug, Clone)]
pub struct StoredBlob {
    pub bytes: Bytes,
    pub content_type: String,
}

/// Trait defining the interface for blob store backends.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores a payload and returns its artifact reference.
    async fn store(&self, bytes: Bytes, content_type: &str) -> StoreResult<ArtifactRef>;

    /// Reads a payload back by reference.
    async fn read(&self, artifact: &ArtifactRef) -> StoreResult<Option<StoredBlob>>;

    /// Resolves an artifact reference to a URL the player can stream.
    fn resolve_url(&self, artifact: &ArtifactRef) -> String;

    /// Returns the backend type as a string identifier.
    fn backend_type(&self) -> &str;
}

fn artifact_url(public_base_url: &str, artifact: &ArtifactRef) -> String {
    format!(
        "{}/api/artifacts/{}",
        public_base_url.trim_end_matches('/'),
        artifact.id()
    )
}

/// Memory-based blob store for tests and single-process runs.
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<String, StoredBlob>>,
    public_base_url: String,
}

impl MemoryBlobStore {
    pub fn new(public_base_url: impl Into<String>) -> Self {
        Self {
            blobs: RwLock::new(HashMap::new()),
            public_base_url: public_base_url.into(),
        }
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn store(&self, bytes: Bytes, content_type: &str) -> StoreResult<ArtifactRef> {
        let artifact = ArtifactRef::for_payload(&bytes);
        self.blobs.write().insert(
            artifact.id().to_string(),
            StoredBlob {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(artifact)
    }

    async fn read(&self, artifact: &ArtifactRef) -> StoreResult<Option<StoredBlob>> {
        Ok(self.blobs.read().get(artifact.id()).cloned())
    }

    fn resolve_url(&self, artifact: &ArtifactRef) -> String {
        artifact_url(&self.public_base_url, artifact)
    }

    fn backend_type(&self) -> &str {
        "memory"
    }
}

/// Metadata sidecar for filesystem blobs.
#[derive(Serialize, Deserialize)]
struct BlobMeta {
    content_type: String,
    size: usize,
    created_at: u64,
}

/// Filesystem-based blob store.
///
/// Layout mirrors the document store: two-hex-char shard directories, atomic
/// temp-file writes, and a `.meta` JSON sidecar per blob.
pub struct FsBlobStore {
    base_path: PathBuf,
    public_base_url: String,
}

impl FsBlobStore {
    pub async fn new(base_path: PathBuf, public_base_url: impl Into<String>) -> StoreResult<Self> {
        fs::create_dir_all(&base_path).await?;
        Ok(Self {
            base_path,
            public_base_url: public_base_url.into(),
        })
    }

    fn blob_path(&self, artifact: &ArtifactRef) -> PathBuf {
        let id = artifact.id();
        let dir = &id[0..2];
        self.base_path.join(dir).join(id)
    }

    fn meta_path(&self, artifact: &ArtifactRef) -> PathBuf {
        let mut path = self.blob_path(artifact);
        path.set_extension("meta");
        path
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn store(&self, bytes: Bytes, content_type: &str) -> StoreResult<ArtifactRef> {
        let artifact = ArtifactRef::for_payload(&bytes);
        let blob_path = self.blob_path(&artifact);
        let meta_path = self.meta_path(&artifact);

        if let Some(parent) = blob_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // Atomic write using temp file
        let temp_path = blob_path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(&bytes).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&temp_path, &blob_path).await?;

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_secs());

        let meta = BlobMeta {
            content_type: content_type.to_string(),
            size: bytes.len(),
            created_at: now,
        };

        let meta_json = serde_json::to_vec(&meta)?;
        let temp_meta_path = meta_path.with_extension("meta.tmp");
        let mut meta_file = fs::File::create(&temp_meta_path).await?;
        meta_file.write_all(&meta_json).await?;
        meta_file.sync_all().await?;
        drop(meta_file);

        fs::rename(&temp_meta_path, &meta_path).await?;

        debug!(
            "Stored blob {} ({} bytes, {})",
            artifact,
            bytes.len(),
            content_type
        );
        Ok(artifact)
    }

    async fn read(&self, artifact: &ArtifactRef) -> StoreResult<Option<StoredBlob>> {
        if !artifact.is_well_formed() {
            return Ok(None);
        }

        let meta_data = match fs::read(self.meta_path(artifact)).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let meta: BlobMeta = serde_json::from_slice(&meta_data)?;

        match fs::read(self.blob_path(artifact)).await {
            Ok(data) => Ok(Some(StoredBlob {
                bytes: Bytes::from(data),
                content_type: meta.content_type,
            })),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn resolve_url(&self, artifact: &ArtifactRef) -> String {
        artifact_url(&self.public_base_url, artifact)
    }

    fn backend_type(&self) -> &str {
        "filesystem"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_memory_blob_round_trip() {
        let store = MemoryBlobStore::new("http://localhost:3001");

        let artifact = store
            .store(Bytes::from_static(b"audio-bytes"), "audio/mpeg")
            .await
            .unwrap();

        let blob = store.read(&artifact).await.unwrap().unwrap();
        assert_eq!(blob.bytes, Bytes::from_static(b"audio-bytes"));
        assert_eq!(blob.content_type, "audio/mpeg");
    }

    #[tokio::test]
    async fn test_identical_payloads_share_an_artifact() {
        let store = MemoryBlobStore::new("http://localhost:3001");

        let a = store
            .store(Bytes::from_static(b"same"), "audio/mpeg")
            .await
            .unwrap();
        let b = store
            .store(Bytes::from_static(b"same"), "audio/mpeg")
            .await
            .unwrap();

        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_resolve_url_shape() {
        let store = MemoryBlobStore::new("http://atlas.example.com/");
        let artifact = ArtifactRef::new("0123456789abcdef0123456789abcdef");

        assert_eq!(
            store.resolve_url(&artifact),
            "http://atlas.example.com/api/artifacts/0123456789abcdef0123456789abcdef"
        );
    }

    #[tokio::test]
    async fn test_fs_blob_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let store = FsBlobStore::new(temp_dir.path().to_path_buf(), "http://localhost:3001")
            .await
            .unwrap();

        let artifact = store
            .store(Bytes::from_static(b"narration audio"), "audio/mpeg")
            .await
            .unwrap();
        assert!(artifact.is_well_formed());

        let blob = store.read(&artifact).await.unwrap().unwrap();
        assert_eq!(blob.bytes, Bytes::from_static(b"narration audio"));
        assert_eq!(blob.content_type, "audio/mpeg");
    }

    #[tokio::test]
    async fn test_fs_blob_unknown_artifact() {
        let temp_dir = TempDir::new().unwrap();
        let store = FsBlobStore::new(temp_dir.path().to_path_buf(), "http://localhost:3001")
            .await
            .unwrap();

        let missing = ArtifactRef::new("ffffffffffffffffffffffffffffffff");
        assert!(store.read(&missing).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_fs_blob_rejects_malformed_ids() {
        let temp_dir = TempDir::new().unwrap();
        let store = FsBlobStore::new(temp_dir.path().to_path_buf(), "http://localhost:3001")
            .await
            .unwrap();

        let traversal = ArtifactRef::new("../../etc/passwd");
        assert!(store.read(&traversal).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_fs_blob_persists_across_reopen() {
        let temp_dir = TempDir::new().unwrap();

        let artifact = {
            let store =
                FsBlobStore::new(temp_dir.path().to_path_buf(), "http://localhost:3001")
                    .await
                    .unwrap();
            store
                .store(Bytes::from_static(b"seeded narration"), "audio/mpeg")
                .await
                .unwrap()
        };

        let reopened = FsBlobStore::new(temp_dir.path().to_path_buf(), "http://localhost:3001")
            .await
            .unwrap();
        let blob = reopened.read(&artifact).await.unwrap().unwrap();
        assert_eq!(blob.bytes, Bytes::from_static(b"seeded narration"));
    }
}
