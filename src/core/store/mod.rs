//! Persistence layer for narration delivery.
//!
//! Two storage concerns live here, both behind traits with memory and
//! filesystem implementations:
//!
//! - [`DocumentStore`]: small JSON documents (cache entries, rate-limit
//!   counters) addressed by logical key.
//! - [`BlobStore`]: opaque payloads (synthesized audio, answer text)
//!   addressed by content hash, resolvable to a public URL.

pub mod blob;
pub mod document;

use thiserror::Error;

pub use blob::{ArtifactRef, BlobStore, FsBlobStore, MemoryBlobStore, StoredBlob};
pub use document::{DocumentStore, FsDocumentStore, MemoryDocumentStore};

/// Errors that can occur during store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// I/O error occurred during filesystem operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Backend-specific error.
    #[error("Store backend error: {0}")]
    Backend(String),
}

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
