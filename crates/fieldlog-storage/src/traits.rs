//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use async_trait::async_trait;
use bytes::Bytes;
use fieldlog_core::StorageBackend;
use futures::Stream;
use std::pin::Pin;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Stream of object bytes, used for proxying downloads without buffering.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, StorageError>> + Send>>;

/// Storage gateway trait
///
/// The upload pipeline persists images and the ledger document through this
/// interface only. Failures never panic past this boundary; absence surfaces
/// as `StorageError::NotFound` rather than an opaque backend error.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Upload an object under the given key, overwriting any previous version.
    async fn put(&self, key: &str, data: Vec<u8>, content_type: &str) -> StorageResult<()>;

    /// Download an object into memory.
    async fn get(&self, key: &str) -> StorageResult<Vec<u8>>;

    /// Download an object as a stream of chunks (for proxying large files).
    async fn get_stream(&self, key: &str) -> StorageResult<ByteStream>;

    /// Check whether an object exists.
    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// List object keys under a prefix, newest-named first, up to `limit`.
    async fn list(&self, prefix: &str, limit: usize) -> StorageResult<Vec<String>>;

    /// Direct public URL for an object, when the backend is configured for
    /// public access. `None` means callers must proxy the bytes themselves.
    fn public_url(&self, key: &str) -> Option<String>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}

/// Reject keys that could escape the storage root.
pub(crate) fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() || key.contains("..") || key.starts_with('/') {
        return Err(StorageError::InvalidKey(
            "Storage key contains invalid characters".to_string(),
        ));
    }
    Ok(())
}
