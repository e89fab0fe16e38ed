//! Storage abstraction trait
//!
//! This module defines the BlobStore trait that all storage backends must
//! implement.

use std::collections::HashMap;
use std::pin::Pin;

use async_trait::async_trait;
use cask_core::StorageBackend;
use thiserror::Error;
use tokio::io::AsyncRead;

/// User metadata attached to a stored object.
pub type Metadata = HashMap<String, String>;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

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

impl From<StorageError> for cask_core::Error {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(key) => cask_core::Error::NotFound(key),
            StorageError::ConfigError(msg) => cask_core::Error::Config(msg),
            StorageError::InvalidKey(msg) => cask_core::Error::Validation(msg),
            other => cask_core::Error::Transport(other.to_string()),
        }
    }
}

/// Reject keys that could escape the bucket namespace.
pub(crate) fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() || key.contains("..") || key.starts_with('/') {
        return Err(StorageError::InvalidKey(format!(
            "Storage key '{}' contains invalid characters",
            key
        )));
    }
    Ok(())
}

/// Sidecar object key holding user metadata for `key`.
pub(crate) fn metadata_key(key: &str) -> String {
    format!("{}.meta.json", key)
}

/// Storage abstraction trait
///
/// All storage backends (object_store-backed buckets, local filesystem)
/// implement this trait so the bucket client can work against any backend
/// without coupling to a concrete SDK.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Name of the bucket this store is bound to.
    fn bucket(&self) -> &str;

    /// Check that the bucket exists and is reachable.
    async fn verify_bucket(&self) -> StorageResult<()>;

    /// Upload an object, overwriting any existing object at `key`.
    /// Returns the public URL of the stored object.
    async fn put(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
        metadata: &Metadata,
    ) -> StorageResult<String>;

    /// Upload an object from an async reader, consumed until EOF.
    ///
    /// Backends drain the reader in fixed-size chunks; callers that need
    /// byte-level progress wrap the reader and observe consumption.
    async fn put_stream(
        &self,
        key: &str,
        reader: Pin<Box<dyn AsyncRead + Send + Unpin>>,
        content_length: Option<u64>,
        content_type: &str,
        metadata: &Metadata,
    ) -> StorageResult<String>;

    /// Download the whole object at `key`.
    async fn get(&self, key: &str) -> StorageResult<Vec<u8>>;

    /// Delete the object at `key` (and its metadata sidecar, if any).
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Check if an object exists.
    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Fetch user metadata for `key`. Objects without stored metadata
    /// yield an empty map.
    async fn metadata(&self, key: &str) -> StorageResult<Metadata>;

    /// Replace the stored user metadata for `key`.
    async fn set_metadata(&self, key: &str, metadata: &Metadata) -> StorageResult<()>;

    /// Derive the public URL for an object path.
    fn public_url(&self, key: &str) -> String;

    /// Get the storage backend type.
    fn backend_type(&self) -> StorageBackend;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_validation() {
        assert!(validate_key("media/photo.png").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("../escape").is_err());
        assert!(validate_key("/absolute").is_err());
    }

    #[test]
    fn sidecar_key_format() {
        assert_eq!(metadata_key("media/photo.png"), "media/photo.png.meta.json");
    }

    #[test]
    fn storage_error_maps_into_core_error() {
        let err: cask_core::Error = StorageError::NotFound("media/a.png".into()).into();
        assert!(matches!(err, cask_core::Error::NotFound(_)));

        let err: cask_core::Error = StorageError::UploadFailed("boom".into()).into();
        assert!(matches!(err, cask_core::Error::Transport(_)));

        let err: cask_core::Error = StorageError::InvalidKey("bad".into()).into();
        assert!(matches!(err, cask_core::Error::Validation(_)));
    }
}
