use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use async_trait::async_trait;
use cask_core::StorageBackend;
use tokio::fs;
use tokio::io::{AsyncRead, AsyncWriteExt};

use crate::traits::{metadata_key, validate_key, BlobStore, Metadata, StorageError, StorageResult};

/// Local filesystem bucket
///
/// Objects are plain files under `base_path`; user metadata lives in a
/// JSON sidecar next to each object.
#[derive(Clone)]
pub struct LocalBucket {
    bucket: String,
    base_path: PathBuf,
    base_url: String,
}

impl LocalBucket {
    /// Create a new LocalBucket instance
    ///
    /// # Arguments
    /// * `bucket` - Logical bucket name (used in logs and error messages)
    /// * `base_path` - Root directory for object storage
    /// * `base_url` - Base URL for serving objects (e.g., "http://localhost:3000/media")
    pub async fn new(
        bucket: impl Into<String>,
        base_path: impl Into<PathBuf>,
        base_url: String,
    ) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalBucket {
            bucket: bucket.into(),
            base_path,
            base_url,
        })
    }

    /// Convert a storage key to a filesystem path. `validate_key` has
    /// already rejected traversal sequences.
    fn key_to_path(&self, key: &str) -> StorageResult<PathBuf> {
        validate_key(key)?;
        Ok(self.base_path.join(key))
    }

    fn generate_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), key)
    }

    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    async fn write_file(&self, path: &Path, data: &[u8]) -> StorageResult<()> {
        self.ensure_parent_dir(path).await?;

        let mut file = fs::File::create(path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        file.write_all(data).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to write file {}: {}", path.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        Ok(())
    }
}

#[async_trait]
impl BlobStore for LocalBucket {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn verify_bucket(&self) -> StorageResult<()> {
        let is_dir = fs::metadata(&self.base_path)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);
        if !is_dir {
            return Err(StorageError::ConfigError(format!(
                "Bucket '{}' directory {} does not exist",
                self.bucket,
                self.base_path.display()
            )));
        }
        Ok(())
    }

    async fn put(
        &self,
        key: &str,
        data: Vec<u8>,
        _content_type: &str,
        metadata: &Metadata,
    ) -> StorageResult<String> {
        let path = self.key_to_path(key)?;
        let size = data.len();
        let start = std::time::Instant::now();

        self.write_file(&path, &data).await?;

        if !metadata.is_empty() {
            self.set_metadata(key, metadata).await?;
        }

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local upload successful"
        );

        Ok(self.generate_url(key))
    }

    async fn put_stream(
        &self,
        key: &str,
        mut reader: Pin<Box<dyn AsyncRead + Send + Unpin>>,
        _content_length: Option<u64>,
        _content_type: &str,
        metadata: &Metadata,
    ) -> StorageResult<String> {
        let path = self.key_to_path(key)?;
        let start = std::time::Instant::now();

        self.ensure_parent_dir(&path).await?;

        let mut file = fs::File::create(&path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        let bytes_copied = tokio::io::copy(&mut reader, &mut file).await.map_err(|e| {
            StorageError::UploadFailed(format!(
                "Failed to write stream to file {}: {}",
                path.display(),
                e
            ))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        if !metadata.is_empty() {
            self.set_metadata(key, metadata).await?;
        }

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            size_bytes = bytes_copied,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local stream upload successful"
        );

        Ok(self.generate_url(key))
    }

    async fn get(&self, key: &str) -> StorageResult<Vec<u8>> {
        let path = self.key_to_path(key)?;
        let start = std::time::Instant::now();

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(key.to_string()));
        }

        let data = fs::read(&path).await.map_err(|e| {
            StorageError::DownloadFailed(format!("Failed to read file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local download successful"
        );

        Ok(data)
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        let path = self.key_to_path(key)?;

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(());
        }

        fs::remove_file(&path).await.map_err(|e| {
            StorageError::DeleteFailed(format!("Failed to delete file {}: {}", path.display(), e))
        })?;

        let sidecar = self.base_path.join(metadata_key(key));
        if fs::try_exists(&sidecar).await.unwrap_or(false) {
            fs::remove_file(&sidecar).await.map_err(|e| {
                StorageError::DeleteFailed(format!(
                    "Failed to delete metadata sidecar {}: {}",
                    sidecar.display(),
                    e
                ))
            })?;
        }

        tracing::info!(bucket = %self.bucket, key = %key, "Local delete successful");

        Ok(())
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        let path = self.key_to_path(key)?;
        Ok(fs::try_exists(&path).await.unwrap_or(false))
    }

    async fn metadata(&self, key: &str) -> StorageResult<Metadata> {
        validate_key(key)?;
        let sidecar = self.base_path.join(metadata_key(key));

        if !fs::try_exists(&sidecar).await.unwrap_or(false) {
            return Ok(HashMap::new());
        }

        let data = fs::read(&sidecar).await.map_err(|e| {
            StorageError::BackendError(format!(
                "Failed to read metadata sidecar {}: {}",
                sidecar.display(),
                e
            ))
        })?;

        serde_json::from_slice(&data)
            .map_err(|e| StorageError::BackendError(format!("Corrupt metadata sidecar: {}", e)))
    }

    async fn set_metadata(&self, key: &str, metadata: &Metadata) -> StorageResult<()> {
        validate_key(key)?;
        let sidecar = self.base_path.join(metadata_key(key));
        let encoded = serde_json::to_vec(metadata)
            .map_err(|e| StorageError::BackendError(format!("Failed to encode metadata: {}", e)))?;

        self.write_file(&sidecar, &encoded).await
    }

    fn public_url(&self, key: &str) -> String {
        self.generate_url(key)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
