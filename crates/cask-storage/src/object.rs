use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use cask_core::StorageBackend;
use object_store::aws::AmazonS3Builder;
use object_store::memory::InMemory;
use object_store::path::Path;
use object_store::Error as ObjectStoreError;
use object_store::{
    ClientOptions, ObjectStore, ObjectStoreExt, PutPayload, Result as ObjectResult,
};
use tokio::io::AsyncRead;

use crate::traits::{metadata_key, validate_key, BlobStore, Metadata, StorageError, StorageResult};

const STREAM_CHUNK_SIZE: usize = 8192;

/// Bucket backed by any `object_store` implementation.
///
/// Production use wraps AWS S3 (or an S3-compatible endpoint); tests wrap
/// the in-memory store. URL derivation follows the backend: virtual-hosted
/// AWS URLs, path-style URLs for custom endpoints, `memory://` for the
/// in-memory store.
#[derive(Clone)]
pub struct ObjectBucket {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    region: Option<String>,
    endpoint_url: Option<String>, // Custom endpoint for S3-compatible providers
    backend: StorageBackend,
}

impl ObjectBucket {
    /// Create a bucket handle backed by AWS S3.
    ///
    /// # Arguments
    /// * `bucket` - S3 bucket name
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible
    ///   providers (e.g., "http://localhost:9000" for MinIO)
    /// * `request_timeout` - Fixed per-request timeout applied to every
    ///   storage call made through this handle
    pub fn s3(
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
        request_timeout: Duration,
    ) -> StorageResult<Self> {
        let client_options = ClientOptions::default().with_timeout(request_timeout);

        let mut builder = AmazonS3Builder::from_env()
            .with_region(region.clone())
            .with_bucket_name(bucket.clone())
            .with_client_options(client_options);

        if let Some(ref endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(ObjectBucket {
            store: Arc::new(store),
            bucket,
            region: Some(region),
            endpoint_url,
            backend: StorageBackend::S3,
        })
    }

    /// Create a bucket handle backed by an in-process store. Objects live
    /// for the lifetime of the handle; used by tests.
    pub fn in_memory(bucket: impl Into<String>) -> Self {
        ObjectBucket {
            store: Arc::new(InMemory::new()),
            bucket: bucket.into(),
            region: None,
            endpoint_url: None,
            backend: StorageBackend::Memory,
        }
    }

    fn generate_url(&self, key: &str) -> String {
        if let Some(ref endpoint) = self.endpoint_url {
            // Path-style for S3-compatible providers: {endpoint}/{bucket}/{key}
            let base_url = endpoint.trim_end_matches('/');
            format!("{}/{}/{}", base_url, self.bucket, key)
        } else if self.backend == StorageBackend::Memory {
            format!("memory://{}/{}", self.bucket, key)
        } else {
            // Standard AWS S3 URL format
            format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                self.bucket,
                self.region.as_deref().unwrap_or("us-east-1"),
                key
            )
        }
    }

    async fn put_object(&self, key: &str, data: Vec<u8>) -> StorageResult<()> {
        let size = data.len() as u64;
        let location = Path::from(key.to_string());
        let start = std::time::Instant::now();

        let result: ObjectResult<_> = self
            .store
            .put(&location, PutPayload::from(Bytes::from(data)))
            .await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %key,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Object upload failed"
            );
            StorageError::UploadFailed(e.to_string())
        })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Object upload successful"
        );

        Ok(())
    }
}

#[async_trait]
impl BlobStore for ObjectBucket {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn verify_bucket(&self) -> StorageResult<()> {
        // Listing the bucket root both checks existence and reachability.
        self.store.list_with_delimiter(None).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Bucket '{}' is not accessible: {}",
                self.bucket, e
            ))
        })?;
        Ok(())
    }

    async fn put(
        &self,
        key: &str,
        data: Vec<u8>,
        _content_type: &str,
        metadata: &Metadata,
    ) -> StorageResult<String> {
        validate_key(key)?;
        self.put_object(key, data).await?;

        if !metadata.is_empty() {
            self.set_metadata(key, metadata).await?;
        }

        Ok(self.generate_url(key))
    }

    async fn put_stream(
        &self,
        key: &str,
        mut reader: Pin<Box<dyn AsyncRead + Send + Unpin>>,
        _content_length: Option<u64>,
        content_type: &str,
        metadata: &Metadata,
    ) -> StorageResult<String> {
        validate_key(key)?;

        // Drain the reader in fixed-size chunks and upload in a single put.
        // The chunked read is the seam progress observers hook into.
        let mut buffer = Vec::new();
        let mut temp_buf = vec![0u8; STREAM_CHUNK_SIZE];

        loop {
            let bytes_read = tokio::io::AsyncReadExt::read(&mut reader, &mut temp_buf)
                .await
                .map_err(|e| {
                    StorageError::UploadFailed(format!("Failed to read from stream: {}", e))
                })?;

            if bytes_read == 0 {
                break;
            }

            buffer.extend_from_slice(&temp_buf[..bytes_read]);
        }

        self.put(key, buffer, content_type, metadata).await
    }

    async fn get(&self, key: &str) -> StorageResult<Vec<u8>> {
        validate_key(key)?;
        let start = std::time::Instant::now();
        let location = Path::from(key.to_string());

        let result: ObjectResult<_> = self.store.get(&location).await;

        let result = result.map_err(|e| match e {
            ObjectStoreError::NotFound { .. } => StorageError::NotFound(key.to_string()),
            other => {
                tracing::error!(
                    error = %other,
                    bucket = %self.bucket,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Object download failed"
                );
                StorageError::DownloadFailed(other.to_string())
            }
        })?;

        let bytes = result
            .bytes()
            .await
            .map_err(|e| StorageError::DownloadFailed(e.to_string()))?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            size_bytes = bytes.len() as u64,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Object download successful"
        );

        Ok(bytes.to_vec())
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        validate_key(key)?;
        let start = std::time::Instant::now();
        let location = Path::from(key.to_string());

        let result: ObjectResult<_> = self.store.delete(&location).await;

        result.map_err(|e| match e {
            ObjectStoreError::NotFound { .. } => StorageError::NotFound(key.to_string()),
            other => {
                tracing::error!(
                    error = %other,
                    bucket = %self.bucket,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Object delete failed"
                );
                StorageError::DeleteFailed(other.to_string())
            }
        })?;

        // Remove the metadata sidecar; absence is fine.
        let sidecar = Path::from(metadata_key(key));
        match self.store.delete(&sidecar).await {
            Ok(_) | Err(ObjectStoreError::NotFound { .. }) => {}
            Err(e) => return Err(StorageError::DeleteFailed(e.to_string())),
        }

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Object delete successful"
        );

        Ok(())
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        validate_key(key)?;
        let location = Path::from(key.to_string());
        match self.store.head(&location).await {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }

    async fn metadata(&self, key: &str) -> StorageResult<Metadata> {
        validate_key(key)?;
        let sidecar = Path::from(metadata_key(key));

        let result = match self.store.get(&sidecar).await {
            Ok(result) => result,
            Err(ObjectStoreError::NotFound { .. }) => return Ok(HashMap::new()),
            Err(e) => return Err(StorageError::BackendError(e.to_string())),
        };

        let bytes = result
            .bytes()
            .await
            .map_err(|e| StorageError::BackendError(e.to_string()))?;

        serde_json::from_slice(&bytes)
            .map_err(|e| StorageError::BackendError(format!("Corrupt metadata sidecar: {}", e)))
    }

    async fn set_metadata(&self, key: &str, metadata: &Metadata) -> StorageResult<()> {
        validate_key(key)?;
        let sidecar = Path::from(metadata_key(key));
        let encoded = serde_json::to_vec(metadata)
            .map_err(|e| StorageError::BackendError(format!("Failed to encode metadata: {}", e)))?;

        self.store
            .put(&sidecar, PutPayload::from(Bytes::from(encoded)))
            .await
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?;

        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        self.generate_url(key)
    }

    fn backend_type(&self) -> StorageBackend {
        self.backend
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_roundtrip() {
        let bucket = ObjectBucket::in_memory("test-bucket");
        let data = b"object payload".to_vec();

        let url = bucket
            .put("media/test.bin", data.clone(), "application/octet-stream", &HashMap::new())
            .await
            .unwrap();
        assert_eq!(url, "memory://test-bucket/media/test.bin");

        let downloaded = bucket.get("media/test.bin").await.unwrap();
        assert_eq!(downloaded, data);
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let bucket = ObjectBucket::in_memory("test-bucket");
        let result = bucket.get("media/missing.bin").await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_removes_object_and_sidecar() {
        let bucket = ObjectBucket::in_memory("test-bucket");
        let mut meta = HashMap::new();
        meta.insert("owner".to_string(), "alice".to_string());

        bucket
            .put("media/doomed.bin", b"x".to_vec(), "application/octet-stream", &meta)
            .await
            .unwrap();
        assert!(bucket.exists("media/doomed.bin").await.unwrap());

        bucket.delete("media/doomed.bin").await.unwrap();
        assert!(!bucket.exists("media/doomed.bin").await.unwrap());
        assert!(bucket.metadata("media/doomed.bin").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let bucket = ObjectBucket::in_memory("test-bucket");
        let result = bucket.delete("media/never-there.bin").await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_metadata_roundtrip() {
        let bucket = ObjectBucket::in_memory("test-bucket");
        bucket
            .put("media/tagged.bin", b"x".to_vec(), "application/octet-stream", &HashMap::new())
            .await
            .unwrap();

        assert!(bucket.metadata("media/tagged.bin").await.unwrap().is_empty());

        let mut meta = HashMap::new();
        meta.insert("kind".to_string(), "thumbnail".to_string());
        bucket.set_metadata("media/tagged.bin", &meta).await.unwrap();

        assert_eq!(bucket.metadata("media/tagged.bin").await.unwrap(), meta);
    }

    #[tokio::test]
    async fn test_put_stream_matches_put() {
        let bucket = ObjectBucket::in_memory("test-bucket");
        let data = vec![7u8; STREAM_CHUNK_SIZE * 2 + 17];
        let reader = Box::pin(std::io::Cursor::new(data.clone()))
            as Pin<Box<dyn AsyncRead + Send + Unpin>>;

        bucket
            .put_stream(
                "media/streamed.bin",
                reader,
                Some(data.len() as u64),
                "application/octet-stream",
                &HashMap::new(),
            )
            .await
            .unwrap();

        assert_eq!(bucket.get("media/streamed.bin").await.unwrap(), data);
    }

    #[tokio::test]
    async fn test_traversal_keys_rejected() {
        let bucket = ObjectBucket::in_memory("test-bucket");
        let result = bucket.get("../escape").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_verify_bucket_in_memory() {
        let bucket = ObjectBucket::in_memory("test-bucket");
        assert!(bucket.verify_bucket().await.is_ok());
    }

    #[test]
    fn test_url_styles() {
        let memory = ObjectBucket::in_memory("b");
        assert_eq!(memory.public_url("k"), "memory://b/k");
    }
}
