use std::sync::Arc;

use cask_core::{Config, StorageBackend};

use crate::{BlobStore, LocalBucket, ObjectBucket, StorageError, StorageResult};

/// Create a storage backend based on configuration
pub async fn create_store(config: &Config) -> StorageResult<Arc<dyn BlobStore>> {
    match config.storage_backend {
        StorageBackend::S3 => {
            let region = config.s3_region.clone().ok_or_else(|| {
                StorageError::ConfigError("CASK_S3_REGION not configured".to_string())
            })?;

            let store = ObjectBucket::s3(
                config.bucket.clone(),
                region,
                config.s3_endpoint.clone(),
                config.upload_timeout,
            )?;
            Ok(Arc::new(store))
        }

        StorageBackend::Local => {
            let base_path = config.local_path.clone().ok_or_else(|| {
                StorageError::ConfigError("CASK_LOCAL_PATH not configured".to_string())
            })?;
            let base_url = config.local_base_url.clone().ok_or_else(|| {
                StorageError::ConfigError("CASK_LOCAL_BASE_URL not configured".to_string())
            })?;

            let store = LocalBucket::new(config.bucket.clone(), base_path, base_url).await?;
            Ok(Arc::new(store))
        }

        StorageBackend::Memory => Ok(Arc::new(ObjectBucket::in_memory(config.bucket.clone()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn s3_backend_requires_region() {
        let config = Config::for_bucket("media");
        let result = create_store(&config).await;
        assert!(matches!(result, Err(StorageError::ConfigError(_))));
    }

    #[tokio::test]
    async fn local_backend_requires_paths() {
        let mut config = Config::for_bucket("media");
        config.storage_backend = StorageBackend::Local;
        let result = create_store(&config).await;
        assert!(matches!(result, Err(StorageError::ConfigError(_))));
    }

    #[tokio::test]
    async fn memory_backend_needs_no_config() {
        let mut config = Config::for_bucket("media");
        config.storage_backend = StorageBackend::Memory;
        let store = create_store(&config).await.unwrap();
        assert_eq!(store.bucket(), "media");
        assert_eq!(store.backend_type(), StorageBackend::Memory);
    }
}
