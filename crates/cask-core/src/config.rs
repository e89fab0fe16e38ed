//! Configuration module
//!
//! Environment-driven configuration for the bucket client and its storage
//! backends. A `.env` file is honored when present (via `dotenvy`).

use std::env;
use std::time::Duration;

use crate::error::{Error, Result};

const DEFAULT_MAX_CONCURRENT_UPLOADS: usize = 8;
const DEFAULT_UPLOAD_TIMEOUT_SECS: u64 = 60;

/// Storage backend selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageBackend {
    S3,
    Local,
    /// In-process store, primarily for tests. Not selectable from the
    /// environment.
    Memory,
}

impl StorageBackend {
    pub fn parse(value: &str) -> Result<Self> {
        match value.to_lowercase().as_str() {
            "s3" => Ok(StorageBackend::S3),
            "local" => Ok(StorageBackend::Local),
            other => Err(Error::Config(format!(
                "Unknown storage backend '{}'. Expected 's3' or 'local'",
                other
            ))),
        }
    }
}

/// Bucket client configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub storage_backend: StorageBackend,
    pub bucket: String,
    // S3 configuration
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers
    // Local backend configuration
    pub local_path: Option<String>,
    pub local_base_url: Option<String>,
    // Upload behavior
    pub max_concurrent_uploads: usize,
    pub upload_timeout: Duration,
    // Optional base64-encoded 32-byte AES-256-GCM key
    pub encryption_key: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required: `CASK_BUCKET`. Backend defaults to `s3` unless
    /// `CASK_STORAGE_BACKEND=local` is set.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let bucket = env::var("CASK_BUCKET")
            .map_err(|_| Error::Config("CASK_BUCKET not configured".to_string()))?;
        if bucket.trim().is_empty() {
            return Err(Error::Config("CASK_BUCKET must not be empty".to_string()));
        }

        let storage_backend = match env::var("CASK_STORAGE_BACKEND") {
            Ok(value) => StorageBackend::parse(&value)?,
            Err(_) => StorageBackend::S3,
        };

        let max_concurrent_uploads = env_parse(
            "CASK_MAX_CONCURRENT_UPLOADS",
            DEFAULT_MAX_CONCURRENT_UPLOADS,
        )?;
        if max_concurrent_uploads == 0 {
            return Err(Error::Config(
                "CASK_MAX_CONCURRENT_UPLOADS must be at least 1".to_string(),
            ));
        }

        let upload_timeout_secs =
            env_parse("CASK_UPLOAD_TIMEOUT_SECS", DEFAULT_UPLOAD_TIMEOUT_SECS)?;

        Ok(Config {
            storage_backend,
            bucket,
            s3_region: env::var("CASK_S3_REGION").ok(),
            s3_endpoint: env::var("CASK_S3_ENDPOINT").ok(),
            local_path: env::var("CASK_LOCAL_PATH").ok(),
            local_base_url: env::var("CASK_LOCAL_BASE_URL").ok(),
            max_concurrent_uploads,
            upload_timeout: Duration::from_secs(upload_timeout_secs),
            encryption_key: env::var("CASK_ENCRYPTION_KEY").ok(),
        })
    }

    /// Minimal configuration for a named bucket with defaults everywhere else.
    pub fn for_bucket(bucket: impl Into<String>) -> Self {
        Config {
            storage_backend: StorageBackend::S3,
            bucket: bucket.into(),
            s3_region: None,
            s3_endpoint: None,
            local_path: None,
            local_base_url: None,
            max_concurrent_uploads: DEFAULT_MAX_CONCURRENT_UPLOADS,
            upload_timeout: Duration::from_secs(DEFAULT_UPLOAD_TIMEOUT_SECS),
            encryption_key: None,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> Result<T> {
    match env::var(key) {
        Ok(value) => value
            .parse::<T>()
            .map_err(|_| Error::Config(format!("{} has an invalid value: '{}'", key, value))),
        Err(_) => Ok(default),
    }
}
