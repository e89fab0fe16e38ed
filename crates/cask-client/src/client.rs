//! Bucket client
//!
//! [`BucketClient`] ties the storage backend, optional encryption, and
//! image derivative expansion together behind one API: `upsert_file`,
//! `upsert_files`, `download`, `delete`.

use std::collections::HashMap;
use std::io::Cursor;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use cask_core::{
    is_image, normalize_component, object_path, sniff, validate_folder, validate_name, Config,
    EncryptionService, Error, Result,
};
use cask_storage::BlobStore;
use futures::stream::{self, StreamExt};
use tokio::io::AsyncRead;

use crate::progress::{ProgressFn, ProgressReader};
use crate::types::{BatchReport, DerivedFile, FileDescriptor, UpsertOutcome, UpsertResult};

const DEFAULT_MAX_CONCURRENT_UPLOADS: usize = 8;
const DEFAULT_UPLOAD_TIMEOUT: Duration = Duration::from_secs(60);

// Metadata marker set on objects uploaded with encryption, so a keyless
// download can fail instead of handing back ciphertext.
const ENCRYPTED_METADATA_KEY: &str = "cask-encrypted";

/// Client behavior knobs. `Default` matches the environment defaults.
#[derive(Clone, Debug, Default)]
pub struct ClientOptions {
    /// Base64-encoded 32-byte AES-256-GCM key. When set, payloads are
    /// encrypted before upload and decrypted on download.
    pub encryption_key: Option<String>,
    /// Cap on in-flight uploads during a batch. Zero is rejected.
    pub max_concurrent_uploads: Option<usize>,
    /// Per-upload deadline.
    pub upload_timeout: Option<Duration>,
}

impl From<&Config> for ClientOptions {
    fn from(config: &Config) -> Self {
        ClientOptions {
            encryption_key: config.encryption_key.clone(),
            max_concurrent_uploads: Some(config.max_concurrent_uploads),
            upload_timeout: Some(config.upload_timeout),
        }
    }
}

/// High-level client bound to one bucket.
pub struct BucketClient {
    store: Arc<dyn BlobStore>,
    encryption: Option<EncryptionService>,
    max_concurrent_uploads: usize,
    upload_timeout: Duration,
}

impl std::fmt::Debug for BucketClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BucketClient")
            .field("bucket", &self.store.bucket())
            .field("max_concurrent_uploads", &self.max_concurrent_uploads)
            .field("upload_timeout", &self.upload_timeout)
            .finish_non_exhaustive()
    }
}

impl BucketClient {
    /// Open a client against `store`.
    ///
    /// Options are validated first, then the bucket is probed for
    /// reachability; a client is never handed out against a bucket that
    /// cannot be reached.
    pub async fn connect(store: Arc<dyn BlobStore>, options: ClientOptions) -> Result<Self> {
        if store.bucket().trim().is_empty() {
            return Err(Error::Config("Bucket name must not be empty".to_string()));
        }

        let max_concurrent_uploads = options
            .max_concurrent_uploads
            .unwrap_or(DEFAULT_MAX_CONCURRENT_UPLOADS);
        if max_concurrent_uploads == 0 {
            return Err(Error::Config(
                "max_concurrent_uploads must be at least 1".to_string(),
            ));
        }

        let encryption = match options.encryption_key.as_deref() {
            Some(key) => Some(EncryptionService::from_base64_key(key)?),
            None => None,
        };

        store.verify_bucket().await?;

        tracing::info!(
            bucket = %store.bucket(),
            backend = ?store.backend_type(),
            encrypted = encryption.is_some(),
            "Connected to bucket"
        );

        Ok(BucketClient {
            store,
            encryption,
            max_concurrent_uploads,
            upload_timeout: options.upload_timeout.unwrap_or(DEFAULT_UPLOAD_TIMEOUT),
        })
    }

    pub fn bucket(&self) -> &str {
        self.store.bucket()
    }

    /// Upsert one descriptor. Returns one result per uploaded derived file
    /// (original first, then variants in spec order).
    pub async fn upsert_file(
        &self,
        descriptor: FileDescriptor,
        on_progress: Option<ProgressFn>,
    ) -> Result<Vec<UpsertResult>> {
        let files = self.expand(descriptor).await?;
        let mut results = Vec::with_capacity(files.len());
        for file in files {
            results.push(self.upsert_one(file, on_progress.as_ref()).await?);
        }
        Ok(results)
    }

    /// Upsert a batch of descriptors with bounded concurrency.
    ///
    /// Every derived file settles independently; one failure never aborts
    /// the rest. Outcomes are returned in submission order: descriptor
    /// order, original before variants within a descriptor.
    pub async fn upsert_files(
        &self,
        descriptors: Vec<FileDescriptor>,
        on_progress: Option<ProgressFn>,
    ) -> BatchReport {
        enum Slot {
            Failed(UpsertOutcome),
            Pending(DerivedFile),
        }

        let mut slots = Vec::new();
        for descriptor in descriptors {
            let folder = descriptor.folder.clone();
            let name = descriptor.name.clone();
            match self.expand(descriptor).await {
                Ok(files) => slots.extend(files.into_iter().map(Slot::Pending)),
                Err(e) => slots.push(Slot::Failed(UpsertOutcome {
                    path: format!("{}/{}", folder, name),
                    folder,
                    name,
                    result: Err(e),
                })),
            }
        }

        let mut indexed: Vec<(usize, UpsertOutcome)> =
            stream::iter(slots.into_iter().enumerate().map(|(index, slot)| {
                let on_progress = on_progress.clone();
                async move {
                    match slot {
                        Slot::Failed(outcome) => (index, outcome),
                        Slot::Pending(file) => {
                            let folder = file.folder.clone();
                            let name = file.name.clone();
                            let result = self.upsert_one(file, on_progress.as_ref()).await;
                            let outcome = UpsertOutcome {
                                path: format!("{}/{}", folder, name),
                                folder,
                                name,
                                result,
                            };
                            (index, outcome)
                        }
                    }
                }
            }))
            .buffer_unordered(self.max_concurrent_uploads)
            .collect()
            .await;

        indexed.sort_by_key(|(index, _)| *index);
        let outcomes: Vec<UpsertOutcome> =
            indexed.into_iter().map(|(_, outcome)| outcome).collect();

        let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
        tracing::info!(
            bucket = %self.store.bucket(),
            total = outcomes.len(),
            succeeded = outcomes.len() - failed,
            failed = failed,
            "Batch upsert complete"
        );

        BatchReport { outcomes }
    }

    /// Delete the object at `path`.
    pub async fn delete(&self, path: &str) -> Result<()> {
        self.store.delete(path).await?;
        Ok(())
    }

    /// Download the object at `path`, decrypting when a key is configured.
    ///
    /// A non-empty `metadata_patch` is merged into the stored metadata
    /// (patch wins on conflicting keys) and persisted before the download.
    pub async fn download(
        &self,
        path: &str,
        metadata_patch: &HashMap<String, String>,
    ) -> Result<Vec<u8>> {
        if !metadata_patch.is_empty() {
            let mut metadata = self.store.metadata(path).await?;
            for (key, value) in metadata_patch {
                metadata.insert(key.clone(), value.clone());
            }
            self.store.set_metadata(path, &metadata).await?;
        }

        if self.encryption.is_none() {
            let metadata = self.store.metadata(path).await?;
            if metadata.get(ENCRYPTED_METADATA_KEY).map(String::as_str) == Some("true") {
                return Err(Error::Encryption(format!(
                    "Object '{}' is encrypted and no key is configured",
                    path
                )));
            }
        }

        let data = self.store.get(path).await?;
        match &self.encryption {
            Some(encryption) => encryption.decrypt_bytes(&data),
            None => Ok(data),
        }
    }

    /// Expand a descriptor into the derived files to upload: the original,
    /// plus one resized variant per spec when the payload is an image.
    async fn expand(&self, descriptor: FileDescriptor) -> Result<Vec<DerivedFile>> {
        let FileDescriptor {
            folder,
            name,
            payload,
            metadata,
            resizes,
        } = descriptor;

        let data = payload.into_bytes().await?;

        let mut derived = vec![DerivedFile {
            folder: folder.clone(),
            name: name.clone(),
            data: data.clone(),
            metadata: metadata.clone(),
        }];

        if resizes.is_empty() {
            return Ok(derived);
        }

        if !is_image(&data) {
            return Err(Error::Validation(format!(
                "File '{}' is not an image; resize specs require an image payload",
                name
            )));
        }

        for spec in &resizes {
            let resized = cask_processing::resize(
                &data,
                spec.width,
                spec.height,
                spec.fit.unwrap_or_default(),
            )
            .map_err(|e| Error::ImageProcessing(e.to_string()))?;

            derived.push(DerivedFile {
                folder: folder.clone(),
                name: spec.variant_name(&name),
                data: resized,
                metadata: metadata.clone(),
            });
        }

        Ok(derived)
    }

    /// Upload one derived file. Validation happens before any store call;
    /// the sniffed type of the plaintext buffer drives the content type
    /// and the result's extension/MIME fields.
    async fn upsert_one(
        &self,
        file: DerivedFile,
        on_progress: Option<&ProgressFn>,
    ) -> Result<UpsertResult> {
        let folder = normalize_component(&file.folder);
        validate_folder(&folder)?;
        let name = normalize_component(&file.name);
        validate_name(&name)?;
        let path = object_path(&folder, &name);

        let sniffed = sniff(&file.data);
        let content_type = sniffed.map(|s| s.mime).unwrap_or("application/octet-stream");

        let mut metadata = file.metadata.clone();
        let body = match &self.encryption {
            Some(encryption) => {
                metadata.insert(ENCRYPTED_METADATA_KEY.to_string(), "true".to_string());
                Bytes::from(encryption.encrypt_bytes(&file.data)?)
            }
            None => file.data.clone(),
        };
        let total = body.len() as u64;

        let reader: Pin<Box<dyn AsyncRead + Send + Unpin>> = match on_progress {
            Some(callback) => Box::pin(ProgressReader::new(
                Cursor::new(body),
                path.clone(),
                total,
                callback.clone(),
            )),
            None => Box::pin(Cursor::new(body)),
        };

        let upload = self
            .store
            .put_stream(&path, reader, Some(total), content_type, &metadata);
        let url = tokio::time::timeout(self.upload_timeout, upload)
            .await
            .map_err(|_| {
                Error::Transport(format!(
                    "Upload of '{}' timed out after {:?}",
                    path, self.upload_timeout
                ))
            })??;

        if let Some(callback) = on_progress {
            callback(&path, 100);
        }

        Ok(UpsertResult {
            url,
            path,
            name,
            extension: sniffed.map(|s| s.extension.to_string()),
            mime: sniffed.map(|s| s.mime.to_string()),
        })
    }
}
