//! Client-facing data model
//!
//! A [`FileDescriptor`] describes one file to upsert. Its payload can be
//! raw bytes, a base64 string, or an async reader; all three normalize to
//! `Bytes` before upload. Descriptors carrying resize specs expand into
//! one [`DerivedFile`] per variant plus the original.

use std::collections::HashMap;
use std::fmt;
use std::pin::Pin;

use base64::{engine::general_purpose, Engine as _};
use bytes::Bytes;
use cask_core::{Error, Result};
use cask_processing::FitMode;
use tokio::io::{AsyncRead, AsyncReadExt};

/// File content in any of the accepted input forms.
pub enum Payload {
    Bytes(Bytes),
    Base64(String),
    Reader(Pin<Box<dyn AsyncRead + Send + Unpin>>),
}

impl Payload {
    /// Normalize the payload to raw bytes.
    ///
    /// Base64 decoding is strict: invalid input is a conversion error, not
    /// silently tolerated.
    pub async fn into_bytes(self) -> Result<Bytes> {
        match self {
            Payload::Bytes(data) => Ok(data),
            Payload::Base64(encoded) => general_purpose::STANDARD
                .decode(encoded.trim())
                .map(Bytes::from)
                .map_err(|e| Error::conversion_with_source("Invalid base64 payload", e)),
            Payload::Reader(mut reader) => {
                let mut buffer = Vec::new();
                reader.read_to_end(&mut buffer).await.map_err(|e| {
                    Error::conversion_with_source("Failed to read payload stream", e)
                })?;
                Ok(Bytes::from(buffer))
            }
        }
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Bytes(data) => f.debug_tuple("Bytes").field(&data.len()).finish(),
            Payload::Base64(encoded) => f.debug_tuple("Base64").field(&encoded.len()).finish(),
            Payload::Reader(_) => f.write_str("Reader"),
        }
    }
}

impl From<Bytes> for Payload {
    fn from(data: Bytes) -> Self {
        Payload::Bytes(data)
    }
}

impl From<Vec<u8>> for Payload {
    fn from(data: Vec<u8>) -> Self {
        Payload::Bytes(Bytes::from(data))
    }
}

impl From<&[u8]> for Payload {
    fn from(data: &[u8]) -> Self {
        Payload::Bytes(Bytes::copy_from_slice(data))
    }
}

/// One resized variant to produce at upload time.
#[derive(Clone, Debug)]
pub struct ResizeSpec {
    pub width: u32,
    pub height: u32,
    /// Defaults to [`FitMode::Cover`] when unset.
    pub fit: Option<FitMode>,
    /// Prepended to the variant name, e.g. "thumb-".
    pub prefix: String,
    /// Replaces the original name in the variant when set.
    pub rename: Option<String>,
}

impl ResizeSpec {
    pub fn new(width: u32, height: u32, prefix: impl Into<String>) -> Self {
        ResizeSpec {
            width,
            height,
            fit: None,
            prefix: prefix.into(),
            rename: None,
        }
    }

    pub fn with_fit(mut self, fit: FitMode) -> Self {
        self.fit = Some(fit);
        self
    }

    pub fn with_rename(mut self, rename: impl Into<String>) -> Self {
        self.rename = Some(rename.into());
        self
    }

    /// Variant name: `prefix + (rename | original name)`.
    pub fn variant_name(&self, original: &str) -> String {
        format!(
            "{}{}",
            self.prefix,
            self.rename.as_deref().unwrap_or(original)
        )
    }
}

/// One file to upsert.
#[derive(Debug)]
pub struct FileDescriptor {
    pub folder: String,
    pub name: String,
    pub payload: Payload,
    pub metadata: HashMap<String, String>,
    pub resizes: Vec<ResizeSpec>,
}

impl FileDescriptor {
    pub fn new(
        folder: impl Into<String>,
        name: impl Into<String>,
        payload: impl Into<Payload>,
    ) -> Self {
        FileDescriptor {
            folder: folder.into(),
            name: name.into(),
            payload: payload.into(),
            metadata: HashMap::new(),
            resizes: Vec::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn with_resize(mut self, spec: ResizeSpec) -> Self {
        self.resizes.push(spec);
        self
    }
}

/// The unit actually uploaded: the original file or one resized variant.
#[derive(Clone, Debug)]
pub struct DerivedFile {
    pub folder: String,
    pub name: String,
    pub data: Bytes,
    pub metadata: HashMap<String, String>,
}

/// Returned per uploaded derived file.
#[derive(Clone, Debug)]
pub struct UpsertResult {
    pub url: String,
    /// Full object path using the normalized folder and name.
    pub path: String,
    /// Normalized file name.
    pub name: String,
    /// Extension detected by content sniffing, when recognized.
    pub extension: Option<String>,
    /// MIME type detected by content sniffing, when recognized.
    pub mime: Option<String>,
}

/// Per-item result in a batch upsert. Failures never abort the batch.
#[derive(Debug)]
pub struct UpsertOutcome {
    /// Folder and name as submitted, before normalization.
    pub folder: String,
    pub name: String,
    pub path: String,
    pub result: Result<UpsertResult>,
}

/// Outcomes of a batch upsert, in submission order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<UpsertOutcome>,
}

impl BatchReport {
    pub fn succeeded(&self) -> impl Iterator<Item = &UpsertOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_ok())
    }

    pub fn failed(&self) -> impl Iterator<Item = &UpsertOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_err())
    }

    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }
}
