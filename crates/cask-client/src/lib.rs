//! Cask Client Library
//!
//! High-level bucket client over the [`BlobStore`] backends: upsert files
//! (optionally with resized image derivatives and client-side encryption),
//! download with metadata patching, delete. Batches run with bounded
//! concurrency and report per-item outcomes.

pub mod client;
pub mod progress;
pub mod types;

// Re-export the pieces callers need to drive the client
pub use cask_core::{Config, Error, Result, StorageBackend};
pub use cask_processing::FitMode;
pub use cask_storage::{create_store, BlobStore, LocalBucket, Metadata, ObjectBucket};

pub use client::{BucketClient, ClientOptions};
pub use progress::ProgressFn;
pub use types::{
    BatchReport, DerivedFile, FileDescriptor, Payload, ResizeSpec, UpsertOutcome, UpsertResult,
};
