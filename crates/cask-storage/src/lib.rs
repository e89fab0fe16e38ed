//! Cask Storage Library
//!
//! This crate provides the [`BlobStore`] abstraction and its backends: any
//! `object_store`-backed bucket (AWS S3, S3-compatible endpoints, in-memory
//! for tests) and a local-filesystem bucket.
//!
//! # Keys
//!
//! Keys are full object paths (`folder/name`). Keys must not contain `..`
//! or a leading `/`; every backend enforces this before touching storage.
//! User metadata is persisted next to the object under `{key}.meta.json`,
//! so that metadata survives backends without native metadata support.

pub mod factory;
pub mod local;
pub mod object;
pub mod traits;

// Re-export commonly used types
pub use cask_core::StorageBackend;
pub use factory::create_store;
pub use local::LocalBucket;
pub use object::ObjectBucket;
pub use traits::{BlobStore, Metadata, StorageError, StorageResult};
