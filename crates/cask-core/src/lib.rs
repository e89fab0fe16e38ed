//! Cask Core Library
//!
//! This crate provides the error taxonomy, configuration, encryption service,
//! path validation, and content sniffing shared across all Cask components.

pub mod config;
pub mod encryption;
pub mod error;
pub mod sniff;
pub mod validation;

// Re-export commonly used types
pub use config::{Config, StorageBackend};
pub use encryption::EncryptionService;
pub use error::{Error, Result};
pub use sniff::{is_image, sniff, SniffedType};
pub use validation::{normalize_component, object_path, validate_folder, validate_name};
