//! Error types module
//!
//! All errors surfaced by the Cask client are unified under the [`Error`]
//! enum: configuration problems, path validation failures, payload
//! conversion failures, transport failures, and encryption failures.

use std::io;

/// Result type used throughout the Cask crates.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Missing or unusable configuration (bucket name, store handle,
    /// encryption key). Fatal, surfaced at construction.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid folder or file name, or a resize request against a
    /// non-image payload. Surfaced before any network effect.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Payload could not be converted into bytes (base64 decode failure,
    /// reader drain failure). Carries the underlying cause when there is one.
    #[error("Conversion error: {message}")]
    Conversion {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Storage-layer failure (stream error, backend error). No retry is
    /// attempted; the failing operation is reported as-is.
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Encryption error: {0}")]
    Encryption(String),

    #[error("Image processing error: {0}")]
    ImageProcessing(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Build a conversion error without an underlying source.
    pub fn conversion(message: impl Into<String>) -> Self {
        Error::Conversion {
            message: message.into(),
            source: None,
        }
    }

    /// Build a conversion error carrying the underlying cause.
    pub fn conversion_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Error::Conversion {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// True for failures worth retrying at the caller's discretion.
    /// Validation and configuration errors are deterministic and are not.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::Transport(_) | Error::Io(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversion_error_carries_source() {
        let io_err = io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed");
        let err = Error::conversion_with_source("failed to drain reader", io_err);
        assert!(err.to_string().contains("failed to drain reader"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn recoverability_classification() {
        assert!(Error::Transport("timeout".into()).is_recoverable());
        assert!(!Error::Validation("bad name".into()).is_recoverable());
        assert!(!Error::Config("no bucket".into()).is_recoverable());
    }
}
