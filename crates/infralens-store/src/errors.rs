//! Error handling for infralens-store
//!
//! Wraps infralens-core ExError with store-specific helpers

use infralens_core::errors::{ExError, ExErrorKind};

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// Create an IO error
pub fn io_error(operation: &str, err: std::io::Error) -> ExError {
    ExError::new(ExErrorKind::Io)
        .with_op(operation.to_string())
        .with_message(err.to_string())
}

/// Create an IO error tied to one cache entry
pub fn entry_io_error(operation: &str, fingerprint: &str, err: std::io::Error) -> ExError {
    io_error(operation, err).with_entity_id(fingerprint)
}

/// Create a corrupt entry error
pub fn corrupt_entry(fingerprint: &str, reason: impl std::fmt::Display) -> ExError {
    ExError::new(ExErrorKind::CacheCorrupt)
        .with_op("cache_read")
        .with_entity_id(fingerprint)
        .with_message(format!("Unreadable cache entry: {}", reason))
}

/// Create a serialization error for an entry that could not be encoded
pub fn encode_failed(fingerprint: &str, err: serde_json::Error) -> ExError {
    ExError::new(ExErrorKind::Serialization)
        .with_op("cache_write")
        .with_entity_id(fingerprint)
        .with_message(err.to_string())
}
