//! Error types
//!
//! Gameplay code is infallible; only the storage boundary reports errors, and
//! callers above it log and degrade instead of propagating.

use std::io;

/// Errors from the key-value persistence boundary.
#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("storage is not available")]
    Unavailable,

    #[error("failed to read key {key}: {reason}")]
    Read { key: String, reason: String },

    #[error("failed to write key {key}: {reason}")]
    Write { key: String, reason: String },

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}
