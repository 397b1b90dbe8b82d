//! Error types for the store module.

use std::path::PathBuf;

use proofchain_core::CoreError;
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Encoding or decoding of a stored document failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Refused to overwrite an existing identity file.
    #[error("identity file already exists: {}", .0.display())]
    IdentityExists(PathBuf),

    /// The requested file does not exist.
    #[error("not found: {}", .0.display())]
    NotFound(PathBuf),

    /// A stored file parsed but its contents are inconsistent.
    #[error("invalid data in {}: {reason}", path.display())]
    InvalidData { path: PathBuf, reason: String },

    /// The temp file could not be moved into place.
    #[error("cannot persist {}: {source}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Another writer already holds the chain.
    #[error("chain is locked by another writer: {0}")]
    WriterLocked(String),

    /// In-process lock poisoned by a panicking writer.
    #[error("store lock poisoned")]
    LockPoisoned,

    /// Key or proof material failed to decode.
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
