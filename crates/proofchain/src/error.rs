//! Error types for the chain manager.

use proofchain_core::{AgentId, CoreError};
use proofchain_store::StoreError;
use thiserror::Error;

/// Errors that can occur during chain operations.
#[derive(Debug, Error)]
pub enum ChainError {
    /// Building, signing or decoding failed.
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// The stored chain belongs to a different identity than the active one.
    #[error("identity mismatch: chain belongs to {found}, active identity is {expected}")]
    IdentityMismatch { expected: AgentId, found: AgentId },

    /// Another manager, in this process or another, holds the chain.
    #[error("chain {location} is already open for writing")]
    WriterActive { location: String },

    /// Partial export requested past the end of the chain.
    #[error("export start {start} is beyond chain length {len}")]
    ExportOutOfRange { start: usize, len: usize },

    /// A writer panicked while holding the chain lock.
    #[error("chain state lock poisoned")]
    LockPoisoned,
}

impl ChainError {
    /// Whether this is the refusal to overwrite an existing identity file.
    pub fn is_identity_exists(&self) -> bool {
        matches!(self, Self::Store(StoreError::IdentityExists(_)))
    }
}

/// Result type for chain operations.
pub type Result<T> = std::result::Result<T, ChainError>;
