//! Error types for proofchain core.

use thiserror::Error;

use crate::identity::AgentId;

/// Errors raised while building, signing, or decoding proof material.
///
/// Defects in untrusted chains are never reported through this type; the
/// verification engine returns them as data in a
/// [`VerificationReport`](crate::verify::VerificationReport).
#[derive(Debug, Error)]
pub enum CoreError {
    /// The identity carries no private key (read-only or imported).
    #[error("signing unavailable: identity {0} has no private key")]
    SigningUnavailable(AgentId),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("invalid signature encoding: {0}")]
    InvalidSignature(String),

    #[error("invalid hash encoding: {0}")]
    InvalidHash(String),

    #[error("invalid timestamp {value:?}: {reason}")]
    InvalidTimestamp { value: String, reason: String },

    /// The value handed to the canonicalizer or message signer has the wrong shape.
    #[error("malformed record: {0}")]
    MalformedRecord(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
