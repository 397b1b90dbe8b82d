//! # Proofchain
//!
//! Signed, hash-linked proof chains: an append-only provenance log that lets
//! an actor prove what it did, when, and in what order, and lets anyone
//! holding its public key audit that history.
//!
//! ## Overview
//!
//! - **Proofs**: Immutable, signed records of one action each
//! - **Chains**: Proofs of one identity, each linked to the previous hash
//! - **Verification**: Structured reports on untrusted chains, never panics
//!
//! ## Key Concepts
//!
//! - **Identity**: Ed25519 keypair; its identifier is derived from the public key.
//! - **Canonical JSON**: Sorted keys at every level, so hashes are reproducible.
//! - **Single writer**: One [`ChainManager`] appends to a chain at a time.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use proofchain::{bootstrap, ChainConfig};
//! use serde_json::json;
//!
//! fn record() -> proofchain::Result<()> {
//!     let config = ChainConfig::new("/var/lib/agent");
//!     let chain = bootstrap::open_or_init(&config)?;
//!
//!     chain.append("decision", json!({"choice": "deploy"}), None)?;
//!
//!     let export = chain.export();
//!     let report = proofchain::verify_chain(&export, &config.verify);
//!     assert!(report.valid);
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `proofchain::primitives` - Core primitives (Proof, Identity, verification)
//! - `proofchain::store` - Chain and identity persistence

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod manager;

// Re-export component crates
pub use proofchain_core as primitives;
pub use proofchain_store as store;

// Re-export main types for convenience
pub use config::ChainConfig;
pub use error::{ChainError, Result};
pub use manager::{ChainManager, ChainPhase};

// Re-export commonly used core types
pub use proofchain_core::{
    sign_message, verify_chain, verify_document, verify_message, verify_proofs, verify_values,
    AgentId, ChainDocument, ChainMetadata, Identity, Proof, ProofBuilder, PublicKey, Sha256Hash,
    VerificationError, VerificationReport, VerificationWarning, VerifyOptions,
};
pub use proofchain_store::{ChainStore, FileStore, MemoryStore};
