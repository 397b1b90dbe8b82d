//! # Proofchain Core
//!
//! Pure primitives for proof chains: identities, canonicalization, signed
//! proofs, and chain verification.
//!
//! This crate contains no I/O, no storage, no networking. It is pure computation
//! over cryptographic data structures.
//!
//! ## Key Types
//!
//! - [`Identity`] - A keypair plus its derived [`AgentId`]
//! - [`Proof`] - One signed, hash-linked record of an action
//! - [`ChainDocument`] - A chain as persisted or exported
//! - [`VerificationReport`] - Structured verdict on an untrusted chain
//!
//! ## Canonicalization
//!
//! Every hash and signature is computed over canonical JSON. See the
//! [`canonical`] module for the exact byte rules.

pub mod canonical;
pub mod chain;
pub mod crypto;
pub mod error;
pub mod identity;
pub mod message;
pub mod proof;
pub mod verify;

pub use canonical::{canonicalize, CanonicalBytes};
pub use chain::{ChainDocument, ChainMetadata};
pub use crypto::{Keypair, PublicKey, Sha256Hash, Signature};
pub use error::{CoreError, Result};
pub use identity::{AgentId, Identity};
pub use message::{sign_message, verify_message};
pub use proof::{Proof, ProofBuilder, PROOF_VERSION};
pub use verify::{
    verify_chain, verify_document, verify_proofs, verify_values, SkewDirection,
    VerificationError, VerificationReport, VerificationWarning, VerifyOptions,
};
