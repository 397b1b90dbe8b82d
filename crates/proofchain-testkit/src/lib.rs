//! # Proofchain Testkit
//!
//! Testing utilities for proofchain.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Known identities and proofs with expected bytes, hashes and signatures
//! - **Generators**: Proptest strategies for JSON payloads and proofs
//! - **Fixtures**: Deterministic identities and chains on a fixed clock
//!
//! ## Golden Vectors
//!
//! ```rust
//! use proofchain_testkit::vectors::verify_all_vectors;
//!
//! verify_all_vectors().unwrap();
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use proofchain_testkit::generators::{proof_from_params, ProofParams};
//!
//! proptest! {
//!     #[test]
//!     fn hash_matches_content(params: ProofParams) {
//!         prop_assert!(proof_from_params(&params).hash_matches());
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use proofchain_testkit::fixtures::TestFixture;
//!
//! let fixture = TestFixture::with_seed([7; 32]);
//! let proofs = fixture.build_chain(3);
//! assert_eq!(proofs[1].previous_hash, Some(proofs[0].hash));
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{epoch, multi_party_fixtures, TestFixture};
pub use generators::{proof_from_params, reverse_key_order, ProofParams};
pub use vectors::{all_vectors, identity_vectors, proof_from_vector, verify_all_vectors, GoldenVector};
