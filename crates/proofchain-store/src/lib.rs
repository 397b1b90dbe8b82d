//! # Proofchain Store
//!
//! Persistence for proofchain. Provides a trait-based interface for chain
//! documents with file-backed and in-memory implementations, plus reading
//! and writing of identity files.
//!
//! ## Key Types
//!
//! - [`ChainStore`] - The trait for loading and atomically replacing a chain
//! - [`FileStore`] - One JSON file, replaced via temp file + rename
//! - [`MemoryStore`] - In-memory storage for tests
//!
//! ## Design Notes
//!
//! - **Atomic replace**: a crash mid-save leaves the previous file intact
//! - **Single writer**: opening a chain for writing takes an exclusive lock
//!   that lasts as long as the returned [`WriterLock`]
//! - **No-clobber identities**: an identity file is written once, mode 0600
//! - **No verification on load**: stores return what is on disk; checking it
//!   is the verifier's job

pub mod error;
pub mod file;
pub mod identity;
pub mod lock;
pub mod memory;
pub mod traits;

pub use error::{Result, StoreError};
pub use file::{write_atomic, FileStore};
pub use lock::WriterLock;
pub use identity::{load_identity, load_or_create_identity, save_identity};
pub use memory::MemoryStore;
pub use traits::ChainStore;
