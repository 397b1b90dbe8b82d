//! In-memory implementation of the ChainStore trait.
//!
//! This is primarily for testing. It has the same replace-whole-document
//! semantics as [`FileStore`](crate::FileStore) with no persistence, plus a
//! switch that makes saves fail so callers can exercise their error paths.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use proofchain_core::ChainDocument;

use crate::error::{Result, StoreError};
use crate::lock::WriterLock;
use crate::traits::ChainStore;

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
#[derive(Default)]
pub struct MemoryStore {
    document: RwLock<Option<ChainDocument>>,
    saves: AtomicUsize,
    fail_saves: AtomicBool,
    writer: Arc<AtomicBool>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds `document`.
    pub fn with_document(document: ChainDocument) -> Self {
        Self {
            document: RwLock::new(Some(document)),
            ..Self::default()
        }
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Make every following save fail (or succeed again).
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// The currently stored document.
    pub fn snapshot(&self) -> Option<ChainDocument> {
        self.document.read().ok().and_then(|doc| doc.clone())
    }
}

impl ChainStore for MemoryStore {
    fn load(&self) -> Result<Option<ChainDocument>> {
        let document = self.document.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(document.clone())
    }

    fn save(&self, document: &ChainDocument) -> Result<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "injected save failure",
            )));
        }
        let mut stored = self.document.write().map_err(|_| StoreError::LockPoisoned)?;
        *stored = Some(document.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }

    fn lock_writer(&self) -> Result<WriterLock> {
        WriterLock::acquire_flag(&self.writer, "memory")
    }
}
