//! ChainStore trait: the abstract interface for chain persistence.
//!
//! The chain manager keeps the authoritative copy in memory and hands the
//! whole document to the store after every append. Implementations must
//! replace the stored document atomically: a reader sees either the old
//! chain or the new one, never a mix.

use std::sync::Arc;

use proofchain_core::ChainDocument;

use crate::error::Result;
use crate::lock::WriterLock;

/// Durable home for one chain document.
pub trait ChainStore: Send + Sync {
    /// Load the stored document, or `None` when nothing has been saved yet.
    fn load(&self) -> Result<Option<ChainDocument>>;

    /// Replace the stored document.
    ///
    /// On error the previously stored document must still be intact.
    fn save(&self, document: &ChainDocument) -> Result<()>;

    /// Human-readable location for logs.
    fn location(&self) -> String;

    /// Take the exclusive writer lock for this chain.
    ///
    /// Fails with `WriterLocked` while another guard is alive.
    fn lock_writer(&self) -> Result<WriterLock>;
}

impl<S: ChainStore + ?Sized> ChainStore for Arc<S> {
    fn load(&self) -> Result<Option<ChainDocument>> {
        (**self).load()
    }

    fn save(&self, document: &ChainDocument) -> Result<()> {
        (**self).save(document)
    }

    fn location(&self) -> String {
        (**self).location()
    }

    fn lock_writer(&self) -> Result<WriterLock> {
        (**self).lock_writer()
    }
}

impl<S: ChainStore + ?Sized> ChainStore for Box<S> {
    fn load(&self) -> Result<Option<ChainDocument>> {
        (**self).load()
    }

    fn save(&self, document: &ChainDocument) -> Result<()> {
        (**self).save(document)
    }

    fn location(&self) -> String {
        (**self).location()
    }

    fn lock_writer(&self) -> Result<WriterLock> {
        (**self).lock_writer()
    }
}
