//! The chain manager: the single writer for one identity's chain.
//!
//! The manager owns the in-memory proof arena and the last-hash cursor.
//! Appends build, persist and commit under one lock, so concurrent callers
//! always produce a linear chain. The store sees the whole document after
//! every append; the file is never re-read to append.
//!
//! A manager holds the store's writer lock from `open` until it is dropped,
//! so a second manager on the same chain, in any process, is refused.

use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use proofchain_core::{
    verify_chain, ChainDocument, ChainMetadata, Identity, Proof, ProofBuilder, Sha256Hash,
    VerificationReport, VerifyOptions,
};
use proofchain_store::{ChainStore, FileStore, StoreError, WriterLock};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::error::{ChainError, Result};

/// Lifecycle of a managed chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainPhase {
    /// No proofs yet; the next append produces the genesis proof.
    Empty,
    /// At least one proof; appends link to the last hash.
    Building,
}

struct ChainState {
    document: ChainDocument,
    last_hash: Option<Sha256Hash>,
}

/// Manager for one chain backed by a [`ChainStore`].
pub struct ChainManager<S: ChainStore> {
    identity: Identity,
    store: S,
    options: VerifyOptions,
    state: Mutex<ChainState>,
    _writer: WriterLock,
}

impl<S: ChainStore> ChainManager<S> {
    /// Open the chain held by `store` for `identity`.
    ///
    /// An empty store gets a fresh chain, saved immediately. An existing
    /// chain is loaded without re-verification but must belong to
    /// `identity`, otherwise [`ChainError::IdentityMismatch`].
    ///
    /// Fails with [`ChainError::WriterActive`] while another manager holds
    /// the chain. A read-only identity can open an existing chain but cannot
    /// create one.
    pub fn open(identity: Identity, store: S, options: VerifyOptions) -> Result<Self> {
        let writer = store.lock_writer().map_err(|e| match e {
            StoreError::WriterLocked(location) => ChainError::WriterActive { location },
            other => other.into(),
        })?;

        let document = match store.load()? {
            Some(document) => {
                check_owner(&identity, &document.metadata)?;
                info!(
                    agent_id = %identity.agent_id(),
                    location = %store.location(),
                    proofs = document.len(),
                    "chain opened"
                );
                document
            }
            None => {
                identity.keypair()?;
                let document = ChainDocument::new(ChainMetadata::new(&identity, Utc::now()));
                store.save(&document)?;
                info!(
                    agent_id = %identity.agent_id(),
                    location = %store.location(),
                    "chain created"
                );
                document
            }
        };

        let last_hash = document.last_hash();
        Ok(Self {
            identity,
            store,
            options,
            state: Mutex::new(ChainState { document, last_hash }),
            _writer: writer,
        })
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn options(&self) -> &VerifyOptions {
        &self.options
    }

    /// Sign a new proof, persist the chain, then commit it in memory.
    ///
    /// If persisting fails the in-memory chain is left unchanged and the
    /// error is returned.
    pub fn append(
        &self,
        action: impl Into<String>,
        data: Value,
        metadata: Option<Map<String, Value>>,
    ) -> Result<Proof> {
        let mut state = self.state.lock().map_err(|_| ChainError::LockPoisoned)?;

        let proof = ProofBuilder::new(action)
            .data(data)
            .metadata(metadata.unwrap_or_default())
            .previous(state.last_hash)
            .sign(&self.identity)?;

        state.document.proofs.push(proof.clone());
        if let Err(e) = self.store.save(&state.document) {
            state.document.proofs.pop();
            warn!(location = %self.store.location(), error = %e, "append not persisted");
            return Err(e.into());
        }
        state.last_hash = Some(proof.hash);

        debug!(
            index = state.document.len() - 1,
            action = %proof.action,
            hash = %proof.hash,
            "proof appended"
        );
        Ok(proof)
    }

    /// Snapshot of the whole chain for sharing. Holds no private key.
    pub fn export(&self) -> ChainDocument {
        self.state().document.clone()
    }

    /// Snapshot of the proofs from `start` on, flagged partial when
    /// `start > 0`.
    pub fn export_from(&self, start: usize) -> Result<ChainDocument> {
        let state = self.state();
        let len = state.document.len();
        if start > len {
            return Err(ChainError::ExportOutOfRange { start, len });
        }
        Ok(state.document.slice_from(start))
    }

    /// Run the verification engine over this chain.
    pub fn verify(&self) -> VerificationReport {
        let report = verify_chain(&self.export(), &self.options);
        if !report.valid {
            warn!(
                agent_id = %self.identity.agent_id(),
                errors = report.errors.len(),
                "chain failed verification"
            );
        }
        for warning in &report.warnings {
            debug!(%warning, "verification warning");
        }
        report
    }

    pub fn len(&self) -> usize {
        self.state().document.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state().document.is_empty()
    }

    pub fn phase(&self) -> ChainPhase {
        if self.is_empty() {
            ChainPhase::Empty
        } else {
            ChainPhase::Building
        }
    }

    /// Hash the next proof will link to.
    pub fn last_hash(&self) -> Option<Sha256Hash> {
        self.state().last_hash
    }

    pub fn proof(&self, index: usize) -> Option<Proof> {
        self.state().document.proofs.get(index).cloned()
    }

    pub fn proofs(&self) -> Vec<Proof> {
        self.state().document.proofs.clone()
    }

    // Appends roll back before releasing the lock, so a poisoned state is
    // still consistent for readers.
    fn state(&self) -> MutexGuard<'_, ChainState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ChainManager<FileStore> {
    /// Open the chain file at `path` for `identity`.
    pub fn load(path: impl Into<PathBuf>, identity: Identity, options: VerifyOptions) -> Result<Self> {
        Self::open(identity, FileStore::new(path), options)
    }
}

fn check_owner(identity: &Identity, metadata: &ChainMetadata) -> Result<()> {
    if metadata.public_key != *identity.public_key() || metadata.agent_id != *identity.agent_id() {
        return Err(ChainError::IdentityMismatch {
            expected: identity.agent_id().clone(),
            found: metadata.agent_id.clone(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proofchain_store::MemoryStore;
    use serde_json::json;
    use std::sync::Arc;

    fn identity() -> Identity {
        Identity::from_seed(&[0x77; 32])
    }

    fn manager() -> ChainManager<Arc<MemoryStore>> {
        ChainManager::open(identity(), Arc::new(MemoryStore::new()), VerifyOptions::default()).unwrap()
    }

    #[test]
    fn test_open_empty_saves_metadata() {
        let store = Arc::new(MemoryStore::new());
        let manager = ChainManager::open(identity(), store.clone(), VerifyOptions::default()).unwrap();
        assert_eq!(manager.phase(), ChainPhase::Empty);
        assert!(manager.last_hash().is_none());
        let saved = store.snapshot().unwrap();
        assert!(saved.is_empty());
        assert_eq!(&saved.metadata.agent_id, identity().agent_id());
    }

    #[test]
    fn test_append_links_proofs() {
        let manager = manager();
        let first = manager.append("decision", json!({"choice": 1}), None).unwrap();
        let second = manager.append("tool_call", json!({"tool": "x"}), None).unwrap();

        assert!(first.is_genesis());
        assert_eq!(second.previous_hash, Some(first.hash));
        assert_eq!(manager.last_hash(), Some(second.hash));
        assert_eq!(manager.phase(), ChainPhase::Building);
        assert_eq!(manager.len(), 2);
        assert_eq!(manager.proof(1), Some(second));
    }

    #[test]
    fn test_append_persists_each_proof() {
        let store = Arc::new(MemoryStore::new());
        let manager = ChainManager::open(identity(), store.clone(), VerifyOptions::default()).unwrap();
        manager.append("a", json!({}), None).unwrap();
        manager.append("b", json!({}), None).unwrap();
        assert_eq!(store.snapshot().unwrap().len(), 2);
        assert_eq!(store.save_count(), 3);
    }

    #[test]
    fn test_failed_persist_leaves_memory_unchanged() {
        let store = Arc::new(MemoryStore::new());
        let manager = ChainManager::open(identity(), store.clone(), VerifyOptions::default()).unwrap();
        let first = manager.append("a", json!({}), None).unwrap();

        store.set_fail_saves(true);
        assert!(manager.append("b", json!({}), None).is_err());
        assert_eq!(manager.len(), 1);
        assert_eq!(manager.last_hash(), Some(first.hash));

        store.set_fail_saves(false);
        let next = manager.append("b", json!({}), None).unwrap();
        assert_eq!(next.previous_hash, Some(first.hash));
        assert!(manager.verify().is_valid());
    }

    #[test]
    fn test_metadata_defaults_to_empty_object() {
        let manager = manager();
        let plain = manager.append("a", json!(null), None).unwrap();
        assert!(plain.metadata.is_empty());

        let mut metadata = Map::new();
        metadata.insert("model".into(), json!("m-1"));
        let tagged = manager.append("b", json!(null), Some(metadata.clone())).unwrap();
        assert_eq!(tagged.metadata, metadata);
    }

    #[test]
    fn test_reopen_restores_cursor() {
        let store = Arc::new(MemoryStore::new());
        let last = {
            let manager = ChainManager::open(identity(), store.clone(), VerifyOptions::default()).unwrap();
            manager.append("a", json!({}), None).unwrap();
            manager.append("b", json!({}), None).unwrap()
        };
        let reopened = ChainManager::open(identity(), store, VerifyOptions::default()).unwrap();
        assert_eq!(reopened.last_hash(), Some(last.hash));
        let next = reopened.append("c", json!({}), None).unwrap();
        assert_eq!(next.previous_hash, Some(last.hash));
    }

    #[test]
    fn test_open_with_other_identity_fails() {
        let store = Arc::new(MemoryStore::new());
        ChainManager::open(identity(), store.clone(), VerifyOptions::default()).unwrap();
        let other = Identity::from_seed(&[0x78; 32]);
        let result = ChainManager::open(other, store, VerifyOptions::default());
        assert!(matches!(result, Err(ChainError::IdentityMismatch { .. })));
    }

    #[test]
    fn test_second_manager_is_refused() {
        let store = Arc::new(MemoryStore::new());
        let first = ChainManager::open(identity(), store.clone(), VerifyOptions::default()).unwrap();
        let second = ChainManager::open(identity(), store.clone(), VerifyOptions::default());
        assert!(matches!(second, Err(ChainError::WriterActive { .. })));

        first.append("a", json!({}), None).unwrap();
        drop(first);
        let reopened = ChainManager::open(identity(), store, VerifyOptions::default()).unwrap();
        assert_eq!(reopened.len(), 1);
    }

    #[test]
    fn test_read_only_identity_cannot_create_chain() {
        let store = Arc::new(MemoryStore::new());
        let result = ChainManager::open(identity().to_read_only(), store.clone(), VerifyOptions::default());
        assert!(matches!(
            result,
            Err(ChainError::Core(proofchain_core::CoreError::SigningUnavailable(_)))
        ));
        assert!(store.snapshot().is_none());
        assert_eq!(store.save_count(), 0);
    }

    #[test]
    fn test_read_only_identity_cannot_append() {
        let store = Arc::new(MemoryStore::new());
        ChainManager::open(identity(), store.clone(), VerifyOptions::default()).unwrap();
        let read_only = ChainManager::open(identity().to_read_only(), store, VerifyOptions::default()).unwrap();
        let err = read_only.append("a", json!({}), None).unwrap_err();
        assert!(matches!(
            err,
            ChainError::Core(proofchain_core::CoreError::SigningUnavailable(_))
        ));
        assert!(read_only.verify().is_valid());
    }

    #[test]
    fn test_export_from() {
        let manager = manager();
        for i in 0..4 {
            manager.append("step", json!({"i": i}), None).unwrap();
        }
        let partial = manager.export_from(2).unwrap();
        assert!(partial.metadata.partial);
        assert_eq!(partial.proofs.len(), 2);
        assert!(verify_chain(&partial, &VerifyOptions::default()).is_valid());

        assert_eq!(manager.export_from(0).unwrap(), manager.export());
        assert!(manager.export_from(4).unwrap().is_empty());
        assert!(matches!(
            manager.export_from(5),
            Err(ChainError::ExportOutOfRange { start: 5, len: 4 })
        ));
    }

    #[test]
    fn test_export_is_a_snapshot() {
        let manager = manager();
        manager.append("a", json!({}), None).unwrap();
        let exported = manager.export();
        manager.append("b", json!({}), None).unwrap();
        assert_eq!(exported.len(), 1);
        assert_eq!(manager.len(), 2);
    }
}
