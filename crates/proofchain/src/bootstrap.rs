//! Entry points that wire identity files, chain files and the manager
//! together from a [`ChainConfig`].

use std::fs;
use std::path::Path;

use proofchain_core::{verify_document, ChainDocument, Identity, VerificationReport, VerifyOptions};
use proofchain_store::{load_identity, load_or_create_identity, save_identity, FileStore, StoreError};
use tracing::{info, warn};

use crate::config::ChainConfig;
use crate::error::Result;
use crate::manager::ChainManager;

/// Create a new identity and an empty chain.
///
/// Fails with `IdentityExists` if the identity file is already present;
/// an existing identity is never replaced.
pub fn init(config: &ChainConfig) -> Result<ChainManager<FileStore>> {
    let identity = Identity::generate();
    save_identity(&config.identity_path(), &identity)?;
    info!(agent_id = %identity.agent_id(), dir = %config.data_dir.display(), "initialized");
    open_with(config, identity)
}

/// Open an existing identity and its chain.
pub fn open(config: &ChainConfig) -> Result<ChainManager<FileStore>> {
    let identity = load_identity(&config.identity_path())?;
    open_with(config, identity)
}

/// Open the identity and chain, creating the identity on first run.
pub fn open_or_init(config: &ChainConfig) -> Result<ChainManager<FileStore>> {
    let (identity, created) = load_or_create_identity(&config.identity_path())?;
    if created {
        info!(agent_id = %identity.agent_id(), "identity generated on first run");
    }
    open_with(config, identity)
}

fn open_with(config: &ChainConfig, identity: Identity) -> Result<ChainManager<FileStore>> {
    ChainManager::load(config.chain_path(), identity, config.verify.clone())
}

/// Read an exported or persisted chain document.
pub fn read_document(path: &Path) -> Result<ChainDocument> {
    let text = read_text(path)?;
    let document = serde_json::from_str(&text).map_err(|e| StoreError::InvalidData {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    Ok(document)
}

/// Verify a chain file as an untrusted third party.
///
/// Only an unreadable or non-JSON file is an `Err`; every defect inside the
/// chain is reported in the returned [`VerificationReport`].
pub fn verify_file(path: &Path, options: &VerifyOptions) -> Result<VerificationReport> {
    let text = read_text(path)?;
    let value: serde_json::Value = serde_json::from_str(&text).map_err(|e| StoreError::InvalidData {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let report = verify_document(&value, options);
    if !report.valid {
        warn!(path = %path.display(), errors = report.errors.len(), "chain file failed verification");
    }
    Ok(report)
}

fn read_text(path: &Path) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(StoreError::NotFound(path.to_path_buf()).into())
        }
        Err(e) => Err(StoreError::Io(e).into()),
    }
}
