//! File-backed chain store.
//!
//! The chain lives in a single pretty-printed JSON file. Every save writes a
//! sibling temp file, syncs it, and renames it over the old one.

use std::ffi::OsString;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use proofchain_core::ChainDocument;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::lock::WriterLock;
use crate::traits::ChainStore;

/// Chain store backed by one JSON file.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// A store for the chain file at `path`. Nothing is touched until the
    /// first load or save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The sibling file whose flock marks the active writer:
    /// `chain.json` is guarded by `chain.json.lock`.
    pub fn lock_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(OsString::from).unwrap_or_default();
        name.push(".lock");
        self.path.with_file_name(name)
    }
}

impl ChainStore for FileStore {
    fn load(&self) -> Result<Option<ChainDocument>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let document = serde_json::from_str(&text).map_err(|e| StoreError::InvalidData {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;
        Ok(Some(document))
    }

    fn save(&self, document: &ChainDocument) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(document)?;
        write_atomic(&self.path, &bytes)?;
        debug!(path = %self.path.display(), proofs = document.len(), "chain saved");
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }

    fn lock_writer(&self) -> Result<WriterLock> {
        WriterLock::acquire_file(&self.lock_path())
    }
}

/// Replace `path` with `bytes` via temp file, fsync and rename.
///
/// The temp file is created in the destination directory so the rename
/// stays on one filesystem. If anything fails the temp file is removed and
/// the existing file is left alone.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut temp = temp_file_beside(path)?;
    temp.as_file_mut().write_all(bytes)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| StoreError::Persist {
        path: path.to_path_buf(),
        source: e.error,
    })?;
    Ok(())
}

/// A fresh temp file in the directory that will hold `path`.
pub(crate) fn temp_file_beside(path: &Path) -> Result<NamedTempFile> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;
    Ok(NamedTempFile::new_in(dir)?)
}
