//! Configuration for a chain on disk.

use std::path::{Path, PathBuf};

use proofchain_core::VerifyOptions;
use serde::{Deserialize, Serialize};

/// Default chain file name inside the data directory.
pub const DEFAULT_CHAIN_FILE: &str = "chain.json";

/// Default identity file name inside the data directory.
pub const DEFAULT_IDENTITY_FILE: &str = "identity.json";

/// Where a chain and its identity live, and how to verify it.
///
/// File names are resolved against `data_dir`; an absolute file name is
/// used as is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    pub data_dir: PathBuf,

    #[serde(default = "default_chain_file")]
    pub chain_file: PathBuf,

    #[serde(default = "default_identity_file")]
    pub identity_file: PathBuf,

    #[serde(default)]
    pub verify: VerifyOptions,
}

fn default_chain_file() -> PathBuf {
    PathBuf::from(DEFAULT_CHAIN_FILE)
}

fn default_identity_file() -> PathBuf {
    PathBuf::from(DEFAULT_IDENTITY_FILE)
}

impl ChainConfig {
    /// Defaults rooted at `data_dir`.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            chain_file: default_chain_file(),
            identity_file: default_identity_file(),
            verify: VerifyOptions::default(),
        }
    }

    /// Replace the verification options.
    pub fn with_verify(mut self, verify: VerifyOptions) -> Self {
        self.verify = verify;
        self
    }

    pub fn chain_path(&self) -> PathBuf {
        self.resolve(&self.chain_file)
    }

    pub fn identity_path(&self) -> PathBuf {
        self.resolve(&self.identity_file)
    }

    fn resolve(&self, file: &Path) -> PathBuf {
        self.data_dir.join(file)
    }
}
