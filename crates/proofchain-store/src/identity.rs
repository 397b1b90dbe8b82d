//! Identity files.
//!
//! An identity is created once and loaded on every later run. The file holds
//! the private key seed, so it is written with owner-only permissions and
//! never overwritten.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use proofchain_core::{AgentId, Identity, Keypair, PublicKey};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, StoreError};
use crate::file::temp_file_beside;

/// On-disk shape of an identity file.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IdentityRecord {
    agent_id: AgentId,
    public_key: PublicKey,
    /// Base64 of the 32-byte Ed25519 seed.
    private_key: String,
    created: DateTime<Utc>,
}

/// Write `identity` to `path`.
///
/// Fails with [`StoreError::IdentityExists`] if anything is already there,
/// and with `SigningUnavailable` for a read-only identity.
pub fn save_identity(path: &Path, identity: &Identity) -> Result<()> {
    let keypair = identity.keypair()?;
    if path.exists() {
        return Err(StoreError::IdentityExists(path.to_path_buf()));
    }

    let record = IdentityRecord {
        agent_id: identity.agent_id().clone(),
        public_key: *identity.public_key(),
        private_key: keypair.seed_base64(),
        created: identity.created(),
    };
    let bytes = serde_json::to_vec_pretty(&record)?;

    let mut temp = temp_file_beside(path)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        temp.as_file()
            .set_permissions(fs::Permissions::from_mode(0o600))?;
    }
    temp.as_file_mut().write_all(&bytes)?;
    temp.as_file().sync_all()?;

    // Another process may have won the race since the exists() check.
    temp.persist_noclobber(path).map_err(|e| {
        if e.error.kind() == ErrorKind::AlreadyExists {
            StoreError::IdentityExists(path.to_path_buf())
        } else {
            StoreError::Persist {
                path: path.to_path_buf(),
                source: e.error,
            }
        }
    })?;

    info!(agent_id = %identity.agent_id(), path = %path.display(), "identity created");
    Ok(())
}

/// Load the identity stored at `path`.
pub fn load_identity(path: &Path) -> Result<Identity> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(StoreError::NotFound(path.to_path_buf()))
        }
        Err(e) => return Err(e.into()),
    };
    let invalid = |reason: String| StoreError::InvalidData {
        path: path.to_path_buf(),
        reason,
    };

    let record: IdentityRecord = serde_json::from_str(&text).map_err(|e| invalid(e.to_string()))?;
    let keypair = Keypair::from_base64_seed(&record.private_key)?;
    if keypair.public_key() != record.public_key {
        return Err(invalid("private key does not match public key".into()));
    }
    if !record.agent_id.matches(&record.public_key) {
        return Err(invalid(format!(
            "identifier {} does not match public key",
            record.agent_id
        )));
    }

    let identity = Identity::from_keypair(keypair, record.created);
    debug!(agent_id = %identity.agent_id(), "identity loaded");
    Ok(identity)
}

/// Load the identity at `path`, creating and saving a new one if absent.
///
/// Returns the identity and whether it was freshly generated.
pub fn load_or_create_identity(path: &Path) -> Result<(Identity, bool)> {
    match load_identity(path) {
        Ok(identity) => Ok((identity, false)),
        Err(StoreError::NotFound(_)) => {
            let identity = Identity::generate();
            save_identity(path, &identity)?;
            Ok((identity, true))
        }
        Err(e) => Err(e),
    }
}
