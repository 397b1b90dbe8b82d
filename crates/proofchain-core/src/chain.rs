//! Chain documents: the persisted and exported form of a chain.
//!
//! The same JSON shape is used on disk and for sharing. It never carries
//! private key material.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::crypto::{PublicKey, Sha256Hash};
use crate::identity::{AgentId, Identity};
use crate::proof::Proof;

/// Chain-level metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainMetadata {
    /// When the chain was started.
    pub created: DateTime<Utc>,

    /// Identifier of the owning identity.
    pub agent_id: AgentId,

    /// Owner's public key (base64).
    pub public_key: PublicKey,

    /// Set on truncated exports whose first proof is not the chain's first.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub partial: bool,

    /// Index of the first exported proof within the full chain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_index: Option<usize>,
}

impl ChainMetadata {
    /// Metadata for a new chain owned by `identity`.
    pub fn new(identity: &Identity, created: DateTime<Utc>) -> Self {
        Self {
            created,
            agent_id: identity.agent_id().clone(),
            public_key: *identity.public_key(),
            partial: false,
            start_index: None,
        }
    }

    /// A read-only identity for the chain's owner.
    pub fn owner(&self) -> Identity {
        Identity::from_chain_metadata(self)
    }
}

/// A chain as stored or exported: metadata plus proofs in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainDocument {
    pub metadata: ChainMetadata,
    pub proofs: Vec<Proof>,
}

impl ChainDocument {
    /// An empty chain.
    pub fn new(metadata: ChainMetadata) -> Self {
        Self {
            metadata,
            proofs: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.proofs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proofs.is_empty()
    }

    /// Hash of the last proof, i.e. the `previousHash` for the next append.
    pub fn last_hash(&self) -> Option<Sha256Hash> {
        self.proofs.last().map(|p| p.hash)
    }

    /// A partial export starting at `start`.
    ///
    /// Starting at 0 yields a complete, unflagged copy.
    pub fn slice_from(&self, start: usize) -> Self {
        let start = start.min(self.proofs.len());
        let mut metadata = self.metadata.clone();
        if start > 0 {
            metadata.partial = true;
            metadata.start_index = Some(start);
        }
        Self {
            metadata,
            proofs: self.proofs[start..].to_vec(),
        }
    }

    /// Pretty JSON for sharing.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
