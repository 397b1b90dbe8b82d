//! Identities: a keypair plus the short identifier derived from its public key.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::chain::ChainMetadata;
use crate::crypto::{Keypair, PublicKey, Sha256Hash};
use crate::error::{CoreError, Result};

/// Prefix on every derived identifier.
pub const AGENT_ID_PREFIX: &str = "agent_";

/// Number of digest bytes kept in an identifier (hex doubles it).
pub const AGENT_ID_DIGEST_BYTES: usize = 16;

/// A public identifier: `agent_` followed by the first 16 bytes of
/// SHA-256(public key), hex encoded.
///
/// Serialized as a plain string. Deserialization accepts any string, since
/// identifiers inside untrusted chains are compared, never trusted.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(String);

impl AgentId {
    /// Derive the identifier for a public key.
    pub fn derive(public_key: &PublicKey) -> Self {
        let digest = Sha256Hash::hash(public_key.as_bytes());
        Self(format!(
            "{AGENT_ID_PREFIX}{}",
            hex::encode(&digest.as_bytes()[..AGENT_ID_DIGEST_BYTES])
        ))
    }

    /// Wrap an identifier string as found in a record.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this identifier belongs to the given public key.
    pub fn matches(&self, public_key: &PublicKey) -> bool {
        *self == Self::derive(public_key)
    }
}

impl fmt::Debug for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AgentId({})", self.0)
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for AgentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A signing identity.
///
/// An identity built from a public key alone is read-only: it verifies but
/// cannot sign, and [`Identity::keypair`] returns `SigningUnavailable`.
#[derive(Clone)]
pub struct Identity {
    public_key: PublicKey,
    agent_id: AgentId,
    keypair: Option<Keypair>,
    created: DateTime<Utc>,
}

impl Identity {
    /// Generate a fresh identity.
    pub fn generate() -> Self {
        Self::from_keypair(Keypair::generate(), Utc::now())
    }

    /// Deterministic identity from a seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self::from_keypair(Keypair::from_seed(seed), Utc::now())
    }

    /// Wrap an existing keypair.
    pub fn from_keypair(keypair: Keypair, created: DateTime<Utc>) -> Self {
        let public_key = keypair.public_key();
        Self {
            agent_id: AgentId::derive(&public_key),
            public_key,
            keypair: Some(keypair),
            created,
        }
    }

    /// A verify-only identity for someone else's public key.
    pub fn read_only(public_key: PublicKey, created: DateTime<Utc>) -> Self {
        Self {
            agent_id: AgentId::derive(&public_key),
            public_key,
            keypair: None,
            created,
        }
    }

    /// The read-only owner of an exported chain.
    pub fn from_chain_metadata(metadata: &ChainMetadata) -> Self {
        Self::read_only(metadata.public_key, metadata.created)
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn agent_id(&self) -> &AgentId {
        &self.agent_id
    }

    pub fn created(&self) -> DateTime<Utc> {
        self.created
    }

    /// Whether this identity holds a private key.
    pub fn can_sign(&self) -> bool {
        self.keypair.is_some()
    }

    /// The signing keypair.
    pub fn keypair(&self) -> Result<&Keypair> {
        self.keypair
            .as_ref()
            .ok_or_else(|| CoreError::SigningUnavailable(self.agent_id.clone()))
    }

    /// A read-only copy with the private key dropped.
    pub fn to_read_only(&self) -> Self {
        Self::read_only(self.public_key, self.created)
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("agent_id", &self.agent_id)
            .field("can_sign", &self.can_sign())
            .finish()
    }
}
