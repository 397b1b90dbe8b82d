//! Proof: one immutable, signed, hash-linked record of an action.
//!
//! The hash covers every field except `hash` and `signature`; the signature
//! is over the same canonical bytes. Changing any field after signing is
//! therefore visible to the verifier.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::canonical::CanonicalBytes;
use crate::crypto::{PublicKey, Sha256Hash, Signature};
use crate::error::{CoreError, Result};
use crate::identity::{AgentId, Identity};

/// The current proof schema version.
pub const PROOF_VERSION: &str = "1.0";

/// Wire field names.
pub mod fields {
    pub const VERSION: &str = "version";
    pub const ACTION: &str = "action";
    pub const DATA: &str = "data";
    pub const AGENT_ID: &str = "agentId";
    pub const PREVIOUS_HASH: &str = "previousHash";
    pub const TIMESTAMP: &str = "timestamp";
    pub const METADATA: &str = "metadata";
    pub const HASH: &str = "hash";
    pub const SIGNATURE: &str = "signature";

    /// Fields left out of the hashed and signed view.
    pub const UNSIGNED: &[&str] = &[HASH, SIGNATURE];
}

/// A signed proof as it appears in a chain file.
///
/// Decoding is strict: every field must be present and no others may
/// appear, so re-encoding a decoded proof yields the object that was hashed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Proof {
    /// Schema version (currently "1.0").
    pub version: String,

    /// Free-form label classifying the activity.
    pub action: String,

    /// Arbitrary nested payload.
    pub data: Value,

    /// Identifier of the signing identity.
    pub agent_id: AgentId,

    /// Hash of the preceding proof; `None` for the first proof of a chain.
    /// Always written, as `null` for the first proof.
    #[serde(deserialize_with = "required_nullable")]
    pub previous_hash: Option<Sha256Hash>,

    /// RFC 3339 UTC timestamp, kept as the exact string that was signed.
    pub timestamp: String,

    /// Free-form metadata (empty object when none was given).
    pub metadata: Map<String, Value>,

    /// SHA-256 over the canonical unsigned view.
    pub hash: Sha256Hash,

    /// Ed25519 signature over the canonical unsigned view.
    pub signature: Signature,
}

impl Proof {
    /// The unsigned view: every field except `hash` and `signature`.
    pub fn unsigned_record(&self) -> Map<String, Value> {
        unsigned_record(
            &self.version,
            &self.action,
            &self.data,
            &self.agent_id,
            self.previous_hash.as_ref(),
            &self.timestamp,
            &self.metadata,
        )
    }

    /// Canonical bytes of the unsigned view.
    pub fn canonical_bytes(&self) -> CanonicalBytes {
        CanonicalBytes::from_object_excluding(&self.unsigned_record(), fields::UNSIGNED)
    }

    /// Recompute the hash from the proof's own fields.
    pub fn compute_hash(&self) -> Sha256Hash {
        self.canonical_bytes().hash()
    }

    /// Whether the stored hash matches the content.
    pub fn hash_matches(&self) -> bool {
        self.compute_hash() == self.hash
    }

    /// Whether the stored signature verifies under `public_key`.
    pub fn signature_valid(&self, public_key: &PublicKey) -> bool {
        public_key.verify(self.canonical_bytes().as_bytes(), &self.signature)
    }

    /// Whether this is the first proof of a chain.
    pub fn is_genesis(&self) -> bool {
        self.previous_hash.is_none()
    }

    /// Parse the stored timestamp.
    pub fn timestamp_utc(&self) -> Result<DateTime<Utc>> {
        parse_timestamp(&self.timestamp)
    }

    /// The proof as a JSON value, e.g. for handing to the verifier.
    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Builder for signed proofs.
pub struct ProofBuilder {
    action: String,
    data: Value,
    metadata: Map<String, Value>,
    previous_hash: Option<Sha256Hash>,
    timestamp: Option<DateTime<Utc>>,
}

impl ProofBuilder {
    /// Start building a proof for an action.
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            data: Value::Object(Map::new()),
            metadata: Map::new(),
            previous_hash: None,
            timestamp: None,
        }
    }

    /// Set the payload.
    pub fn data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    /// Set the metadata.
    pub fn metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Link to the preceding proof.
    pub fn previous(mut self, previous_hash: Option<Sha256Hash>) -> Self {
        self.previous_hash = previous_hash;
        self
    }

    /// Override the creation time (defaults to now).
    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Stamp, canonicalize, hash, and sign.
    ///
    /// Fails with `SigningUnavailable` for a read-only identity.
    pub fn sign(self, identity: &Identity) -> Result<Proof> {
        let keypair = identity.keypair()?;
        let timestamp = format_timestamp(self.timestamp.unwrap_or_else(Utc::now));
        let agent_id = identity.agent_id().clone();

        let record = unsigned_record(
            PROOF_VERSION,
            &self.action,
            &self.data,
            &agent_id,
            self.previous_hash.as_ref(),
            &timestamp,
            &self.metadata,
        );
        let canonical = CanonicalBytes::from_object_excluding(&record, fields::UNSIGNED);
        let hash = canonical.hash();
        let signature = keypair.sign(canonical.as_bytes());

        Ok(Proof {
            version: PROOF_VERSION.to_string(),
            action: self.action,
            data: self.data,
            agent_id,
            previous_hash: self.previous_hash,
            timestamp,
            metadata: self.metadata,
            hash,
            signature,
        })
    }
}

/// Format a timestamp the way proofs store it: RFC 3339, UTC, milliseconds.
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse an RFC 3339 timestamp into UTC.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| CoreError::InvalidTimestamp {
            value: value.to_string(),
            reason: e.to_string(),
        })
}

// Missing `previousHash` is an error; an explicit null is the genesis marker.
fn required_nullable<'de, D>(deserializer: D) -> std::result::Result<Option<Sha256Hash>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Sha256Hash>::deserialize(deserializer)
}

fn unsigned_record(
    version: &str,
    action: &str,
    data: &Value,
    agent_id: &AgentId,
    previous_hash: Option<&Sha256Hash>,
    timestamp: &str,
    metadata: &Map<String, Value>,
) -> Map<String, Value> {
    let mut record = Map::new();
    record.insert(fields::VERSION.into(), Value::String(version.to_string()));
    record.insert(fields::ACTION.into(), Value::String(action.to_string()));
    record.insert(fields::DATA.into(), data.clone());
    record.insert(fields::AGENT_ID.into(), Value::String(agent_id.to_string()));
    record.insert(
        fields::PREVIOUS_HASH.into(),
        previous_hash.map_or(Value::Null, |h| Value::String(h.to_hex())),
    );
    record.insert(fields::TIMESTAMP.into(), Value::String(timestamp.to_string()));
    record.insert(fields::METADATA.into(), Value::Object(metadata.clone()));
    record
}
