//! Test fixtures and helpers.
//!
//! Common setup code for integration tests. Every proof built here uses a
//! fixed clock so hashes are reproducible across runs.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use proofchain_core::{
    AgentId, ChainDocument, ChainMetadata, Identity, Proof, ProofBuilder, PublicKey, Sha256Hash,
};
use proofchain_store::MemoryStore;
use serde_json::{json, Value};

/// Start of the fixture clock: 2025-01-14T12:00:00Z.
pub fn epoch() -> DateTime<Utc> {
    Utc.timestamp_opt(1_736_856_000, 0).single().unwrap_or_default()
}

/// A test fixture with an identity and memory store.
pub struct TestFixture {
    pub identity: Identity,
    pub store: Arc<MemoryStore>,
}

impl TestFixture {
    /// Create a new test fixture with a random identity.
    pub fn new() -> Self {
        Self {
            identity: Identity::generate(),
            store: Arc::new(MemoryStore::new()),
        }
    }

    /// Create with a deterministic identity from seed.
    pub fn with_seed(seed: [u8; 32]) -> Self {
        Self {
            identity: Identity::from_keypair(
                proofchain_core::Keypair::from_seed(&seed),
                epoch(),
            ),
            store: Arc::new(MemoryStore::new()),
        }
    }

    pub fn public_key(&self) -> &PublicKey {
        self.identity.public_key()
    }

    pub fn agent_id(&self) -> &AgentId {
        self.identity.agent_id()
    }

    /// Sign one proof at `epoch + offset_secs`.
    pub fn make_proof(
        &self,
        action: &str,
        data: Value,
        previous: Option<Sha256Hash>,
        offset_secs: i64,
    ) -> Proof {
        ProofBuilder::new(action)
            .data(data)
            .previous(previous)
            .timestamp(epoch() + Duration::seconds(offset_secs))
            .sign(&self.identity)
            .unwrap_or_else(|e| panic!("fixture identity must sign: {e}"))
    }

    /// A valid chain of `n` proofs, one second apart, with nested payloads.
    pub fn build_chain(&self, n: usize) -> Vec<Proof> {
        let mut proofs: Vec<Proof> = Vec::with_capacity(n);
        for i in 0..n {
            let action = if i % 2 == 0 { "decision" } else { "tool_call" };
            let data = json!({"step": i, "inner": {"value": i * 10, "tags": ["a", "b"]}});
            let proof = self.make_proof(action, data, proofs.last().map(|p| p.hash), i as i64);
            proofs.push(proof);
        }
        proofs
    }

    /// The decision / tool_call / decision chain used in end-to-end checks.
    pub fn scenario_chain(&self) -> Vec<Proof> {
        let first = self.make_proof("decision", json!({"choice": "plan", "foo": "bar"}), None, 0);
        let second = self.make_proof(
            "tool_call",
            json!({"tool": "search", "foo": "original"}),
            Some(first.hash),
            1,
        );
        let third = self.make_proof("decision", json!({"choice": "act"}), Some(second.hash), 2);
        vec![first, second, third]
    }

    /// A chain document holding `build_chain(n)`.
    pub fn document(&self, n: usize) -> ChainDocument {
        let mut document = ChainDocument::new(ChainMetadata::new(&self.identity, epoch()));
        document.proofs = self.build_chain(n);
        document
    }

    /// `build_chain(n)` as raw JSON values, ready for tampering.
    pub fn chain_values(&self, n: usize) -> Vec<Value> {
        self.build_chain(n)
            .iter()
            .map(|p| p.to_value().unwrap_or(Value::Null))
            .collect()
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Create multiple test fixtures for multi-identity tests.
pub fn multi_party_fixtures(count: usize) -> Vec<TestFixture> {
    (0..count)
        .map(|i| {
            let mut seed = [0u8; 32];
            seed[0] = i as u8;
            seed[31] = 0xa5;
            TestFixture::with_seed(seed)
        })
        .collect()
}
