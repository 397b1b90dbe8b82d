//! Golden test vectors for deterministic verification.
//!
//! These vectors pin identifier derivation, canonical bytes, hashes and
//! Ed25519 signatures. Any other implementation that reads or writes the
//! same chain files must reproduce them exactly.

use chrono::Duration;
use proofchain_core::{Identity, Keypair, Proof, ProofBuilder, Sha256Hash};
use serde_json::{json, Map, Value};

use crate::fixtures::epoch;

/// Expected identity derived from a seed.
#[derive(Debug, Clone)]
pub struct IdentityVector {
    pub seed: [u8; 32],
    pub public_key_base64: &'static str,
    pub agent_id: &'static str,
}

/// Get all identity vectors.
pub fn identity_vectors() -> Vec<IdentityVector> {
    vec![
        IdentityVector {
            seed: [0x42; 32],
            public_key_base64: "IVL40Zt5HSRFMkLhXy6rbLfP+ntqXtMAl5YOBpiB2xI=",
            agent_id: "agent_3097e2dee2cb4a34b53840cdb705aed7",
        },
        IdentityVector {
            seed: [0x00; 32],
            public_key_base64: "O2onvM62pC1io6jQKm8Nc2UyFXcd4kOmOsBIoYtZ2ik=",
            agent_id: "agent_139e3940e64b5491722088d9a0d74162",
        },
        IdentityVector {
            seed: [0x01; 32],
            public_key_base64: "iojj3XQJ8ZX9UtstPLpdcspnCb8dlBIb83SIAbQPb1w=",
            agent_id: "agent_34750f98bd59fcfc946da45aaabe933b",
        },
    ]
}

/// A golden proof: inputs plus every derived output.
#[derive(Debug, Clone)]
pub struct GoldenVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// Seed for deterministic key generation.
    pub seed: [u8; 32],
    pub action: &'static str,
    pub data: Value,
    pub metadata: Map<String, Value>,
    /// Offset from the fixture epoch, in seconds.
    pub offset_secs: i64,
    /// Index of the vector this one links to, if any.
    pub previous: Option<usize>,
    /// Expected canonical unsigned view.
    pub expected_canonical: &'static str,
    /// Expected hash (hex).
    pub expected_hash: &'static str,
    /// Expected signature (base64).
    pub expected_signature: &'static str,
}

/// Get all golden proof vectors, in chain order.
pub fn all_vectors() -> Vec<GoldenVector> {
    let mut model = Map::new();
    model.insert("model".into(), json!("m-1"));

    vec![
        GoldenVector {
            name: "genesis decision with nested data",
            seed: [0x42; 32],
            action: "decision",
            // Keys deliberately out of order.
            data: json!({"reason": {"score": 3, "risk": "low"}, "choice": "deploy"}),
            metadata: Map::new(),
            offset_secs: 0,
            previous: None,
            expected_canonical: r#"{"action":"decision","agentId":"agent_3097e2dee2cb4a34b53840cdb705aed7","data":{"choice":"deploy","reason":{"risk":"low","score":3}},"metadata":{},"previousHash":null,"timestamp":"2025-01-14T12:00:00.000Z","version":"1.0"}"#,
            expected_hash: "ef24001764c7302e60560eea8dba184d5315480845586bc3c5af7c5015777da6",
            expected_signature: "Pnz2S1X67AwzV+yRJ7YlksrQb1ZsE2Wn5cx25ZivcoZ66cjtui2rU7jwq9AzJsnTtXyiZxCHuOualbhuvhpmCQ==",
        },
        GoldenVector {
            name: "linked tool call with metadata",
            seed: [0x42; 32],
            action: "tool_call",
            data: json!({"tool": "search", "args": {"q": "rust", "n": 3}}),
            metadata: model,
            offset_secs: 1,
            previous: Some(0),
            expected_canonical: r#"{"action":"tool_call","agentId":"agent_3097e2dee2cb4a34b53840cdb705aed7","data":{"args":{"n":3,"q":"rust"},"tool":"search"},"metadata":{"model":"m-1"},"previousHash":"ef24001764c7302e60560eea8dba184d5315480845586bc3c5af7c5015777da6","timestamp":"2025-01-14T12:00:01.000Z","version":"1.0"}"#,
            expected_hash: "6ffe36f0620a1313ec456a6f667a49edd191b108ea0d220ee30fa335b7cb49da",
            expected_signature: "8uh9UPeOVP2qyaDk0ZfOw4bSYGCVwvWuagDRCcQ9V6DsQrQduQUjKRwpPNpQBimltgTUzjrIruFp+o4PCBHpDg==",
        },
    ]
}

/// Build the proof described by a vector.
pub fn proof_from_vector(vector: &GoldenVector, previous: Option<Sha256Hash>) -> Proof {
    let identity = Identity::from_keypair(Keypair::from_seed(&vector.seed), epoch());
    ProofBuilder::new(vector.action)
        .data(vector.data.clone())
        .metadata(vector.metadata.clone())
        .previous(previous)
        .timestamp(epoch() + Duration::seconds(vector.offset_secs))
        .sign(&identity)
        .unwrap_or_else(|e| panic!("vector identity must sign: {e}"))
}

/// Check every vector, returning a description of the first mismatch.
pub fn verify_all_vectors() -> Result<(), String> {
    for vector in identity_vectors() {
        let identity = Identity::from_keypair(Keypair::from_seed(&vector.seed), epoch());
        if identity.public_key().to_base64() != vector.public_key_base64 {
            return Err(format!("public key mismatch for seed {:#04x}", vector.seed[0]));
        }
        if identity.agent_id().as_str() != vector.agent_id {
            return Err(format!("agent id mismatch for seed {:#04x}", vector.seed[0]));
        }
    }

    let vectors = all_vectors();
    let mut built: Vec<Proof> = Vec::with_capacity(vectors.len());
    for vector in &vectors {
        let previous = vector.previous.and_then(|i| built.get(i)).map(|p| p.hash);
        let proof = proof_from_vector(vector, previous);

        if proof.canonical_bytes().as_str() != vector.expected_canonical {
            return Err(format!("{}: canonical bytes differ", vector.name));
        }
        if proof.hash.to_hex() != vector.expected_hash {
            return Err(format!("{}: hash differs", vector.name));
        }
        if proof.signature.to_base64() != vector.expected_signature {
            return Err(format!("{}: signature differs", vector.name));
        }
        built.push(proof);
    }
    Ok(())
}
