//! Verification engine for untrusted chains.
//!
//! Input is treated as adversarial JSON. Every defect is reported as data in
//! a [`VerificationReport`]; nothing here returns `Err` or panics because of
//! what a chain contains. A single hard error makes the chain invalid, but the
//! full list of problems is always returned.
//!
//! Per-proof checks (structure, identity, hash, signature) are independent and
//! run in parallel. Linkage, temporal and homogeneity checks walk the proofs
//! in the order given.

use chrono::{DateTime, Duration, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::canonical::CanonicalBytes;
use crate::chain::ChainDocument;
use crate::crypto::{PublicKey, Signature};
use crate::identity::AgentId;
use crate::proof::{fields, parse_timestamp, Proof, PROOF_VERSION};

/// Default tolerance for clock skew between consecutive proofs.
pub const DEFAULT_CLOCK_SKEW_SECS: u64 = 60;

/// Knobs for a verification run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifyOptions {
    /// Allowed skew, in seconds, before a timestamp is flagged.
    pub clock_skew_tolerance_secs: u64,

    /// Accept a first proof with a non-null `previousHash` (truncated export).
    pub allow_partial: bool,

    /// Time used for the future-timestamp check; `None` means now.
    pub reference_time: Option<DateTime<Utc>>,
}

impl Default for VerifyOptions {
    fn default() -> Self {
        Self {
            clock_skew_tolerance_secs: DEFAULT_CLOCK_SKEW_SECS,
            allow_partial: false,
            reference_time: None,
        }
    }
}

impl VerifyOptions {
    fn tolerance(&self) -> Duration {
        // chrono durations top out at i64::MAX milliseconds.
        let secs = i64::try_from(self.clock_skew_tolerance_secs).unwrap_or(i64::MAX);
        Duration::seconds(secs.min(i64::MAX / 1000))
    }
}

/// A hard verification failure.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VerificationError {
    /// A required field is missing or has the wrong shape.
    #[error("{}: field `{field}` {reason}", location(.index))]
    Structural {
        index: Option<usize>,
        field: String,
        reason: String,
    },

    /// Recomputed hash differs from the stored one (content tampering).
    #[error("proof {index}: hash mismatch (stored {stored}, computed {computed})")]
    HashMismatch {
        index: usize,
        stored: String,
        computed: String,
    },

    /// Signature does not verify under the supplied public key.
    #[error("proof {index}: signature does not verify")]
    SignatureInvalid { index: usize },

    /// `previousHash` does not match the preceding proof.
    #[error("proof {index}: chain break (expected previousHash {}, found {})", show(.expected), show(.found))]
    ChainBreak {
        index: usize,
        expected: Option<String>,
        found: Option<String>,
    },

    /// The claimed identifier does not belong to the supplied public key.
    #[error("{}: identifier {found} does not match public key (expected {expected})", location(.index))]
    IdentityMismatch {
        index: Option<usize>,
        expected: AgentId,
        found: String,
    },

    /// The chain mixes identifiers.
    #[error("proof {index}: identifier {found} differs from chain identifier {expected}")]
    MixedIdentifiers {
        index: usize,
        expected: String,
        found: String,
    },
}

impl VerificationError {
    /// The offending proof index, or `None` for document-level problems.
    pub fn index(&self) -> Option<usize> {
        match self {
            Self::Structural { index, .. } | Self::IdentityMismatch { index, .. } => *index,
            Self::HashMismatch { index, .. }
            | Self::SignatureInvalid { index }
            | Self::ChainBreak { index, .. }
            | Self::MixedIdentifiers { index, .. } => Some(*index),
        }
    }
}

/// Direction of a clock-skew warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkewDirection {
    /// Earlier than the preceding proof by more than the tolerance.
    Regression,
    /// Later than the reference time by more than the tolerance.
    FutureDated,
}

/// A non-fatal finding.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VerificationWarning {
    #[error("proof {index}: clock skew ({direction:?}, {skew_ms} ms beyond tolerance)")]
    ClockSkew {
        index: usize,
        direction: SkewDirection,
        skew_ms: i64,
    },
}

impl VerificationWarning {
    pub fn index(&self) -> usize {
        match self {
            Self::ClockSkew { index, .. } => *index,
        }
    }
}

/// Outcome of a verification run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationReport {
    /// True only when `errors` is empty.
    pub valid: bool,
    pub proof_count: usize,
    pub errors: Vec<VerificationError>,
    pub warnings: Vec<VerificationWarning>,
}

impl VerificationReport {
    fn new(proof_count: usize, mut errors: Vec<VerificationError>, warnings: Vec<VerificationWarning>) -> Self {
        errors.sort_by_key(VerificationError::index);
        Self {
            valid: errors.is_empty(),
            proof_count,
            errors,
            warnings,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Errors naming a given proof index.
    pub fn errors_at(&self, index: usize) -> impl Iterator<Item = &VerificationError> {
        self.errors.iter().filter(move |e| e.index() == Some(index))
    }

    /// Distinct proof indices with at least one error, ascending.
    pub fn failing_indices(&self) -> Vec<usize> {
        let mut indices: Vec<usize> = self.errors.iter().filter_map(VerificationError::index).collect();
        indices.dedup();
        indices
    }
}

/// Verify typed proofs against a public key.
pub fn verify_proofs(proofs: &[Proof], public_key: &PublicKey, options: &VerifyOptions) -> VerificationReport {
    let values: Vec<Value> = proofs
        .iter()
        .map(|p| serde_json::to_value(p).unwrap_or(Value::Null))
        .collect();
    verify_values(&values, public_key, options)
}

/// Verify proofs given as raw JSON values against a public key.
pub fn verify_values(proofs: &[Value], public_key: &PublicKey, options: &VerifyOptions) -> VerificationReport {
    run(proofs, Some(public_key), options, Vec::new())
}

/// Verify a typed chain document using its embedded public key.
pub fn verify_chain(document: &ChainDocument, options: &VerifyOptions) -> VerificationReport {
    match serde_json::to_value(document) {
        Ok(value) => verify_document(&value, options),
        Err(e) => VerificationReport::new(
            document.proofs.len(),
            vec![structural(None, "<document>", format!("cannot be serialized: {e}"))],
            Vec::new(),
        ),
    }
}

/// Verify an exported chain document given as raw JSON.
///
/// The public key comes from `metadata.publicKey`; `metadata.partial` enables
/// partial-chain mode; `metadata.agentId`, when present, must match the key.
pub fn verify_document(document: &Value, options: &VerifyOptions) -> VerificationReport {
    let Some(root) = document.as_object() else {
        return VerificationReport::new(0, vec![structural(None, "<document>", "is not a JSON object")], Vec::new());
    };
    let Some(proofs) = root.get("proofs").and_then(Value::as_array) else {
        return VerificationReport::new(0, vec![structural(None, "proofs", "is missing or not an array")], Vec::new());
    };

    let mut doc_errors = Vec::new();
    let mut options = options.clone();
    let mut public_key = None;

    match root.get("metadata").and_then(Value::as_object) {
        None => doc_errors.push(structural(None, "metadata", "is missing or not an object")),
        Some(metadata) => {
            match metadata.get("publicKey").and_then(Value::as_str) {
                None => doc_errors.push(structural(None, "metadata.publicKey", "is missing or not a string")),
                Some(encoded) => match PublicKey::from_base64(encoded) {
                    Ok(key) => public_key = Some(key),
                    Err(e) => doc_errors.push(structural(None, "metadata.publicKey", e.to_string())),
                },
            }
            if let (Some(key), Some(claimed)) = (&public_key, metadata.get("agentId").and_then(Value::as_str)) {
                let expected = AgentId::derive(key);
                if expected.as_str() != claimed {
                    doc_errors.push(VerificationError::IdentityMismatch {
                        index: None,
                        expected,
                        found: claimed.to_string(),
                    });
                }
            }
            if metadata.get("partial").and_then(Value::as_bool) == Some(true) {
                options.allow_partial = true;
            }
        }
    }

    run(proofs, public_key.as_ref(), &options, doc_errors)
}

/// Fields the linkage, temporal and homogeneity passes need from one proof.
#[derive(Default)]
struct LinkFields {
    /// `Some(None)` for an explicit null, `None` when missing or malformed.
    previous_hash: Option<Option<String>>,
    hash: Option<String>,
    agent_id: Option<String>,
    timestamp: Option<DateTime<Utc>>,
}

struct ProofCheck {
    errors: Vec<VerificationError>,
    link: LinkFields,
}

fn run(
    proofs: &[Value],
    public_key: Option<&PublicKey>,
    options: &VerifyOptions,
    mut errors: Vec<VerificationError>,
) -> VerificationReport {
    let expected_id = public_key.map(AgentId::derive);

    let checks: Vec<ProofCheck> = proofs
        .par_iter()
        .enumerate()
        .map(|(index, value)| check_proof(index, value, public_key, expected_id.as_ref()))
        .collect();

    let mut links = Vec::with_capacity(checks.len());
    for check in checks {
        errors.extend(check.errors);
        links.push(check.link);
    }

    check_linkage(&links, options, &mut errors);
    check_homogeneity(&links, expected_id.as_ref(), &mut errors);
    let warnings = check_timestamps(&links, options);

    VerificationReport::new(proofs.len(), errors, warnings)
}

/// Steps 1-4 for a single proof: structure, identity, hash, signature.
fn check_proof(
    index: usize,
    value: &Value,
    public_key: Option<&PublicKey>,
    expected_id: Option<&AgentId>,
) -> ProofCheck {
    let mut errors = Vec::new();
    let mut link = LinkFields::default();

    let Some(object) = value.as_object() else {
        errors.push(structural(Some(index), "<proof>", "is not a JSON object"));
        return ProofCheck { errors, link };
    };

    if let Some(version) = require_str(object, fields::VERSION, index, &mut errors) {
        if version != PROOF_VERSION {
            errors.push(structural(Some(index), fields::VERSION, format!("has unsupported value {version:?}")));
        }
    }
    require_str(object, fields::ACTION, index, &mut errors);
    if !object.contains_key(fields::DATA) {
        errors.push(structural(Some(index), fields::DATA, "is missing"));
    }
    link.agent_id = require_str(object, fields::AGENT_ID, index, &mut errors).map(str::to_string);
    match object.get(fields::PREVIOUS_HASH) {
        None => errors.push(structural(Some(index), fields::PREVIOUS_HASH, "is missing")),
        Some(Value::Null) => link.previous_hash = Some(None),
        Some(Value::String(s)) => link.previous_hash = Some(Some(s.clone())),
        Some(_) => errors.push(structural(Some(index), fields::PREVIOUS_HASH, "must be a string or null")),
    }
    if let Some(ts) = require_str(object, fields::TIMESTAMP, index, &mut errors) {
        match parse_timestamp(ts) {
            Ok(parsed) => link.timestamp = Some(parsed),
            Err(e) => errors.push(structural(Some(index), fields::TIMESTAMP, e.to_string())),
        }
    }
    if let Some(metadata) = object.get(fields::METADATA) {
        if !metadata.is_object() {
            errors.push(structural(Some(index), fields::METADATA, "must be an object"));
        }
    }
    link.hash = require_str(object, fields::HASH, index, &mut errors).map(str::to_string);
    let signature = require_str(object, fields::SIGNATURE, index, &mut errors);

    // A malformed proof skips the cryptographic checks; its siblings do not.
    if !errors.is_empty() {
        return ProofCheck { errors, link };
    }

    if let (Some(expected), Some(found)) = (expected_id, link.agent_id.as_deref()) {
        if expected.as_str() != found {
            errors.push(VerificationError::IdentityMismatch {
                index: Some(index),
                expected: expected.clone(),
                found: found.to_string(),
            });
        }
    }

    let canonical = CanonicalBytes::from_object_excluding(object, fields::UNSIGNED);
    let computed = canonical.hash().to_hex();
    let stored = link.hash.clone().unwrap_or_default();
    if computed != stored {
        // The content is already known to be altered; the signature over it
        // cannot tell us anything more.
        errors.push(VerificationError::HashMismatch { index, stored, computed });
        return ProofCheck { errors, link };
    }

    if let Some(public_key) = public_key {
        let valid = signature
            .and_then(|s| Signature::from_base64(s).ok())
            .is_some_and(|sig| public_key.verify(canonical.as_bytes(), &sig));
        if !valid {
            errors.push(VerificationError::SignatureInvalid { index });
        }
    }

    ProofCheck { errors, link }
}

/// Step 5: every proof links to the stored hash of its predecessor.
fn check_linkage(links: &[LinkFields], options: &VerifyOptions, errors: &mut Vec<VerificationError>) {
    for (index, link) in links.iter().enumerate() {
        let Some(found) = &link.previous_hash else {
            continue;
        };
        if index == 0 {
            if found.is_some() && !options.allow_partial {
                errors.push(VerificationError::ChainBreak {
                    index,
                    expected: None,
                    found: found.clone(),
                });
            }
            continue;
        }
        let Some(expected) = &links[index - 1].hash else {
            continue;
        };
        if found.as_deref() != Some(expected.as_str()) {
            errors.push(VerificationError::ChainBreak {
                index,
                expected: Some(expected.clone()),
                found: found.clone(),
            });
        }
    }
}

/// Step 7: one identifier per chain.
///
/// The reference is the identifier derived from the public key when one is
/// known, so a tampered first proof does not implicate its siblings.
fn check_homogeneity(
    links: &[LinkFields],
    expected_id: Option<&AgentId>,
    errors: &mut Vec<VerificationError>,
) {
    let reference = expected_id
        .map(AgentId::as_str)
        .or_else(|| links.iter().find_map(|l| l.agent_id.as_deref()));
    let Some(first) = reference else {
        return;
    };
    for (index, link) in links.iter().enumerate() {
        if let Some(found) = link.agent_id.as_deref() {
            if found != first {
                errors.push(VerificationError::MixedIdentifiers {
                    index,
                    expected: first.to_string(),
                    found: found.to_string(),
                });
            }
        }
    }
}

/// Step 6: timestamps non-decreasing and not in the future, within tolerance.
fn check_timestamps(links: &[LinkFields], options: &VerifyOptions) -> Vec<VerificationWarning> {
    let tolerance = options.tolerance();
    let now = options.reference_time.unwrap_or_else(Utc::now);
    let mut warnings = Vec::new();
    let mut previous: Option<DateTime<Utc>> = None;

    for (index, link) in links.iter().enumerate() {
        let Some(ts) = link.timestamp else {
            continue;
        };
        if let Some(prev) = previous {
            let behind = prev - ts;
            if behind > tolerance {
                warnings.push(VerificationWarning::ClockSkew {
                    index,
                    direction: SkewDirection::Regression,
                    skew_ms: (behind - tolerance).num_milliseconds(),
                });
            }
        }
        let ahead = ts - now;
        if ahead > tolerance {
            warnings.push(VerificationWarning::ClockSkew {
                index,
                direction: SkewDirection::FutureDated,
                skew_ms: (ahead - tolerance).num_milliseconds(),
            });
        }
        previous = Some(previous.map_or(ts, |p| p.max(ts)));
    }
    warnings
}

fn require_str<'a>(
    object: &'a Map<String, Value>,
    field: &str,
    index: usize,
    errors: &mut Vec<VerificationError>,
) -> Option<&'a str> {
    match object.get(field) {
        None => {
            errors.push(structural(Some(index), field, "is missing"));
            None
        }
        Some(Value::String(s)) => Some(s.as_str()),
        Some(_) => {
            errors.push(structural(Some(index), field, "must be a string"));
            None
        }
    }
}

fn structural(index: Option<usize>, field: &str, reason: impl Into<String>) -> VerificationError {
    VerificationError::Structural {
        index,
        field: field.to_string(),
        reason: reason.into(),
    }
}

fn location(index: &Option<usize>) -> String {
    match index {
        Some(i) => format!("proof {i}"),
        None => "document".to_string(),
    }
}

fn show(hash: &Option<String>) -> String {
    hash.clone().unwrap_or_else(|| "null".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::ChainMetadata;
    use crate::identity::Identity;
    use crate::proof::{format_timestamp, ProofBuilder};
    use chrono::TimeZone;
    use serde_json::json;

    fn identity() -> Identity {
        Identity::from_seed(&[0x11; 32])
    }

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()
    }

    fn options() -> VerifyOptions {
        VerifyOptions {
            reference_time: Some(base_time() + Duration::hours(1)),
            ..VerifyOptions::default()
        }
    }

    fn build_chain(identity: &Identity, n: usize) -> Vec<Proof> {
        let mut proofs: Vec<Proof> = Vec::new();
        for i in 0..n {
            let proof = ProofBuilder::new(if i % 2 == 0 { "decision" } else { "tool_call" })
                .data(json!({"step": i, "inner": {"value": i * 10}}))
                .previous(proofs.last().map(|p| p.hash))
                .timestamp(base_time() + Duration::seconds(i as i64))
                .sign(identity)
                .unwrap();
            proofs.push(proof);
        }
        proofs
    }

    fn values(proofs: &[Proof]) -> Vec<Value> {
        proofs.iter().map(|p| p.to_value().unwrap()).collect()
    }

    #[test]
    fn test_valid_chain() {
        let id = identity();
        let report = verify_proofs(&build_chain(&id, 4), id.public_key(), &options());
        assert!(report.is_valid(), "{:?}", report.errors);
        assert_eq!(report.proof_count, 4);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_empty_chain_is_valid() {
        let report = verify_values(&[], identity().public_key(), &options());
        assert!(report.is_valid());
        assert_eq!(report.proof_count, 0);
    }

    #[test]
    fn test_missing_fields_are_named_and_isolated() {
        let id = identity();
        let mut vals = values(&build_chain(&id, 3));
        let obj = vals[1].as_object_mut().unwrap();
        obj.remove("action");
        obj.remove("signature");

        let report = verify_values(&vals, id.public_key(), &options());
        assert!(!report.is_valid());
        let fields_reported: Vec<_> = report
            .errors
            .iter()
            .filter_map(|e| match e {
                VerificationError::Structural { index: Some(1), field, .. } => Some(field.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(fields_reported, vec!["action", "signature"]);
        assert_eq!(report.failing_indices(), vec![1]);
    }

    #[test]
    fn test_non_object_proof() {
        let id = identity();
        let mut vals = values(&build_chain(&id, 2));
        vals.push(json!("not a proof"));
        let report = verify_values(&vals, id.public_key(), &options());
        assert_eq!(report.failing_indices(), vec![2]);
    }

    #[test]
    fn test_unsupported_version() {
        let id = identity();
        let mut vals = values(&build_chain(&id, 1));
        vals[0]["version"] = json!("2.0");
        let report = verify_values(&vals, id.public_key(), &options());
        assert!(matches!(
            &report.errors[0],
            VerificationError::Structural { field, .. } if field == "version"
        ));
    }

    #[test]
    fn test_bad_timestamp_is_structural() {
        let id = identity();
        let mut vals = values(&build_chain(&id, 1));
        vals[0]["timestamp"] = json!("last tuesday");
        let report = verify_values(&vals, id.public_key(), &options());
        assert!(matches!(
            &report.errors[0],
            VerificationError::Structural { field, .. } if field == "timestamp"
        ));
    }

    #[test]
    fn test_payload_tamper_reports_single_hash_mismatch() {
        let id = identity();
        let mut vals = values(&build_chain(&id, 3));
        vals[1]["data"]["inner"]["value"] = json!("tampered");

        let report = verify_values(&vals, id.public_key(), &options());
        assert_eq!(report.errors.len(), 1);
        assert!(matches!(report.errors[0], VerificationError::HashMismatch { index: 1, .. }));
    }

    #[test]
    fn test_forged_hash_caught_by_signature() {
        // Attacker edits the payload and recomputes the hash, but cannot re-sign.
        let id = identity();
        let mut vals = values(&build_chain(&id, 1));
        vals[0]["data"]["step"] = json!(99);
        let obj = vals[0].as_object().unwrap();
        let rehashed = CanonicalBytes::from_object_excluding(obj, fields::UNSIGNED).hash();
        vals[0]["hash"] = json!(rehashed.to_hex());

        let report = verify_values(&vals, id.public_key(), &options());
        assert_eq!(report.errors, vec![VerificationError::SignatureInvalid { index: 0 }]);
    }

    #[test]
    fn test_malformed_signature_verifies_false() {
        let id = identity();
        let mut vals = values(&build_chain(&id, 1));
        vals[0]["signature"] = json!("%%%not-base64%%%");
        let report = verify_values(&vals, id.public_key(), &options());
        assert_eq!(report.errors, vec![VerificationError::SignatureInvalid { index: 0 }]);
    }

    #[test]
    fn test_chain_break_localized() {
        let id = identity();
        let mut vals = values(&build_chain(&id, 5));
        vals[3]["previousHash"] = json!("00".repeat(32));

        let report = verify_values(&vals, id.public_key(), &options());
        assert!(!report.is_valid());
        assert_eq!(report.failing_indices(), vec![3]);
        assert!(report
            .errors_at(3)
            .any(|e| matches!(e, VerificationError::ChainBreak { index: 3, .. })));
    }

    #[test]
    fn test_removed_proof_breaks_chain() {
        let id = identity();
        let mut proofs = build_chain(&id, 4);
        proofs.remove(1);
        let report = verify_proofs(&proofs, id.public_key(), &options());
        assert_eq!(report.failing_indices(), vec![1]);
        assert!(matches!(report.errors[0], VerificationError::ChainBreak { index: 1, .. }));
    }

    #[test]
    fn test_reordered_proofs_break_chain() {
        let id = identity();
        let mut proofs = build_chain(&id, 3);
        proofs.swap(1, 2);
        let report = verify_proofs(&proofs, id.public_key(), &options());
        assert!(!report.is_valid());
        assert!(report.errors.iter().all(|e| matches!(e, VerificationError::ChainBreak { .. })));
    }

    #[test]
    fn test_genesis_must_have_null_previous_hash() {
        let id = identity();
        let proofs = build_chain(&id, 4);
        let tail = &proofs[2..];

        let report = verify_proofs(tail, id.public_key(), &options());
        assert_eq!(report.errors.len(), 1);
        assert!(matches!(
            report.errors[0],
            VerificationError::ChainBreak { index: 0, expected: None, .. }
        ));

        let partial = VerifyOptions {
            allow_partial: true,
            ..options()
        };
        assert!(verify_proofs(tail, id.public_key(), &partial).is_valid());
    }

    #[test]
    fn test_wrong_public_key_rejected() {
        let a = identity();
        let b = Identity::from_seed(&[0x22; 32]);
        let report = verify_proofs(&build_chain(&a, 2), b.public_key(), &options());
        assert!(!report.is_valid());
        assert!(report
            .errors
            .iter()
            .any(|e| matches!(e, VerificationError::IdentityMismatch { index: Some(0), .. })));
        assert!(report
            .errors
            .iter()
            .any(|e| matches!(e, VerificationError::SignatureInvalid { index: 1 })));
    }

    #[test]
    fn test_mixed_identifiers() {
        let a = identity();
        let b = Identity::from_seed(&[0x33; 32]);
        let mut proofs = build_chain(&a, 2);
        let foreign = ProofBuilder::new("decision")
            .previous(Some(proofs[1].hash))
            .timestamp(base_time() + Duration::seconds(5))
            .sign(&b)
            .unwrap();
        proofs.push(foreign);

        let report = verify_proofs(&proofs, a.public_key(), &options());
        assert_eq!(report.failing_indices(), vec![2]);
        assert!(report
            .errors_at(2)
            .any(|e| matches!(e, VerificationError::MixedIdentifiers { .. })));
    }

    #[test]
    fn test_tampered_first_identifier_blames_only_that_proof() {
        let id = identity();
        let mut proofs = values(&build_chain(&id, 4));
        proofs[0]["agentId"] = json!(format!("agent_{}", "0".repeat(32)));

        let report = verify_values(&proofs, id.public_key(), &options());
        assert_eq!(report.failing_indices(), vec![0]);
        assert!(report
            .errors_at(0)
            .any(|e| matches!(e, VerificationError::MixedIdentifiers { .. })));
    }

    #[test]
    fn test_clock_skew_is_a_warning() {
        let id = identity();
        let first = ProofBuilder::new("a")
            .timestamp(base_time())
            .sign(&id)
            .unwrap();
        let second = ProofBuilder::new("b")
            .previous(Some(first.hash))
            .timestamp(base_time() - Duration::minutes(5))
            .sign(&id)
            .unwrap();
        let within = ProofBuilder::new("c")
            .previous(Some(second.hash))
            .timestamp(base_time() - Duration::seconds(30))
            .sign(&id)
            .unwrap();

        let report = verify_proofs(&[first, second, within], id.public_key(), &options());
        assert!(report.is_valid());
        assert_eq!(report.warnings.len(), 1);
        assert!(matches!(
            report.warnings[0],
            VerificationWarning::ClockSkew {
                index: 1,
                direction: SkewDirection::Regression,
                ..
            }
        ));
    }

    #[test]
    fn test_future_timestamp_warns() {
        let id = identity();
        let proof = ProofBuilder::new("a")
            .timestamp(base_time() + Duration::days(2))
            .sign(&id)
            .unwrap();
        let report = verify_proofs(&[proof], id.public_key(), &options());
        assert!(report.is_valid());
        assert!(matches!(
            report.warnings[0],
            VerificationWarning::ClockSkew {
                direction: SkewDirection::FutureDated,
                ..
            }
        ));
    }

    #[test]
    fn test_document_uses_embedded_key_and_partial_flag() {
        let id = identity();
        let mut doc = ChainDocument::new(ChainMetadata::new(&id, base_time()));
        doc.proofs = build_chain(&id, 4);

        assert!(verify_chain(&doc, &options()).is_valid());
        assert!(verify_chain(&doc.slice_from(2), &options()).is_valid());
    }

    #[test]
    fn test_document_metadata_defects() {
        let id = identity();
        let mut doc = serde_json::to_value(ChainDocument::new(ChainMetadata::new(&id, base_time()))).unwrap();
        doc["proofs"] = Value::Array(values(&build_chain(&id, 2)));

        let mut bad_key = doc.clone();
        bad_key["metadata"]["publicKey"] = json!("AAAA");
        let report = verify_document(&bad_key, &options());
        assert!(matches!(
            &report.errors[0],
            VerificationError::Structural { index: None, field, .. } if field == "metadata.publicKey"
        ));

        let mut bad_id = doc.clone();
        bad_id["metadata"]["agentId"] = json!("agent_deadbeef");
        let report = verify_document(&bad_id, &options());
        assert!(matches!(
            report.errors[0],
            VerificationError::IdentityMismatch { index: None, .. }
        ));

        assert!(!verify_document(&json!([]), &options()).is_valid());
        assert!(!verify_document(&json!({"metadata": {}}), &options()).is_valid());
    }

    #[test]
    fn test_report_serializes() {
        let id = identity();
        let mut vals = values(&build_chain(&id, 2));
        vals[1]["action"] = json!("rewritten");
        let report = verify_values(&vals, id.public_key(), &options());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["valid"], json!(false));
        assert_eq!(json["errors"][0]["kind"], json!("hash_mismatch"));
        assert_eq!(json["errors"][0]["index"], json!(1));
    }

    #[test]
    fn test_error_messages_name_the_index() {
        let err = VerificationError::ChainBreak {
            index: 4,
            expected: Some("ab".into()),
            found: None,
        };
        assert_eq!(err.to_string(), "proof 4: chain break (expected previousHash ab, found null)");
        let err = structural(None, "metadata", "is missing");
        assert_eq!(err.to_string(), "document: field `metadata` is missing");
    }

    #[test]
    fn test_timestamp_is_signed_verbatim() {
        let id = identity();
        let mut vals = values(&build_chain(&id, 1));
        // Same instant, different spelling: still a different signed record.
        vals[0]["timestamp"] = json!(format_timestamp(base_time()).replace(".000Z", "Z"));
        let report = verify_values(&vals, id.public_key(), &options());
        assert!(matches!(report.errors[0], VerificationError::HashMismatch { index: 0, .. }));
    }
}
