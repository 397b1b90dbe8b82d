//! Property tests over generated payloads and identities.

use proofchain::primitives::canonicalize;
use proofchain::{verify_values, AgentId, ProofBuilder, VerificationError, VerifyOptions};
use proofchain_testkit::generators::{identity, json_value, proof_from_params, reverse_key_order, ProofParams};
use proofchain_testkit::{epoch, TestFixture};
use proptest::prelude::*;
use serde_json::json;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn derive_is_deterministic(id in identity()) {
        prop_assert_eq!(AgentId::derive(id.public_key()), AgentId::derive(id.public_key()));
        prop_assert_eq!(id.agent_id().as_str().len(), 38);
    }

    #[test]
    fn hash_and_signature_round_trip(params: ProofParams) {
        let proof = proof_from_params(&params);
        prop_assert!(proof.hash_matches());
        prop_assert!(proof.signature_valid(params.identity().public_key()));
    }

    #[test]
    fn key_order_never_changes_the_hash(data in json_value()) {
        let fixture = TestFixture::with_seed([21; 32]);
        let build = |data: serde_json::Value| {
            ProofBuilder::new("decision")
                .data(data)
                .timestamp(epoch())
                .sign(&fixture.identity)
                .unwrap()
        };
        let a = build(data.clone());
        let b = build(reverse_key_order(&data));
        prop_assert_eq!(a.hash, b.hash);
    }

    #[test]
    fn canonical_output_parses_back(data in json_value()) {
        let bytes = canonicalize(&data);
        let parsed: serde_json::Value = serde_json::from_slice(bytes.as_bytes()).unwrap();
        prop_assert_eq!(canonicalize(&parsed), bytes);
    }

    #[test]
    fn any_payload_change_is_detected(data in json_value()) {
        let fixture = TestFixture::with_seed([22; 32]);
        let mut values = fixture.chain_values(3);
        prop_assume!(canonicalize(&values[1]["data"]) != canonicalize(&data));
        values[1]["data"] = data;
        let report = verify_values(&values, fixture.public_key(), &VerifyOptions::default());
        prop_assert_eq!(report.failing_indices(), vec![1]);
        let is_hash_mismatch = matches!(report.errors[0], VerificationError::HashMismatch { index: 1, .. });
        prop_assert!(is_hash_mismatch);
    }

    #[test]
    fn chain_break_stays_local(n in 3usize..8, k_seed in any::<usize>()) {
        let k = 1 + k_seed % (n - 1);
        let fixture = TestFixture::with_seed([23; 32]);
        let mut values = fixture.chain_values(n);
        values[k]["previousHash"] = json!("ee".repeat(32));
        let report = verify_values(&values, fixture.public_key(), &VerifyOptions::default());
        prop_assert_eq!(report.failing_indices(), vec![k]);
    }
}
