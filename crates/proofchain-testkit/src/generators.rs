//! Proptest generators for property-based testing.

use chrono::Duration;
use proptest::prelude::*;
use serde_json::{Map, Number, Value};

use proofchain_core::{Identity, Keypair, Proof, ProofBuilder, Sha256Hash};

use crate::fixtures::epoch;

/// Generate a random identity.
pub fn identity() -> impl Strategy<Value = Identity> {
    any::<[u8; 32]>().prop_map(|seed| Identity::from_keypair(Keypair::from_seed(&seed), epoch()))
}

/// Generate a random Sha256Hash.
pub fn sha256_hash() -> impl Strategy<Value = Sha256Hash> {
    any::<[u8; 32]>().prop_map(Sha256Hash)
}

/// Generate an action label.
pub fn action() -> impl Strategy<Value = String> {
    "[a-z][a-z_]{0,15}".prop_map(String::from)
}

/// Generate an object key, including non-ASCII and escape-worthy ones.
pub fn key() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z_][a-zA-Z0-9_]{0,11}".prop_map(String::from),
        prop::collection::vec(any::<char>(), 0..8).prop_map(|chars| chars.into_iter().collect()),
    ]
}

/// Generate a JSON scalar.
pub fn json_leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| Value::Number(n.into())),
        any::<u64>().prop_map(|n| Value::Number(n.into())),
        (-1.0e12f64..1.0e12f64).prop_filter_map("finite", |f| Number::from_f64(f).map(Value::Number)),
        any::<String>().prop_map(Value::String),
    ]
}

/// Generate nested JSON: objects and arrays up to a few levels deep.
pub fn json_value() -> impl Strategy<Value = Value> {
    json_leaf().prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::btree_map(key(), inner, 0..6)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

/// Generate a JSON object (the shape of proof metadata and messages).
pub fn json_object() -> impl Strategy<Value = Map<String, Value>> {
    prop::collection::btree_map(key(), json_value(), 0..6).prop_map(|m| m.into_iter().collect())
}

/// The same value with object keys inserted in reverse order at every level.
///
/// With `preserve_order` enabled the result differs in memory and in plain
/// `serde_json` output but is the same JSON document.
pub fn reverse_key_order(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut reversed = Map::new();
            for (k, v) in map.iter().rev() {
                reversed.insert(k.clone(), reverse_key_order(v));
            }
            Value::Object(reversed)
        }
        Value::Array(items) => Value::Array(items.iter().map(reverse_key_order).collect()),
        other => other.clone(),
    }
}

/// Parameters for generating a proof.
#[derive(Debug, Clone)]
pub struct ProofParams {
    pub seed: [u8; 32],
    pub action: String,
    pub data: Value,
    pub metadata: Map<String, Value>,
    pub previous: Option<Sha256Hash>,
    pub offset_secs: i64,
}

impl Arbitrary for ProofParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            any::<[u8; 32]>(),
            action(),
            json_value(),
            json_object(),
            proptest::option::of(sha256_hash()),
            0i64..=86_400i64,
        )
            .prop_map(|(seed, action, data, metadata, previous, offset_secs)| ProofParams {
                seed,
                action,
                data,
                metadata,
                previous,
                offset_secs,
            })
            .boxed()
    }
}

impl ProofParams {
    pub fn identity(&self) -> Identity {
        Identity::from_keypair(Keypair::from_seed(&self.seed), epoch())
    }
}

/// Generate a proof from parameters.
pub fn proof_from_params(params: &ProofParams) -> Proof {
    ProofBuilder::new(params.action.clone())
        .data(params.data.clone())
        .metadata(params.metadata.clone())
        .previous(params.previous)
        .timestamp(epoch() + Duration::seconds(params.offset_secs))
        .sign(&params.identity())
        .unwrap_or_else(|e| panic!("generated identity must sign: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proofchain_core::canonicalize;

    proptest! {
        #[test]
        fn reversed_order_is_same_document(value in json_value()) {
            let reversed = reverse_key_order(&value);
            prop_assert_eq!(&reversed, &value);
            prop_assert_eq!(canonicalize(&reversed), canonicalize(&value));
        }

        #[test]
        fn proof_from_params_is_deterministic(params: ProofParams) {
            prop_assert_eq!(proof_from_params(&params), proof_from_params(&params));
        }
    }
}
