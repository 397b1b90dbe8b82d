//! Canonical JSON encoding for deterministic hashing and signing.
//!
//! Rules:
//! - Object keys sorted by UTF-8 byte order at every nesting level
//! - Array element order preserved
//! - No insignificant whitespace
//! - Integers in plain decimal; integral floats below 2^53 written as integers;
//!   any other float uses the shortest round-trip form
//! - Strings escape only `"`, `\` and control characters
//!
//! The encoder walks the value itself and never relies on the map order of
//! the JSON library. Producer and verifier must agree on every byte here, so
//! changing these rules invalidates every existing signature.

use serde::Serialize;
use serde_json::{Map, Number, Value};

use crate::crypto::Sha256Hash;
use crate::error::Result;

/// Largest magnitude at which every integer is exactly representable as f64.
const MAX_SAFE_FLOAT_INT: f64 = 9_007_199_254_740_992.0;

/// Bytes produced by the canonical encoder.
///
/// The inner buffer is private: the only constructors run the encoder, so a
/// hash or signature can't be computed over a non-canonical serialization.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Canonicalize any serializable value.
    pub fn new(obj: &impl Serialize) -> Result<Self> {
        let value = serde_json::to_value(obj)?;
        Ok(Self::from_value(&value))
    }

    /// Canonicalize a JSON value.
    pub fn from_value(value: &Value) -> Self {
        let mut buf = Vec::new();
        write_value(&mut buf, value);
        Self(buf)
    }

    /// Canonicalize an object while leaving out the named top-level fields.
    ///
    /// This is the signing view shared by proofs (which exclude `hash` and
    /// `signature`) and signed messages (which exclude `signature`).
    pub fn from_object_excluding(object: &Map<String, Value>, excluded: &[&str]) -> Self {
        let mut buf = Vec::new();
        write_object(&mut buf, object, excluded);
        Self(buf)
    }

    /// The canonical bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// SHA-256 of the canonical bytes.
    pub fn hash(&self) -> Sha256Hash {
        Sha256Hash::hash(&self.0)
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }

    /// The bytes as text. Always valid UTF-8 since the encoder only writes
    /// ASCII punctuation and the UTF-8 of input strings.
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).unwrap_or_default()
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Canonicalize a JSON value.
pub fn canonicalize(value: &Value) -> CanonicalBytes {
    CanonicalBytes::from_value(value)
}

/// Recursively encode a JSON value.
fn write_value(buf: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Null => buf.extend_from_slice(b"null"),
        Value::Bool(true) => buf.extend_from_slice(b"true"),
        Value::Bool(false) => buf.extend_from_slice(b"false"),
        Value::Number(n) => write_number(buf, n),
        Value::String(s) => write_string(buf, s),
        Value::Array(items) => {
            buf.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    buf.push(b',');
                }
                write_value(buf, item);
            }
            buf.push(b']');
        }
        Value::Object(map) => write_object(buf, map, &[]),
    }
}

/// Encode an object with its keys sorted, recursing into every value.
fn write_object(buf: &mut Vec<u8>, map: &Map<String, Value>, excluded: &[&str]) {
    let mut entries: Vec<(&String, &Value)> = map
        .iter()
        .filter(|(k, _)| !excluded.contains(&k.as_str()))
        .collect();
    entries.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));

    buf.push(b'{');
    for (i, (key, value)) in entries.into_iter().enumerate() {
        if i > 0 {
            buf.push(b',');
        }
        write_string(buf, key);
        buf.push(b':');
        write_value(buf, value);
    }
    buf.push(b'}');
}

fn write_number(buf: &mut Vec<u8>, n: &Number) {
    if let Some(i) = n.as_i64() {
        buf.extend_from_slice(i.to_string().as_bytes());
    } else if let Some(u) = n.as_u64() {
        buf.extend_from_slice(u.to_string().as_bytes());
    } else if let Some(f) = n.as_f64() {
        if f.fract() == 0.0 && f.abs() < MAX_SAFE_FLOAT_INT {
            // Covers -0.0 as well, which prints as 0.
            buf.extend_from_slice((f as i64).to_string().as_bytes());
        } else {
            buf.extend_from_slice(n.to_string().as_bytes());
        }
    }
}

fn write_string(buf: &mut Vec<u8>, s: &str) {
    const HEX: &[u8; 16] = b"0123456789abcdef";

    buf.push(b'"');
    for &byte in s.as_bytes() {
        match byte {
            b'"' => buf.extend_from_slice(b"\\\""),
            b'\\' => buf.extend_from_slice(b"\\\\"),
            b'\n' => buf.extend_from_slice(b"\\n"),
            b'\r' => buf.extend_from_slice(b"\\r"),
            b'\t' => buf.extend_from_slice(b"\\t"),
            0x08 => buf.extend_from_slice(b"\\b"),
            0x0c => buf.extend_from_slice(b"\\f"),
            0x00..=0x1f => {
                buf.extend_from_slice(b"\\u00");
                buf.push(HEX[(byte >> 4) as usize]);
                buf.push(HEX[(byte & 0x0f) as usize]);
            }
            _ => buf.push(byte),
        }
    }
    buf.push(b'"');
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn json_value() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(Value::from),
            any::<u64>().prop_map(Value::from),
            (-1.0e12f64..1.0e12).prop_map(Value::from),
            ".{0,12}".prop_map(Value::String),
        ];
        leaf.prop_recursive(4, 32, 6, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
                prop::collection::btree_map(".{0,6}", inner, 0..6)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    fn reversed(value: &Value) -> Value {
        match value {
            Value::Object(map) => Value::Object(
                map.iter().rev().map(|(k, v)| (k.clone(), reversed(v))).collect(),
            ),
            Value::Array(items) => Value::Array(items.iter().map(reversed).collect()),
            other => other.clone(),
        }
    }

    proptest! {
        #[test]
        fn output_is_valid_json_and_stable(value in json_value()) {
            let bytes = canonicalize(&value);
            let parsed: Value = serde_json::from_slice(bytes.as_bytes()).unwrap();
            prop_assert_eq!(canonicalize(&parsed), bytes);
        }

        #[test]
        fn insertion_order_is_irrelevant(value in json_value()) {
            prop_assert_eq!(canonicalize(&value), canonicalize(&reversed(&value)));
        }
    }
}
