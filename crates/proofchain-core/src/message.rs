//! Signed messages.
//!
//! Any JSON object can be signed by an identity. The signature covers the
//! canonical bytes of every field except `signature` itself, so messages and
//! proofs share one canonicalizer and one trust root.

use serde_json::{Map, Value};

use crate::canonical::CanonicalBytes;
use crate::crypto::{PublicKey, Signature};
use crate::error::{CoreError, Result};
use crate::identity::Identity;

/// Field holding the message signature.
pub const SIGNATURE_FIELD: &str = "signature";

fn signing_view(object: &Map<String, Value>) -> CanonicalBytes {
    CanonicalBytes::from_object_excluding(object, &[SIGNATURE_FIELD])
}

/// Sign a JSON object, returning it with a `signature` field attached.
///
/// An existing `signature` is replaced. Non-objects are rejected.
pub fn sign_message(message: Value, identity: &Identity) -> Result<Value> {
    let Value::Object(mut object) = message else {
        return Err(CoreError::MalformedRecord("message must be a JSON object".into()));
    };
    let keypair = identity.keypair()?;
    let signature = keypair.sign(signing_view(&object).as_bytes());
    object.insert(SIGNATURE_FIELD.into(), Value::String(signature.to_base64()));
    Ok(Value::Object(object))
}

/// Check a signed message against a public key.
///
/// Anything malformed (not an object, no signature, bad encoding) is `false`.
pub fn verify_message(message: &Value, public_key: &PublicKey) -> bool {
    let Some(object) = message.as_object() else {
        return false;
    };
    let Some(signature) = object
        .get(SIGNATURE_FIELD)
        .and_then(Value::as_str)
        .and_then(|s| Signature::from_base64(s).ok())
    else {
        return false;
    };
    public_key.verify(signing_view(object).as_bytes(), &signature)
}
