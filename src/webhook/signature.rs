//! Plisio callback signature (HMAC-SHA1 over the body minus `verify_hash`).
//!
//! The signed text is the compact JSON of the remaining fields in their
//! received order. Numbers are re-rendered by `serde_json`, so a float the
//! sender formatted differently (e.g. `1e-7` vs `0.0000001`) fails to verify.

use ring::hmac;
use serde_json::{Map, Value};

pub const VERIFY_HASH_FIELD: &str = "verify_hash";

/// True iff `data` is an object whose `verify_hash` matches the HMAC of the rest.
pub fn verify_callback_data(secret: &[u8], data: &Value) -> bool {
    let Value::Object(fields) = data else {
        return false;
    };
    let Some(expected) = fields.get(VERIFY_HASH_FIELD).and_then(Value::as_str) else {
        return false;
    };
    if secret.is_empty() || expected.is_empty() {
        return false;
    }
    let Ok(expected) = hex::decode(expected) else {
        return false;
    };

    let key = hmac::Key::new(hmac::HMAC_SHA1_FOR_LEGACY_USE_ONLY, secret);
    hmac::verify(&key, signed_text(fields).as_bytes(), &expected).is_ok()
}

/// Lowercase hex HMAC of `fields` without `verify_hash`.
pub fn sign_callback_data(secret: &[u8], fields: &Map<String, Value>) -> String {
    let key = hmac::Key::new(hmac::HMAC_SHA1_FOR_LEGACY_USE_ONLY, secret);
    hex::encode(hmac::sign(&key, signed_text(fields).as_bytes()).as_ref())
}

fn signed_text(fields: &Map<String, Value>) -> String {
    let ordered: Map<String, Value> = fields
        .iter()
        .filter(|(key, _)| key.as_str() != VERIFY_HASH_FIELD)
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    Value::Object(ordered).to_string()
}
