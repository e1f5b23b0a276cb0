//! Canonical request hashing
//!
//! A request hash is the SHA-256 hex digest of a stable JSON rendering:
//! object keys are lexicographically sorted at every depth, output is compact
//! (no whitespace), and big integers are serialized as decimal strings by
//! their own serde impls before they reach this layer. The rendering must be
//! bit-exact between the party that stamps `hash` on a request and every
//! party that later verifies it.

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::errors::{CoreError, CoreResult};

/// Render a value in canonical JSON form
pub fn canonical_json<T: Serialize>(value: &T) -> CoreResult<String> {
    let value = serde_json::to_value(value)
        .map_err(|e| CoreError::serialization(format!("canonicalization failed: {e}")))?;
    let mut out = String::new();
    write_canonical(&value, &mut out)?;
    Ok(out)
}

/// SHA-256 hex digest of the canonical JSON rendering
pub fn digest_hex<T: Serialize>(value: &T) -> CoreResult<String> {
    let canonical = canonical_json(value)?;
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

fn write_canonical(value: &Value, out: &mut String) -> CoreResult<()> {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => {
            let escaped = serde_json::to_string(s)
                .map_err(|e| CoreError::serialization(format!("string escape failed: {e}")))?;
            out.push_str(&escaped);
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out)?;
            }
            out.push(']');
        }
        Value::Object(map) => {
            // serde_json may preserve insertion order depending on features;
            // sort explicitly so the digest never depends on that.
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                let escaped = serde_json::to_string(key)
                    .map_err(|e| CoreError::serialization(format!("key escape failed: {e}")))?;
                out.push_str(&escaped);
                out.push(':');
                if let Some(item) = map.get(key) {
                    write_canonical(item, out)?;
                }
            }
            out.push('}');
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keys_are_sorted_recursively() {
        let value = json!({"b": {"d": 1, "c": 2}, "a": [true, null]});
        let canonical = canonical_json(&value).unwrap();
        assert_eq!(canonical, r#"{"a":[true,null],"b":{"c":2,"d":1}}"#);
    }

    #[test]
    fn digest_is_stable_across_key_order() {
        let one = json!({"x": 1, "y": "z"});
        let two = json!({"y": "z", "x": 1});
        assert_eq!(digest_hex(&one).unwrap(), digest_hex(&two).unwrap());
    }

    #[test]
    fn digest_changes_with_content() {
        let one = json!({"amount": "100"});
        let two = json!({"amount": "101"});
        assert_ne!(digest_hex(&one).unwrap(), digest_hex(&two).unwrap());
    }
}
