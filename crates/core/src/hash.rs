//! # Claim Hashing
//!
//! Canonical serialization and SHA-256 hex digests for commitment hashes. A
//! commitment hash must be reproducible by any party holding the same claim
//! data, so object keys are serialized in sorted order regardless of how the
//! input map is ordered.

use std::fmt::Write;

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Serialize a JSON value with all object keys sorted, recursively.
#[must_use]
pub fn canonicalize(value: &Value) -> String {
    sorted(value).to_string()
}

/// Compute the SHA-256 digest of the canonical serialization of `value`,
/// hex-encoded.
#[must_use]
pub fn commitment_hash(value: &Value) -> String {
    sha256_hex(&canonicalize(value))
}

/// SHA-256 digest of a UTF-8 string, hex-encoded.
#[must_use]
pub fn sha256_hex(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    digest.iter().fold(String::with_capacity(64), |mut hex, b| {
        let _ = write!(hex, "{b:02x}");
        hex
    })
}

fn sorted(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by_key(|(k, _)| k.as_str());

            let mut out = serde_json::Map::new();
            for (k, v) in entries {
                out.insert(k.clone(), sorted(v));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(sorted).collect()),
        _ => value.clone(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn key_order_is_stable() {
        let a = json!({"name": "Alice", "birthDate": "1990-01-01", "nationality": "NZ"});
        let b = json!({"nationality": "NZ", "name": "Alice", "birthDate": "1990-01-01"});
        assert_eq!(commitment_hash(&a), commitment_hash(&b));
    }

    #[test]
    fn nested_objects_are_sorted() {
        let value = json!({"z": {"b": 1, "a": 2}, "a": [{"y": 1, "x": 2}]});
        assert_eq!(canonicalize(&value), r#"{"a":[{"x":2,"y":1}],"z":{"a":2,"b":1}}"#);
    }

    #[test]
    fn sha256_hex_known_vector() {
        // RFC 6234 test vector for "abc"
        assert_eq!(
            sha256_hex("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
