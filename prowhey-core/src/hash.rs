//! Deterministic canonical-JSON content hash (spec.md §4.1).
//!
//! Canonicalisation relies on `serde_json`'s default `Map` being a
//! `BTreeMap` (lexicographically key-sorted) as long as the
//! `preserve_order` feature is never enabled anywhere in the dependency
//! graph, and on `serde_json`'s float formatter already producing the
//! shortest round-trip decimal representation. Round-tripping a payload
//! through `Value` before hashing normalizes away any incidental key order
//! or whitespace differences between ingest paths.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::CoreError;

/// Compute the canonical content hash of a serializable payload.
///
/// The same logical payload always hashes identically regardless of which
/// ingest path (webhook, read-through, full refresh) produced it — this is
/// what lets the full refresh detect "nothing changed" and skip the
/// journal append entirely.
pub fn content_hash<T: Serialize>(payload: &T) -> Result<String, CoreError> {
    let value = serde_json::to_value(payload).map_err(CoreError::Serialization)?;
    let canonical = serde_json::to_string(&value).map_err(CoreError::Serialization)?;
    let digest = Sha256::digest(canonical.as_bytes());
    Ok(hex::encode(digest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn hash_is_independent_of_key_insertion_order() {
        let a = json!({"b": 2, "a": 1, "c": [1, 2, 3]});
        let b = json!({"a": 1, "c": [1, 2, 3], "b": 2});
        assert_eq!(content_hash(&a).unwrap(), content_hash(&b).unwrap());
    }

    #[test]
    fn hash_distinguishes_array_order() {
        let a = json!({"items": [1, 2, 3]});
        let b = json!({"items": [3, 2, 1]});
        assert_ne!(content_hash(&a).unwrap(), content_hash(&b).unwrap());
    }

    #[test]
    fn hash_is_fixed_width_lowercase_hex() {
        let digest = content_hash(&json!({"x": 1})).unwrap();
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn hash_is_stable_across_reparse() {
        let raw = r#"{"z":1,"a":2}"#;
        let value: serde_json::Value = serde_json::from_str(raw).unwrap();
        let reparsed: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&value).unwrap()).unwrap();
        assert_eq!(content_hash(&value).unwrap(), content_hash(&reparsed).unwrap());
    }

    proptest::proptest! {
        #[test]
        fn hash_determinism_holds_for_arbitrary_objects(
            a in proptest::num::i64::ANY,
            b in ".*",
            c in proptest::collection::vec(proptest::num::i32::ANY, 0..8),
        ) {
            let value = json!({"a": a, "b": b, "c": c});
            let reparsed: serde_json::Value =
                serde_json::from_str(&serde_json::to_string(&value).unwrap()).unwrap();
            proptest::prop_assert_eq!(
                content_hash(&value).unwrap(),
                content_hash(&reparsed).unwrap()
            );
        }
    }
}
