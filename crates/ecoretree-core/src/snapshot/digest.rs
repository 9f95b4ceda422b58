//! Digest computation for raw documents.
//!
//! ## Determinism Guarantees
//!
//! - Same content → same digest, whatever the field order of objects
//! - Different list order → different digest (lists are ordered)

use std::collections::BTreeMap;

use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::errors::Result;

/// Compute the content digest of a document.
///
/// Object fields are sorted before hashing; list order is kept.
///
/// ## Returns
///
/// Hex-encoded SHA256 digest (64 characters)
///
/// ## Errors
///
/// Returns `SyncError::Serialization` if JSON serialization fails.
///
/// ## Example
///
/// ```
/// use ecoretree_core::snapshot::digest::compute_document_digest;
/// use serde_json::json;
///
/// let a = compute_document_digest(&json!({"name": "lib", "nsPrefix": "l"})).unwrap();
/// let b = compute_document_digest(&json!({"nsPrefix": "l", "name": "lib"})).unwrap();
/// assert_eq!(a, b);
/// assert_eq!(a.len(), 64);
/// ```
pub fn compute_document_digest(document: &Value) -> Result<String> {
    let canonical = serde_json::to_string(&canonicalize(document))?;
    Ok(hash_string(&canonical))
}

fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<&String, Value> =
                map.iter().map(|(k, v)| (k, canonicalize(v))).collect();
            Value::Object(sorted.into_iter().map(|(k, v)| (k.clone(), v)).collect())
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

/// Hash a string using SHA256.
fn hash_string(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_hash_string_deterministic() {
        let hash1 = hash_string("test");
        let hash2 = hash_string("test");
        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_digest_ignores_nested_field_order() {
        let a = json!({"eClassifiers": [{"name": "A", "abstract": true}]});
        let b = json!({"eClassifiers": [{"abstract": true, "name": "A"}]});
        assert_eq!(
            compute_document_digest(&a).unwrap(),
            compute_document_digest(&b).unwrap()
        );
    }

    #[test]
    fn test_digest_is_list_order_sensitive() {
        let a = json!({"eLiterals": [{"name": "A"}, {"name": "B"}]});
        let b = json!({"eLiterals": [{"name": "B"}, {"name": "A"}]});
        assert_ne!(
            compute_document_digest(&a).unwrap(),
            compute_document_digest(&b).unwrap()
        );
    }
}
