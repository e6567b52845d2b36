//! Collection (de)serialization.

use crate::error::{CacheError, Result};
use crate::types::Entry;
use serde_json::Value;

/// Serialized form of a collection with no records.
pub const EMPTY_COLLECTION: &str = "[]";

/// Decode the stored string for a collection.
///
/// An empty string decodes to an empty collection. A bare object is
/// normalized to a one-element collection. Anything else that is not an
/// array of objects is a decode error.
pub fn decode_collection(raw: &str) -> Result<Vec<Entry>> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }

    let value: Value =
        serde_json::from_str(raw).map_err(|e| CacheError::Deserialization(e.to_string()))?;

    let items = match value {
        Value::Array(items) => items,
        Value::Object(_) => vec![value],
        other => {
            return Err(CacheError::Deserialization(format!(
                "expected an array of records, found {}",
                kind_of(&other)
            )))
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            let kind = kind_of(&item);
            Entry::from_value(item).ok_or_else(|| {
                CacheError::Deserialization(format!("element {} is {}, not an object", i, kind))
            })
        })
        .collect()
}

/// Encode a collection for the medium, merging `isDirty` into each object.
pub fn encode_collection(entries: &[Entry]) -> Result<String> {
    let raw: Vec<Value> = entries.iter().map(Entry::to_raw).collect();
    Ok(serde_json::to_string(&raw)?)
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_empty() {
        assert!(decode_collection("").unwrap().is_empty());
        assert!(decode_collection(EMPTY_COLLECTION).unwrap().is_empty());
    }

    #[test]
    fn test_decode_array() {
        let entries = decode_collection(r#"[{"id":1,"isDirty":true},{"id":2}]"#).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].is_dirty, Some(json!(true)));
        assert_eq!(entries[1].is_dirty, None);
    }

    #[test]
    fn test_decode_bare_object_normalizes() {
        let entries = decode_collection(r#"{"id":7,"isDirty":false}"#).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id(), Some(&json!(7)));
        assert_eq!(entries[0].is_dirty, Some(json!(false)));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            decode_collection("{not json"),
            Err(CacheError::Deserialization(_))
        ));
        assert!(matches!(
            decode_collection("42"),
            Err(CacheError::Deserialization(_))
        ));
        assert!(matches!(
            decode_collection("null"),
            Err(CacheError::Deserialization(_))
        ));
        assert!(matches!(
            decode_collection(r#"[{"id":1}, 3]"#),
            Err(CacheError::Deserialization(_))
        ));
    }

    #[test]
    fn test_encode_merges_metadata() {
        let entries = vec![
            Entry::from_value(json!({"id": 1, "isDirty": true})).unwrap(),
            Entry::from_value(json!({"id": 2})).unwrap(),
        ];
        let encoded = encode_collection(&entries).unwrap();
        let value: Value = serde_json::from_str(&encoded).unwrap();
        assert_eq!(value, json!([{"id": 1, "isDirty": true}, {"id": 2}]));
    }
}
