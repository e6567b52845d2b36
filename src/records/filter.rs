//! Partial-match predicate filtering over records.

use super::equality::values_equal;
use serde_json::{Map, Value};

/// Keep the records whose fields match every field of `predicate`.
///
/// With `strict`, each predicate field must equal the record's field by
/// value. Without it, primitives match when the record's value, rendered as
/// text, contains the predicate's text case-insensitively; nested objects
/// are matched recursively.
pub fn filter_records<'a, I>(records: I, predicate: &Map<String, Value>, strict: bool) -> Vec<Value>
where
    I: IntoIterator<Item = &'a Value>,
{
    records
        .into_iter()
        .filter(|record| matches_predicate(record, predicate, strict))
        .cloned()
        .collect()
}

/// Whether a single record satisfies `predicate`.
pub fn matches_predicate(record: &Value, predicate: &Map<String, Value>, strict: bool) -> bool {
    let Some(fields) = record.as_object() else {
        return false;
    };

    predicate.iter().all(|(name, expected)| match fields.get(name) {
        Some(actual) => field_matches(actual, expected, strict),
        None => false,
    })
}

fn field_matches(actual: &Value, expected: &Value, strict: bool) -> bool {
    if strict {
        return values_equal(actual, expected);
    }

    match (actual, expected) {
        (Value::Object(_), Value::Object(nested)) => matches_predicate(actual, nested, false),
        (Value::Array(items), _) => items.iter().any(|item| field_matches(item, expected, false)),
        (_, Value::Object(_)) | (_, Value::Array(_)) => false,
        _ => text_of(actual)
            .to_lowercase()
            .contains(&text_of(expected).to_lowercase()),
    }
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
