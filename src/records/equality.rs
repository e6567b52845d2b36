//! Structural equality of JSON values with numbers compared by value.
//!
//! `serde_json::Value` equality keeps integer and float representations
//! apart, so `1` and `1.0` differ. Records read back from other writers may
//! carry either form for the same number.

use serde_json::{Map, Number, Value};

/// Deep equality where numbers compare by numeric value.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => numbers_equal(x, y),
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(x), Value::Object(y)) => objects_equal(x, y),
        _ => a == b,
    }
}

/// Field-by-field equality of two objects, ignoring field order.
pub fn objects_equal(a: &Map<String, Value>, b: &Map<String, Value>) -> bool {
    a.len() == b.len()
        && a
            .iter()
            .all(|(name, x)| b.get(name).map_or(false, |y| values_equal(x, y)))
}

fn numbers_equal(x: &Number, y: &Number) -> bool {
    // Integers compare exactly; going through f64 would merge large values
    if !x.is_f64() && !y.is_f64() {
        return x == y;
    }
    match (x.as_f64(), y.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}
