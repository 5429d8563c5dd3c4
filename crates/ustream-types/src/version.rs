//! Natural ordering of version values.
//!
//! Versions are compared by the ordering of their own type: numbers
//! numerically, strings lexicographically, booleans `false < true`. Values of
//! different types (or `null`, arrays, objects) are incomparable, and an
//! incomparable change never replaces a row.

use std::cmp::Ordering;

use serde_json::{Number, Value};

/// Compare two version values. `None` means the pair is incomparable.
pub fn compare_versions(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => compare_numbers(x, y),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Returns `true` if `change` is strictly newer than `row`.
pub fn is_newer(change: &Value, row: &Value) -> bool {
    compare_versions(change, row) == Some(Ordering::Greater)
}

fn compare_numbers(a: &Number, b: &Number) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return Some(x.cmp(&y));
    }
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        return Some(x.cmp(&y));
    }
    if a.is_f64() || b.is_f64() {
        return a.as_f64()?.partial_cmp(&b.as_f64()?);
    }
    // One side is a negative i64, the other exceeds i64::MAX.
    if a.as_u64().is_some() {
        Some(Ordering::Greater)
    } else {
        Some(Ordering::Less)
    }
}
