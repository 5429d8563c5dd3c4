use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// One structured data item flowing through a merge pass.
///
/// A `Record` wraps an arbitrary JSON value. Only two fields are ever
/// interpreted (the key field and the version field); everything else is
/// carried through untouched. Records that are not JSON objects have no
/// fields at all, so they never match a change and are passed through.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Value);

impl Record {
    /// Wrap a JSON value.
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Look up a top-level field. Returns `None` for non-object records.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.as_object().and_then(|map| map.get(field))
    }

    /// The identity of this record under `key_field`, if it has one.
    pub fn key(&self, key_field: &str) -> Option<RecordKey> {
        self.get(key_field).and_then(RecordKey::from_value)
    }

    /// The raw version value under `version_field`.
    pub fn version(&self, version_field: &str) -> Option<&Value> {
        self.get(version_field)
    }

    /// Borrow the underlying JSON value.
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Unwrap into the underlying JSON value.
    pub fn into_inner(self) -> Value {
        self.0
    }
}

impl From<Value> for Record {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        record.0
    }
}

/// Hashable identity extracted from a key-field value.
///
/// Strings, numbers and booleans are keys. `null`, arrays and objects are
/// not: a row whose key field holds one of those can never be matched.
/// Integral floats fold onto the integer variant so that `1` and `1.0`
/// identify the same entity.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum RecordKey {
    Bool(bool),
    Int(i64),
    UInt(u64),
    /// Non-integral float, stored as its bit pattern.
    Float(u64),
    Str(String),
}

impl RecordKey {
    /// Extract a key from a JSON value.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self::Str(s.clone())),
            Value::Number(n) => Some(Self::from_number(n)),
            Value::Bool(b) => Some(Self::Bool(*b)),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    fn from_number(n: &Number) -> Self {
        if let Some(i) = n.as_i64() {
            return Self::Int(i);
        }
        if let Some(u) = n.as_u64() {
            return Self::UInt(u);
        }
        // Without arbitrary precision every JSON number fits one of i64/u64/f64.
        let f = n.as_f64().unwrap_or(f64::NAN);
        if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
            Self::Int(f as i64)
        } else {
            Self::Float(f.to_bits())
        }
    }
}

impl From<&str> for RecordKey {
    fn from(s: &str) -> Self {
        Self::Str(s.to_owned())
    }
}

impl From<String> for RecordKey {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<i64> for RecordKey {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::UInt(u) => write!(f, "{u}"),
            Self::Float(bits) => write!(f, "{}", f64::from_bits(*bits)),
            Self::Str(s) => write!(f, "{s:?}"),
        }
    }
}

/// Short name of a JSON value's shape, for error messages.
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
