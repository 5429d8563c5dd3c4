use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::record::Record;

/// The granularity of one pipeline step: a single record or an ordered batch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Unit {
    Batch(Vec<Record>),
    Record(Record),
}

impl Unit {
    /// Classify a raw JSON value: arrays are batches, anything else is a
    /// single record.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Array(items) => Self::Batch(items.into_iter().map(Record::new).collect()),
            other => Self::Record(Record::new(other)),
        }
    }

    /// Returns `true` if this unit is batch-shaped.
    pub fn is_batch(&self) -> bool {
        matches!(self, Self::Batch(_))
    }

    /// Number of records carried by this unit.
    pub fn len(&self) -> usize {
        match self {
            Self::Batch(records) => records.len(),
            Self::Record(_) => 1,
        }
    }

    /// Returns `true` for an empty batch.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The records of this unit in order. A single record is a singleton.
    pub fn into_records(self) -> Vec<Record> {
        match self {
            Self::Batch(records) => records,
            Self::Record(record) => vec![record],
        }
    }
}

impl From<Record> for Unit {
    fn from(record: Record) -> Self {
        Self::Record(record)
    }
}

impl From<Vec<Record>> for Unit {
    fn from(records: Vec<Record>) -> Self {
        Self::Batch(records)
    }
}
