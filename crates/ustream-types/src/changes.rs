//! The change set: pending updates and inserts keyed by record identity.
//!
//! A [`ChangeSet`] is populated before a merge pass starts and shrinks as rows
//! are matched against it. Matched entries are taken out in O(1) and leave a
//! tombstone behind, so the remaining entries keep their insertion order for
//! the final drain.

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::TypeError;
use crate::record::{value_kind, Record, RecordKey};

/// Insertion-ordered, key-unique map of pending change records.
#[derive(Clone, Debug, Default)]
pub struct ChangeSet {
    entries: IndexMap<RecordKey, Option<Record>>,
    live: usize,
}

impl ChangeSet {
    /// Create an empty change set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a change under an explicit key, returning the change it
    /// replaced. A replaced key keeps its original position.
    pub fn insert(&mut self, key: RecordKey, record: Record) -> Option<Record> {
        let previous = self.entries.insert(key, Some(record)).flatten();
        if previous.is_none() {
            self.live += 1;
        }
        previous
    }

    /// Insert a change keyed by its own `key_field`.
    pub fn insert_record(
        &mut self,
        key_field: &str,
        record: Record,
    ) -> Result<Option<Record>, TypeError> {
        let key = record.key(key_field).ok_or_else(|| TypeError::MissingKey {
            field: key_field.to_owned(),
        })?;
        Ok(self.insert(key, record))
    }

    /// Build a change set from records keyed by `key_field`.
    ///
    /// Later records with an already-seen key replace the earlier change.
    pub fn from_records<I>(key_field: &str, records: I) -> Result<Self, TypeError>
    where
        I: IntoIterator<Item = Record>,
    {
        let mut changes = Self::new();
        for (position, record) in records.into_iter().enumerate() {
            let key = record.key(key_field).ok_or_else(|| TypeError::MissingKeyAt {
                field: key_field.to_owned(),
                position,
            })?;
            changes.insert(key, record);
        }
        Ok(changes)
    }

    /// Build a change set from a JSON array of records.
    ///
    /// A bare JSON object is rejected rather than interpreted as a
    /// key/record dictionary: its keys are untyped strings and cannot be
    /// trusted to agree with the records' own key fields.
    pub fn from_json(key_field: &str, value: Value) -> Result<Self, TypeError> {
        match value {
            Value::Array(items) => Self::from_records(key_field, items.into_iter().map(Record::new)),
            other => Err(TypeError::NotAKeyedCollection {
                found: value_kind(&other),
            }),
        }
    }

    /// Remove and return the change for `key`.
    pub fn take(&mut self, key: &RecordKey) -> Option<Record> {
        let taken = self.entries.get_mut(key).and_then(Option::take);
        if taken.is_some() {
            self.live -= 1;
        }
        taken
    }

    /// Borrow the pending change for `key`.
    pub fn get(&self, key: &RecordKey) -> Option<&Record> {
        self.entries.get(key).and_then(Option::as_ref)
    }

    pub fn contains_key(&self, key: &RecordKey) -> bool {
        self.get(key).is_some()
    }

    /// Number of pending changes.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Iterate pending changes in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&RecordKey, &Record)> {
        self.entries
            .iter()
            .filter_map(|(key, slot)| slot.as_ref().map(|record| (key, record)))
    }

    /// Remove every pending change, returning them in insertion order.
    pub fn drain(&mut self) -> Vec<Record> {
        let records: Vec<Record> = self.entries.drain(..).filter_map(|(_, slot)| slot).collect();
        self.live = 0;
        records
    }
}

impl PartialEq for ChangeSet {
    fn eq(&self, other: &Self) -> bool {
        self.iter().eq(other.iter())
    }
}

impl Eq for ChangeSet {}

impl FromIterator<(RecordKey, Record)> for ChangeSet {
    fn from_iter<T: IntoIterator<Item = (RecordKey, Record)>>(iter: T) -> Self {
        let mut changes = Self::new();
        changes.extend(iter);
        changes
    }
}

impl Extend<(RecordKey, Record)> for ChangeSet {
    fn extend<T: IntoIterator<Item = (RecordKey, Record)>>(&mut self, iter: T) {
        for (key, record) in iter {
            self.insert(key, record);
        }
    }
}
