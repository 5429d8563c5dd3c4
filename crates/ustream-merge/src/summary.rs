use serde::{Deserialize, Serialize};

/// Counters describing one merge pass.
///
/// `replaced + passed_through == rows_in` always holds; stale drops are a
/// subset of the pass-through rows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeSummary {
    /// Input units processed.
    pub units_in: u64,
    /// Output units emitted, drain included.
    pub units_out: u64,
    /// Records seen across all input units.
    pub rows_in: u64,
    /// Rows replaced by a newer change.
    pub replaced: u64,
    /// Rows whose matching change was not newer.
    pub stale_dropped: u64,
    /// Rows emitted unchanged.
    pub passed_through: u64,
    /// Unmatched changes emitted by the drain.
    pub inserted: u64,
    /// Unmatched changes discarded by an abort.
    pub abandoned: u64,
}

impl MergeSummary {
    /// Total records emitted.
    pub fn rows_out(&self) -> u64 {
        self.rows_in + self.inserted
    }

    /// Changes consumed by matching rows, stale or not.
    pub fn matched(&self) -> u64 {
        self.replaced + self.stale_dropped
    }
}
