use std::fmt;

use serde_json::Value;
use tracing::{debug, info, warn};
use ustream_types::{is_newer, ChangeSet, Record, Unit};

use crate::config::{MergeConfig, ResolvedConfig};
use crate::error::{MergeError, MergeResult};
use crate::iter::{MergeIter, TryMergeIter};
use crate::summary::MergeSummary;

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// Lifecycle of a merge pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Accepting input units.
    Active,
    /// Input ended normally and the residual changes were emitted.
    Drained,
    /// Input ended abnormally; residual changes were discarded.
    Aborted,
}

impl Phase {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => f.write_str("active"),
            Self::Drained => f.write_str("drained"),
            Self::Aborted => f.write_str("aborted"),
        }
    }
}

// ---------------------------------------------------------------------------
// MergeTransform
// ---------------------------------------------------------------------------

/// Reconciles a stream of records against a set of pending changes.
///
/// Each row whose key has a pending change consumes that change: the row is
/// replaced when the change's version is strictly greater, and kept as-is
/// otherwise. Changes that never meet a row are emitted by [`Self::finish`]
/// as inserts. A transform owns its change set and runs exactly one pass.
#[derive(Debug)]
pub struct MergeTransform {
    config: ResolvedConfig,
    changes: ChangeSet,
    phase: Phase,
    summary: MergeSummary,
}

impl MergeTransform {
    /// Validate `config` and take ownership of `changes`.
    pub fn new(config: MergeConfig, changes: ChangeSet) -> MergeResult<Self> {
        let config = config.resolve()?;
        Ok(Self::with_resolved(config, changes))
    }

    /// Build a transform from a JSON change payload.
    ///
    /// The payload must be an array of records carrying the configured key
    /// field; a JSON object is rejected.
    pub fn from_json_changes(config: MergeConfig, changes: Value) -> MergeResult<Self> {
        let config = config.resolve()?;
        let changes = ChangeSet::from_json(config.key_field(), changes)?;
        Ok(Self::with_resolved(config, changes))
    }

    fn with_resolved(config: ResolvedConfig, changes: ChangeSet) -> Self {
        debug!(
            key_field = config.key_field(),
            version_field = config.version_field(),
            batches = config.batches(),
            pending = changes.len(),
            "merge pass created"
        );
        Self {
            config,
            changes,
            phase: Phase::Active,
            summary: MergeSummary::default(),
        }
    }

    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    /// The changes not yet matched or drained.
    pub fn changes(&self) -> &ChangeSet {
        &self.changes
    }

    /// Number of changes not yet matched or drained.
    pub fn pending(&self) -> usize {
        self.changes.len()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Counters so far.
    pub fn summary(&self) -> MergeSummary {
        self.summary
    }

    /// Process one input unit, handing every output unit to `emit` in order.
    ///
    /// In batch mode the unit's records come back as one batch of the same
    /// length. Otherwise each record is emitted on its own, and a batch that
    /// arrives anyway is flattened.
    pub fn process<F>(&mut self, unit: Unit, mut emit: F) -> MergeResult<()>
    where
        F: FnMut(Unit),
    {
        self.ensure_active()?;
        self.summary.units_in += 1;

        let was_batch = unit.is_batch();
        let mut records = unit.into_records();
        for row in &mut records {
            self.reconcile(row);
        }

        if self.config.batches() {
            self.summary.units_out += 1;
            emit(Unit::Batch(records));
        } else {
            if was_batch {
                debug!(len = records.len(), "flattening batch unit in record mode");
            }
            for record in records {
                self.summary.units_out += 1;
                emit(Unit::Record(record));
            }
        }
        Ok(())
    }

    /// End the pass after normal input exhaustion, emitting the residual
    /// changes as inserts.
    ///
    /// In batch mode the residue is one final batch (nothing when empty);
    /// otherwise each residual change is its own unit.
    pub fn finish<F>(&mut self, mut emit: F) -> MergeResult<MergeSummary>
    where
        F: FnMut(Unit),
    {
        self.ensure_active()?;
        self.phase = Phase::Drained;

        let residual = self.changes.drain();
        self.summary.inserted = residual.len() as u64;

        if !residual.is_empty() {
            if self.config.batches() {
                self.summary.units_out += 1;
                emit(Unit::Batch(residual));
            } else {
                for record in residual {
                    self.summary.units_out += 1;
                    emit(Unit::Record(record));
                }
            }
        }

        info!(
            rows_in = self.summary.rows_in,
            replaced = self.summary.replaced,
            stale = self.summary.stale_dropped,
            inserted = self.summary.inserted,
            "merge pass drained"
        );
        Ok(self.summary)
    }

    /// End the pass after abnormal input termination. Residual changes are
    /// discarded, never emitted. Calling this on a closed pass is a no-op.
    pub fn abort(&mut self) -> MergeSummary {
        if self.phase.is_active() {
            self.phase = Phase::Aborted;
            self.summary.abandoned = self.changes.drain().len() as u64;
            warn!(
                abandoned = self.summary.abandoned,
                rows_in = self.summary.rows_in,
                "merge pass aborted before drain"
            );
        }
        self.summary
    }

    /// Lazily merge an infallible sequence of units.
    pub fn into_merge_iter<I>(self, input: I) -> MergeIter<I::IntoIter>
    where
        I: IntoIterator<Item = Unit>,
    {
        MergeIter::new(self, input.into_iter())
    }

    /// Lazily merge a fallible sequence of units. The first upstream error
    /// aborts the pass.
    pub fn into_try_merge_iter<I, E>(self, input: I) -> TryMergeIter<I::IntoIter>
    where
        I: IntoIterator<Item = Result<Unit, E>>,
    {
        TryMergeIter::new(self, input.into_iter())
    }

    fn ensure_active(&self) -> MergeResult<()> {
        if self.phase.is_active() {
            Ok(())
        } else {
            Err(MergeError::PassClosed { phase: self.phase })
        }
    }

    /// Replace `row` in place when its pending change is newer.
    fn reconcile(&mut self, row: &mut Record) {
        self.summary.rows_in += 1;

        let Some(key) = row.key(self.config.key_field()) else {
            self.summary.passed_through += 1;
            return;
        };
        // Matching consumes the change whatever the version outcome.
        let Some(change) = self.changes.take(&key) else {
            self.summary.passed_through += 1;
            return;
        };

        let version_field = self.config.version_field();
        let newer = match (change.version(version_field), row.version(version_field)) {
            (Some(theirs), Some(ours)) => is_newer(theirs, ours),
            _ => false,
        };

        if newer {
            debug!(key = %key, "change replaces row");
            *row = change;
            self.summary.replaced += 1;
        } else {
            debug!(key = %key, "stale change dropped");
            self.summary.stale_dropped += 1;
            self.summary.passed_through += 1;
        }
    }
}

/// Merge a whole input sequence in one call.
pub fn merge_all<I>(config: MergeConfig, changes: ChangeSet, input: I) -> MergeResult<Vec<Unit>>
where
    I: IntoIterator<Item = Unit>,
{
    let mut transform = MergeTransform::new(config, changes)?;
    let mut output = Vec::new();
    for unit in input {
        transform.process(unit, |out| output.push(out))?;
    }
    transform.finish(|out| output.push(out))?;
    Ok(output)
}
