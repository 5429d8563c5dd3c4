//! Pull-based drivers for a [`MergeTransform`].
//!
//! Both iterators pull one input unit at a time and buffer at most that
//! unit's output, so a slow consumer slows the producer down instead of
//! growing a queue. They are finite and cannot be restarted.

use std::collections::VecDeque;
use std::iter::FusedIterator;

use ustream_types::Unit;

use crate::summary::MergeSummary;
use crate::transform::MergeTransform;

// ---------------------------------------------------------------------------
// MergeIter
// ---------------------------------------------------------------------------

/// Lazily merges an infallible sequence of units, draining the residual
/// changes once the input is exhausted.
#[must_use = "iterators are lazy and do nothing unless consumed"]
#[derive(Debug)]
pub struct MergeIter<I> {
    transform: MergeTransform,
    input: I,
    buffer: VecDeque<Unit>,
}

impl<I> MergeIter<I> {
    pub(crate) fn new(transform: MergeTransform, input: I) -> Self {
        Self {
            transform,
            input,
            buffer: VecDeque::new(),
        }
    }

    /// Counters so far; final once the iterator returned `None`.
    pub fn summary(&self) -> MergeSummary {
        self.transform.summary()
    }
}

impl<I> Iterator for MergeIter<I>
where
    I: Iterator<Item = Unit>,
{
    type Item = Unit;

    fn next(&mut self) -> Option<Unit> {
        loop {
            if let Some(unit) = self.buffer.pop_front() {
                return Some(unit);
            }
            if !self.transform.phase().is_active() {
                return None;
            }

            let buffer = &mut self.buffer;
            let step = match self.input.next() {
                Some(unit) => self.transform.process(unit, |out| buffer.push_back(out)),
                None => self
                    .transform
                    .finish(|out| buffer.push_back(out))
                    .map(|_| ()),
            };
            // Only a closed pass can fail, and that was checked above.
            if step.is_err() {
                return None;
            }
        }
    }
}

impl<I> FusedIterator for MergeIter<I> where I: Iterator<Item = Unit> {}

// ---------------------------------------------------------------------------
// TryMergeIter
// ---------------------------------------------------------------------------

/// Lazily merges a fallible sequence of units.
///
/// The first upstream error is yielded once and aborts the pass: output
/// already produced stands, the residual changes are discarded, and the
/// iterator ends.
#[must_use = "iterators are lazy and do nothing unless consumed"]
#[derive(Debug)]
pub struct TryMergeIter<I> {
    transform: MergeTransform,
    input: I,
    buffer: VecDeque<Unit>,
}

impl<I> TryMergeIter<I> {
    pub(crate) fn new(transform: MergeTransform, input: I) -> Self {
        Self {
            transform,
            input,
            buffer: VecDeque::new(),
        }
    }

    /// Counters so far; final once the iterator returned `None`.
    pub fn summary(&self) -> MergeSummary {
        self.transform.summary()
    }
}

impl<I, E> Iterator for TryMergeIter<I>
where
    I: Iterator<Item = Result<Unit, E>>,
{
    type Item = Result<Unit, E>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(unit) = self.buffer.pop_front() {
                return Some(Ok(unit));
            }
            if !self.transform.phase().is_active() {
                return None;
            }

            let buffer = &mut self.buffer;
            let step = match self.input.next() {
                Some(Ok(unit)) => self.transform.process(unit, |out| buffer.push_back(out)),
                Some(Err(err)) => {
                    self.transform.abort();
                    return Some(Err(err));
                }
                None => self
                    .transform
                    .finish(|out| buffer.push_back(out))
                    .map(|_| ()),
            };
            if step.is_err() {
                return None;
            }
        }
    }
}

impl<I, E> FusedIterator for TryMergeIter<I> where I: Iterator<Item = Result<Unit, E>> {}
