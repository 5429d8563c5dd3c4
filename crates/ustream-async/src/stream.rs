use core::pin::Pin;
use core::task::{Context, Poll};
use std::collections::VecDeque;

use futures::stream::FusedStream;
use futures::{ready, Stream};
use pin_project_lite::pin_project;
use tracing::debug;
use ustream_merge::{MergeSummary, MergeTransform};
use ustream_types::Unit;

pin_project! {
    /// A stream adapter that merges pending changes into a stream of units.
    ///
    /// Each upstream unit is processed in full before the next one is polled,
    /// and its output is yielded before upstream is polled again. When the
    /// upstream ends cleanly the residual changes are yielded as inserts; when
    /// it yields an error, the error is forwarded, the pass is aborted and the
    /// stream ends without draining.
    #[must_use = "streams do nothing unless polled"]
    #[derive(Debug)]
    pub struct MergeStream<S> {
        #[pin]
        stream: S,
        transform: MergeTransform,
        buffer: VecDeque<Unit>,
    }
}

impl<S> MergeStream<S> {
    /// Creates a new [`MergeStream`] wrapping `stream`.
    pub fn wrap(stream: S, transform: MergeTransform) -> Self {
        Self {
            stream,
            transform,
            buffer: VecDeque::new(),
        }
    }

    /// Counters so far; final once the stream has ended.
    pub fn summary(&self) -> MergeSummary {
        self.transform.summary()
    }

    /// Returns a pinned mutable reference to the wrapped stream.
    pub fn stream_mut(self: Pin<&mut Self>) -> Pin<&mut S> {
        self.project().stream
    }
}

impl<S, E> Stream for MergeStream<S>
where
    S: Stream<Item = Result<Unit, E>>,
{
    type Item = Result<Unit, E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        loop {
            if let Some(unit) = this.buffer.pop_front() {
                return Poll::Ready(Some(Ok(unit)));
            }
            if !this.transform.phase().is_active() {
                return Poll::Ready(None);
            }

            let buffer = &mut *this.buffer;
            let step = match ready!(this.stream.as_mut().poll_next(cx)) {
                Some(Ok(unit)) => this.transform.process(unit, |out| buffer.push_back(out)),
                Some(Err(err)) => {
                    this.transform.abort();
                    return Poll::Ready(Some(Err(err)));
                }
                None => {
                    debug!("upstream ended, draining residual changes");
                    this.transform
                        .finish(|out| buffer.push_back(out))
                        .map(|_| ())
                }
            };
            if step.is_err() {
                return Poll::Ready(None);
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        // Output may be flattened, batched or extended by the drain.
        (self.buffer.len(), None)
    }
}

impl<S, E> FusedStream for MergeStream<S>
where
    S: Stream<Item = Result<Unit, E>>,
{
    fn is_terminated(&self) -> bool {
        self.buffer.is_empty() && !self.transform.phase().is_active()
    }
}

/// Extension trait adding [`merge_changes`](MergeStreamExt::merge_changes) to
/// streams. The result is itself a stream when the items are
/// `Result<Unit, E>`.
pub trait MergeStreamExt: Stream + Sized {
    /// Merge the changes owned by `transform` into this stream.
    fn merge_changes(self, transform: MergeTransform) -> MergeStream<Self> {
        MergeStream::wrap(self, transform)
    }
}

impl<S: Stream> MergeStreamExt for S {}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use futures::channel::mpsc;
    use futures::{stream, SinkExt, StreamExt};
    use serde_json::{json, Value};
    use ustream_merge::{MergeConfig, Phase};
    use ustream_types::{ChangeSet, Record};

    use super::*;

    fn rec(value: Value) -> Record {
        Record::new(value)
    }

    fn transform(batches: bool, changes: Vec<Value>) -> MergeTransform {
        let config = MergeConfig::new("id")
            .with_version_field("v")
            .with_batches(batches);
        let changes = ChangeSet::from_records("id", changes.into_iter().map(Record::new)).unwrap();
        MergeTransform::new(config, changes).unwrap()
    }

    #[tokio::test]
    async fn merges_and_drains() {
        let input = stream::iter(vec![
            Ok::<_, Infallible>(Unit::from(rec(json!({"id": "a", "v": 1})))),
            Ok(Unit::from(rec(json!({"id": "c", "v": 1})))),
        ]);
        let merged = input.merge_changes(transform(
            false,
            vec![json!({"id": "a", "v": 2}), json!({"id": "b", "v": 1})],
        ));

        let out: Vec<Unit> = merged.map(|unit| unit.unwrap()).collect().await;
        assert_eq!(
            out,
            vec![
                Unit::from(rec(json!({"id": "a", "v": 2}))),
                Unit::from(rec(json!({"id": "c", "v": 1}))),
                Unit::from(rec(json!({"id": "b", "v": 1}))),
            ]
        );
    }

    #[tokio::test]
    async fn batch_mode_yields_drain_as_single_batch() {
        let input = stream::iter(vec![Ok::<_, Infallible>(Unit::Batch(vec![rec(
            json!({"id": "a", "v": 1}),
        )]))]);
        let out: Vec<Unit> = input
            .merge_changes(transform(
                true,
                vec![json!({"id": "x", "v": 1}), json!({"id": "y", "v": 1})],
            ))
            .map(|unit| unit.unwrap())
            .collect()
            .await;

        assert_eq!(out.len(), 2);
        assert_eq!(out[0], Unit::Batch(vec![rec(json!({"id": "a", "v": 1}))]));
        assert_eq!(out[1].len(), 2);
    }

    #[tokio::test]
    async fn upstream_error_ends_stream_without_drain() {
        let input = stream::iter(vec![
            Ok(Unit::from(rec(json!({"id": "a", "v": 1})))),
            Err("connection reset"),
            Ok(Unit::from(rec(json!({"id": "z", "v": 1})))),
        ]);
        let mut merged = input.merge_changes(transform(false, vec![json!({"id": "b", "v": 1})]));

        assert!(matches!(merged.next().await, Some(Ok(_))));
        assert_eq!(merged.next().await, Some(Err("connection reset")));
        assert_eq!(merged.next().await, None);
        assert!(merged.is_terminated());

        let summary = merged.summary();
        assert_eq!(summary.abandoned, 1);
        assert_eq!(summary.inserted, 0);
        assert_eq!(merged.transform.phase(), Phase::Aborted);
    }

    #[tokio::test]
    async fn pending_upstream_propagates() {
        let (mut tx, rx) = mpsc::channel::<Result<Unit, Infallible>>(1);
        let mut merged = rx.merge_changes(transform(false, vec![json!({"id": "b", "v": 1})]));

        tx.send(Ok(Unit::from(rec(json!({"id": "a", "v": 1})))))
            .await
            .unwrap();
        let first = merged.next().await.unwrap().unwrap();
        assert_eq!(first, Unit::from(rec(json!({"id": "a", "v": 1}))));

        // Nothing buffered and upstream open: the merge waits.
        assert!(futures::poll!(merged.next()).is_pending());

        drop(tx);
        let drained = merged.next().await.unwrap().unwrap();
        assert_eq!(drained, Unit::from(rec(json!({"id": "b", "v": 1}))));
        assert!(merged.next().await.is_none());
        assert_eq!(merged.summary().inserted, 1);
    }
}
