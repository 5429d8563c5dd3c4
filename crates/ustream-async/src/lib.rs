//! Async stream adapter for Update Stream.
//!
//! [`MergeStream`] runs a [`ustream_merge::MergeTransform`] over any `futures::Stream` of
//! fallible units. It polls upstream only when it has nothing buffered, so a
//! consumer that stops polling stops the producer too.

pub mod stream;

pub use stream::{MergeStream, MergeStreamExt};
