//! Foundation types for Update Stream.
//!
//! This crate provides the value types that flow through a merge pass. Every
//! other Update Stream crate depends on `ustream-types`.
//!
//! # Key Types
//!
//! - [`Record`] — Opaque JSON record with a key field and a version field
//! - [`RecordKey`] — Hashable identity extracted from a record's key field
//! - [`Unit`] — One pipeline step: a single record or an ordered batch
//! - [`ChangeSet`] — Insertion-ordered, key-unique map of pending changes
//! - [`compare_versions`] / [`is_newer`] — Natural ordering of version values

pub mod changes;
pub mod error;
pub mod record;
pub mod unit;
pub mod version;

pub use changes::ChangeSet;
pub use error::TypeError;
pub use record::{value_kind, Record, RecordKey};
pub use unit::Unit;
pub use version::{compare_versions, is_newer};
