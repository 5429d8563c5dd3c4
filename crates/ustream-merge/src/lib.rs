//! Merge engine for Update Stream.
//!
//! A merge pass reconciles an ordered stream of records against a set of
//! pending changes keyed by the same identity field. Each row either passes
//! through or is replaced by its change when the change carries a strictly
//! greater version. Changes that never meet a row are appended once the input
//! ends, as inserts.
//!
//! # Quick Start
//!
//! ```rust
//! use serde_json::json;
//! use ustream_merge::{merge_all, MergeConfig};
//! use ustream_types::{ChangeSet, Record, Unit};
//!
//! let config = MergeConfig::new("id").with_version_field("v");
//! let changes = ChangeSet::from_records("id", [Record::new(json!({"id": "a", "v": 2}))]).unwrap();
//! let input = vec![Unit::from(Record::new(json!({"id": "a", "v": 1})))];
//!
//! let output = merge_all(config, changes, input).unwrap();
//! assert_eq!(output, vec![Unit::from(Record::new(json!({"id": "a", "v": 2})))]);
//! ```

pub mod config;
pub mod error;
pub mod iter;
pub mod summary;
pub mod transform;

// Re-exports for convenience.
pub use config::{MergeConfig, ResolvedConfig, ValidationMode, DEFAULT_VERSION_FIELD};
pub use error::{MergeError, MergeResult};
pub use iter::{MergeIter, TryMergeIter};
pub use summary::MergeSummary;
pub use transform::{merge_all, MergeTransform, Phase};
