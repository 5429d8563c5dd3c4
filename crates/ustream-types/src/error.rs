use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("record has no usable key in field `{field}`")]
    MissingKey { field: String },

    #[error("change at position {position} has no usable key in field `{field}`")]
    MissingKeyAt { field: String, position: usize },

    #[error("changes must be a keyed collection of records, found a JSON {found}")]
    NotAKeyedCollection { found: &'static str },
}
