use ustream_types::TypeError;

use crate::transform::Phase;

/// Errors that can occur while configuring or driving a merge pass.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MergeError {
    /// A required configuration field is missing or empty.
    #[error("configuration error: {0}")]
    Config(String),

    /// The supplied changes are not a usable keyed collection.
    #[error("invalid change set: {0}")]
    Changes(#[from] TypeError),

    /// The pass already drained or aborted.
    #[error("merge pass is {phase}; it cannot accept more work")]
    PassClosed { phase: Phase },
}

impl MergeError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Returns `true` for errors raised at construction time.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Config(_) | Self::Changes(_))
    }
}

/// Result alias for merge operations.
pub type MergeResult<T> = Result<T, MergeError>;
