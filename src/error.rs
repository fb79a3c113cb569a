//! Error types for zetadrill.
//!
//! Configuration problems never surface here: the normalizer folds them into
//! defaults. What remains is the one guarded precondition of a round and the
//! infrastructure around the settings store.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DrillError {
    #[error("no operation is enabled; enable at least one of add, sub, mul, div")]
    NoOperations,

    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DrillError {
    /// Create an IO error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, DrillError>;
