//! Error types for value tree access and serialization.

use thiserror::Error;

/// Errors returned by [`Value`](crate::Value) accessors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// The object has no member with this key.
    #[error("Missing key: {0:?}")]
    MissingKey(String),

    /// The value is of a different kind than requested.
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// Array index out of range.
    #[error("Index {index} out of range (len: {len})")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Errors raised while writing a document.
#[derive(Error, Debug)]
pub enum WriteError {
    /// The JSON encoder failed.
    #[error("Failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The output stream failed.
    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),
}
