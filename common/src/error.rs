//! Error types for request validation.

use thiserror::Error;

/// Rejection of a caller-supplied currency selection.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The path is not a slash-separated list of 3-letter codes.
    #[error("Malformed currency selection in url")]
    Malformed,

    /// A well-formed code that is not in the reference set.
    #[error("Unsupported currency selection in url")]
    Unsupported(String),
}

impl ValidationError {
    /// Get error code for logs.
    pub fn error_code(&self) -> &'static str {
        match self {
            ValidationError::Malformed => "MALFORMED_SELECTION",
            ValidationError::Unsupported(_) => "UNSUPPORTED_CURRENCY",
        }
    }
}
