//! Error types for conversation context handling

use thiserror::Error;

/// Context error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContextError {
    #[error("Unknown turn role: {0}")]
    UnknownRole(String),
}

/// Result type for context operations
pub type ContextResult<T> = Result<T, ContextError>;
