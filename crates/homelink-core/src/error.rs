//! Core error types shared across the workspace.

/// Errors produced by core domain operations.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// An identifier was empty or malformed.
    #[error("Invalid identifier: {message}")]
    InvalidId {
        /// Description of the problem.
        message: String,
    },
}

impl CoreError {
    /// Creates a new `InvalidId` error.
    #[must_use]
    pub fn invalid_id(message: impl Into<String>) -> Self {
        Self::InvalidId {
            message: message.into(),
        }
    }
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
