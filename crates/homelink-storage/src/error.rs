//! Storage error types.

use homelink_core::CoreError;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A domain value was rejected before it reached the store.
    #[error(transparent)]
    Domain(#[from] CoreError),

    /// The requested record was not found.
    #[error("Record not found: {partition}/{sort}")]
    NotFound {
        /// Partition key of the missing record.
        partition: String,
        /// Sort key of the missing record.
        sort: String,
    },

    /// The backing store could not be reached or rejected the operation.
    #[error("Store unavailable: {message}")]
    Unavailable {
        /// Description of the failure.
        message: String,
    },

    /// A stored record could not be decoded into its typed form.
    #[error("Corrupt record at {partition}/{sort}: {message}")]
    Corrupt {
        partition: String,
        sort: String,
        message: String,
    },

    /// An internal storage error occurred.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl StorageError {
    /// Creates a new `NotFound` error.
    #[must_use]
    pub fn not_found(partition: impl Into<String>, sort: impl Into<String>) -> Self {
        Self::NotFound {
            partition: partition.into(),
            sort: sort.into(),
        }
    }

    /// Creates a new `Unavailable` error.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Creates a new `Corrupt` error.
    #[must_use]
    pub fn corrupt(
        partition: impl Into<String>,
        sort: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Corrupt {
            partition: partition.into(),
            sort: sort.into(),
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a not found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StorageError::not_found("alice", "device-1");
        assert_eq!(err.to_string(), "Record not found: alice/device-1");
        assert!(err.is_not_found());

        let err = StorageError::unavailable("connection refused");
        assert!(!err.is_not_found());
    }
}
