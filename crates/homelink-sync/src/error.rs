//! Sync engine error types.
//!
//! Only failures that precede fan-out surface here. Per-recipient delivery
//! errors are caught at the fan-out boundary and logged; a notify call
//! that reaches its fan-out loop always returns `Ok`.

use homelink_auth::AuthError;
use homelink_storage::StorageError;

/// Errors that can occur before fan-out starts.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Resolving the canonical device record or a connection set failed.
    #[error("Storage error: {0}")]
    Store(#[from] StorageError),

    /// Resolving credentials or subscriptions failed.
    #[error("Credential error: {0}")]
    Auth(#[from] AuthError),
}

impl SyncError {
    /// Returns `true` if the underlying cause is a missing record.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Store(err) => err.is_not_found(),
            Self::Auth(err) => err.is_not_found(),
        }
    }
}
