//! The keyed store trait backends implement.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::StorageError;
use crate::records::{RecordKey, RecordTag, StoredRecord, WriteOp};

/// A remote keyed record store.
///
/// Implementations must be thread-safe (`Send + Sync`). All operations are
/// non-blocking I/O; this layer imposes no timeouts of its own and holds no
/// in-process state across calls, so atomicity comes entirely from
/// [`batch_write`](KeyedStore::batch_write).
///
/// # Example
///
/// ```ignore
/// use homelink_storage::{KeyedStore, RecordKey, StorageError, StoredRecord};
///
/// async fn load(
///     store: &dyn KeyedStore,
///     key: &RecordKey,
/// ) -> Result<StoredRecord, StorageError> {
///     store
///         .get(key)
///         .await?
///         .ok_or_else(|| StorageError::not_found(&key.partition, &key.sort))
/// }
/// ```
#[async_trait]
pub trait KeyedStore: Send + Sync {
    /// Reads one record.
    ///
    /// Returns `None` if the record does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error only for infrastructure issues, not for missing
    /// records.
    async fn get(&self, key: &RecordKey) -> Result<Option<StoredRecord>, StorageError>;

    /// Writes one record, replacing any existing record at the key.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Unavailable` if the store rejects the write.
    async fn put(&self, key: RecordKey, record: StoredRecord) -> Result<(), StorageError>;

    /// Deletes one record. Deleting a missing record is not an error.
    async fn delete(&self, key: &RecordKey) -> Result<(), StorageError>;

    /// Queries the owner index: every record of entity `tag` owned by
    /// `username`.
    ///
    /// # Errors
    ///
    /// Returns an error for infrastructure issues; an owner with no
    /// matching records yields an empty vector.
    async fn query_owner(
        &self,
        username: &str,
        tag: RecordTag,
    ) -> Result<Vec<StoredRecord>, StorageError>;

    /// Applies a mixed put/delete set as one atomic unit.
    ///
    /// Either every operation in `ops` takes effect or none does. Callers
    /// rely on this for credential rotation and redemption.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Unavailable` if the set could not be
    /// committed.
    async fn batch_write(&self, ops: Vec<WriteOp>) -> Result<(), StorageError>;
}

/// Type alias for a shareable store instance.
pub type DynKeyedStore = Arc<dyn KeyedStore>;
