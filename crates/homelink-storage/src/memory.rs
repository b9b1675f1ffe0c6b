//! In-process store backend.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::StorageError;
use crate::records::{RecordKey, RecordTag, StoredRecord, WriteOp};
use crate::traits::KeyedStore;

/// In-memory [`KeyedStore`] backend.
///
/// Backs every test in the workspace and serves as the local development
/// backend. `batch_write` applies its whole set under a single write lock,
/// which is this backend's version of the atomic multi-item commit.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<RecordKey, StoredRecord>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently stored. Test helper.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether the store is empty. Test helper.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

fn owner_of(key: &RecordKey, record: &StoredRecord) -> String {
    // Devices are partitioned by username and do not repeat the owner in
    // the record body; everything else carries it.
    match record {
        StoredRecord::Device(_) => key.partition.clone(),
        other => other.owner().to_string(),
    }
}

#[async_trait]
impl KeyedStore for MemoryStore {
    async fn get(&self, key: &RecordKey) -> Result<Option<StoredRecord>, StorageError> {
        Ok(self.records.read().await.get(key).cloned())
    }

    async fn put(&self, key: RecordKey, record: StoredRecord) -> Result<(), StorageError> {
        self.records.write().await.insert(key, record);
        Ok(())
    }

    async fn delete(&self, key: &RecordKey) -> Result<(), StorageError> {
        self.records.write().await.remove(key);
        Ok(())
    }

    async fn query_owner(
        &self,
        username: &str,
        tag: RecordTag,
    ) -> Result<Vec<StoredRecord>, StorageError> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|(key, record)| record.tag() == tag && owner_of(key, record) == username)
            .map(|(_, record)| record.clone())
            .collect())
    }

    async fn batch_write(&self, ops: Vec<WriteOp>) -> Result<(), StorageError> {
        let mut records = self.records.write().await;
        for op in ops {
            match op {
                WriteOp::Put(key, record) => {
                    records.insert(key, record);
                }
                WriteOp::Delete(key) => {
                    records.remove(&key);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::ConnectionRecord;

    fn connection(id: &str, username: &str) -> (RecordKey, StoredRecord) {
        (
            RecordKey::connection(id),
            StoredRecord::Connection(ConnectionRecord {
                connection_id: id.to_string(),
                username: username.to_string(),
            }),
        )
    }

    #[tokio::test]
    async fn test_put_get_delete() {
        let store = MemoryStore::new();
        let (key, record) = connection("conn1", "alice");

        store.put(key.clone(), record.clone()).await.unwrap();
        assert_eq!(store.get(&key).await.unwrap(), Some(record));

        store.delete(&key).await.unwrap();
        assert_eq!(store.get(&key).await.unwrap(), None);
        // Deleting again is not an error.
        store.delete(&key).await.unwrap();
    }

    #[tokio::test]
    async fn test_query_owner_filters_by_tag_and_owner() {
        let store = MemoryStore::new();
        for (key, record) in [
            connection("conn1", "alice"),
            connection("conn2", "alice"),
            connection("conn3", "bob"),
        ] {
            store.put(key, record).await.unwrap();
        }

        let alice = store
            .query_owner("alice", RecordTag::Connection)
            .await
            .unwrap();
        assert_eq!(alice.len(), 2);

        let none = store.query_owner("alice", RecordTag::Device).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_batch_write_applies_mixed_set() {
        let store = MemoryStore::new();
        let (key1, record1) = connection("conn1", "alice");
        store.put(key1.clone(), record1).await.unwrap();

        let (key2, record2) = connection("conn2", "alice");
        store
            .batch_write(vec![
                WriteOp::Put(key2.clone(), record2.clone()),
                WriteOp::Delete(key1.clone()),
            ])
            .await
            .unwrap();

        assert_eq!(store.get(&key1).await.unwrap(), None);
        assert_eq!(store.get(&key2).await.unwrap(), Some(record2));
    }
}
