//! Ephemeral live-connection registry.

use tracing::{debug, error};

use homelink_storage::{
    ConnectionRecord, DynKeyedStore, RecordKey, RecordTag, StorageError, StoredRecord,
};

/// Maps real-time connection identifiers to accounts.
///
/// Connections are created on connect and destroyed on disconnect or when
/// a push attempt finds them gone. Lookups are best-effort: a failing
/// backend yields an empty set, never an error, because the live view is
/// an optional audience.
#[derive(Clone)]
pub struct LiveConnectionRegistry {
    store: DynKeyedStore,
}

impl LiveConnectionRegistry {
    #[must_use]
    pub fn new(store: DynKeyedStore) -> Self {
        Self { store }
    }

    /// Registers a connection for `username`.
    pub async fn on_connect(
        &self,
        connection_id: &str,
        username: &str,
    ) -> Result<(), StorageError> {
        self.store
            .put(
                RecordKey::connection(connection_id),
                StoredRecord::Connection(ConnectionRecord {
                    connection_id: connection_id.to_string(),
                    username: username.to_string(),
                }),
            )
            .await
    }

    /// Removes a connection. Removing an unknown connection is not an
    /// error.
    pub async fn on_disconnect(&self, connection_id: &str) -> Result<(), StorageError> {
        self.store
            .delete(&RecordKey::connection(connection_id))
            .await
    }

    /// Every connection currently registered for `username`.
    ///
    /// Returns an empty set if the backing lookup fails.
    pub async fn connections_for(&self, username: &str) -> Vec<String> {
        match self.store.query_owner(username, RecordTag::Connection).await {
            Ok(records) => {
                let ids: Vec<String> = records
                    .into_iter()
                    .filter_map(|record| match record {
                        StoredRecord::Connection(connection) => Some(connection.connection_id),
                        _ => None,
                    })
                    .collect();
                debug!(username, count = ids.len(), "live connections found");
                ids
            }
            Err(err) => {
                error!(username, %err, "connection lookup failed");
                Vec::new()
            }
        }
    }
}
