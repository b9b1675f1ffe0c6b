//! Typed device repository.

use tracing::debug;

use homelink_core::{
    Device, StateMap, generate_external_id, merge_states, remove_state_keys, validate_identifier,
};

use crate::error::StorageError;
use crate::records::{RecordKey, RecordTag, StoredRecord};
use crate::traits::DynKeyedStore;

/// Per-account device records layered over the keyed store.
///
/// State writes are per-key: [`merge_state`](DeviceStore::merge_state)
/// overwrites only the keys it is given and
/// [`remove_state_keys`](DeviceStore::remove_state_keys) deletes only the
/// keys it names. The state map is never replaced wholesale.
#[derive(Clone)]
pub struct DeviceStore {
    store: DynKeyedStore,
}

impl DeviceStore {
    #[must_use]
    pub fn new(store: DynKeyedStore) -> Self {
        Self { store }
    }

    /// Creates a device with a freshly generated immutable external id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Domain` when the owner or either identity
    /// field is blank.
    pub async fn create(
        &self,
        username: &str,
        handler_type: &str,
        display_name: &str,
        initial_states: StateMap,
    ) -> Result<Device, StorageError> {
        validate_identifier("username", username)?;
        validate_identifier("handlerType", handler_type)?;
        validate_identifier("displayName", display_name)?;
        let device = Device {
            external_id: generate_external_id(),
            handler_type: handler_type.to_string(),
            display_name: display_name.to_string(),
            states: initial_states,
        };

        self.store
            .put(
                RecordKey::device(username, &device.external_id),
                StoredRecord::Device(device.clone()),
            )
            .await?;
        Ok(device)
    }

    /// Reads one device.
    pub async fn get(&self, username: &str, external_id: &str) -> Result<Device, StorageError> {
        let key = RecordKey::device(username, external_id);
        match self.store.get(&key).await? {
            Some(StoredRecord::Device(device)) => Ok(device),
            Some(other) => Err(StorageError::corrupt(
                &key.partition,
                &key.sort,
                format!("expected device, found {:?}", other.tag()),
            )),
            None => Err(StorageError::not_found(&key.partition, &key.sort)),
        }
    }

    /// Deletes one device. Deleting a missing device is not an error; the
    /// removal notification must still go out even when the record is
    /// already gone.
    pub async fn delete(&self, username: &str, external_id: &str) -> Result<(), StorageError> {
        self.store
            .delete(&RecordKey::device(username, external_id))
            .await
    }

    /// Lists every device owned by `username`.
    pub async fn list_all(&self, username: &str) -> Result<Vec<Device>, StorageError> {
        let records = self.store.query_owner(username, RecordTag::Device).await?;
        Ok(records
            .into_iter()
            .filter_map(|record| match record {
                StoredRecord::Device(device) => Some(device),
                _ => None,
            })
            .collect())
    }

    /// Overwrites each key of `partial` in the device's state map, leaving
    /// untouched keys unchanged.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the device does not exist.
    pub async fn merge_state(
        &self,
        username: &str,
        external_id: &str,
        partial: &StateMap,
    ) -> Result<Device, StorageError> {
        debug!(username, external_id, keys = partial.len(), "merge device state");
        let mut device = self.get(username, external_id).await?;
        merge_states(&mut device.states, partial);
        self.store
            .put(
                RecordKey::device(username, external_id),
                StoredRecord::Device(device.clone()),
            )
            .await?;
        Ok(device)
    }

    /// Deletes the named keys from the device's state map.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the device does not exist.
    pub async fn remove_state_keys(
        &self,
        username: &str,
        external_id: &str,
        keys: &[String],
    ) -> Result<Device, StorageError> {
        let mut device = self.get(username, external_id).await?;
        remove_state_keys(&mut device.states, keys);
        self.store
            .put(
                RecordKey::device(username, external_id),
                StoredRecord::Device(device.clone()),
            )
            .await?;
        Ok(device)
    }

    /// Updates the display name.
    pub async fn rename(
        &self,
        username: &str,
        external_id: &str,
        display_name: &str,
    ) -> Result<Device, StorageError> {
        validate_identifier("displayName", display_name)?;
        let mut device = self.get(username, external_id).await?;
        device.display_name = display_name.to_string();
        self.store
            .put(
                RecordKey::device(username, external_id),
                StoredRecord::Device(device.clone()),
            )
            .await?;
        Ok(device)
    }

    /// Updates the handler type.
    pub async fn set_handler_type(
        &self,
        username: &str,
        external_id: &str,
        handler_type: &str,
    ) -> Result<Device, StorageError> {
        validate_identifier("handlerType", handler_type)?;
        let mut device = self.get(username, external_id).await?;
        device.handler_type = handler_type.to_string();
        self.store
            .put(
                RecordKey::device(username, external_id),
                StoredRecord::Device(device.clone()),
            )
            .await?;
        Ok(device)
    }
}
