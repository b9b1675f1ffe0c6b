//! The fan-out orchestrator.

use std::sync::Arc;

use serde_json::json;
use tracing::{debug, warn};

use homelink_auth::{CredentialStore, SubscriptionDirectory, SubscriptionEntry};
use homelink_core::{Device, StateMap};
use homelink_storage::DeviceStore;

use crate::error::SyncError;
use crate::gateway::{CallbackGateway, DeviceState, DiscoveryDevice};
use crate::mapper::StateMapper;
use crate::pusher::{LivePayload, Pusher};

/// What gets delivered to each subscriber for one event.
enum FanoutPayload {
    States(Vec<DeviceState>),
    Discovery(DiscoveryDevice),
}

/// Orchestrates delivery of device changes to everyone interested in an
/// account.
///
/// For each event: the live channel is pushed unconditionally (the UI must
/// always observe its own writes), then every qualifying subscription is
/// attempted except the optional origin token, which suppresses the
/// feedback loop of a command notifying the session that issued it.
///
/// Each subscriber is its own failure domain: a delivery error is logged
/// and the loop moves on. When a delivery reports a refreshed callback
/// credential, it is persisted before the next entry is attempted.
pub struct StateSyncEngine {
    directory: SubscriptionDirectory,
    credentials: CredentialStore,
    devices: DeviceStore,
    pusher: Pusher,
    gateway: Arc<dyn CallbackGateway>,
    mapper: Arc<dyn StateMapper>,
}

impl StateSyncEngine {
    #[must_use]
    pub fn new(
        directory: SubscriptionDirectory,
        credentials: CredentialStore,
        devices: DeviceStore,
        pusher: Pusher,
        gateway: Arc<dyn CallbackGateway>,
        mapper: Arc<dyn StateMapper>,
    ) -> Self {
        Self {
            directory,
            credentials,
            devices,
            pusher,
            gateway,
            mapper,
        }
    }

    /// Notifies all interested parties that `changed_states` were written
    /// to one device.
    ///
    /// `origin_token` is the access token whose command caused the change,
    /// if any; that one subscription is skipped.
    ///
    /// # Errors
    ///
    /// Fails only before fan-out: resolving the canonical device record or
    /// the subscription list. Per-recipient delivery failures never
    /// surface.
    pub async fn notify_state_change(
        &self,
        username: &str,
        device_id: &str,
        changed_states: &StateMap,
        origin_token: Option<&str>,
    ) -> Result<(), SyncError> {
        let device = self.devices.get(username, device_id).await?;
        let states = self.mapper.external_states(changed_states, &device.states);
        let device_states = vec![DeviceState::with_states(device_id, states)];

        self.pusher
            .push(
                username,
                &LivePayload::new("state-update", json!(device_states)),
            )
            .await;

        self.fan_out(
            username,
            origin_token,
            &FanoutPayload::States(device_states),
        )
        .await
    }

    /// Announces a newly created device to the live channel and every
    /// subscriber.
    pub async fn notify_device_added(
        &self,
        username: &str,
        device: &Device,
    ) -> Result<(), SyncError> {
        let discovery = DiscoveryDevice::from(device);

        self.pusher
            .push(username, &LivePayload::new("device-added", json!(discovery)))
            .await;

        self.fan_out(username, None, &FanoutPayload::Discovery(discovery))
            .await
    }

    /// Announces a device removal.
    ///
    /// The underlying record may already be gone; the notification is
    /// built without resolving it.
    pub async fn notify_device_removed(
        &self,
        username: &str,
        device_id: &str,
    ) -> Result<(), SyncError> {
        let device_states = vec![DeviceState::deleted(device_id)];

        self.pusher
            .push(
                username,
                &LivePayload::new("device-removed", json!(device_states)),
            )
            .await;

        self.fan_out(username, None, &FanoutPayload::States(device_states))
            .await
    }

    /// Attempts delivery to every qualifying subscription once, skipping
    /// `exclude`, isolating each failure to its own entry.
    async fn fan_out(
        &self,
        username: &str,
        exclude: Option<&str>,
        payload: &FanoutPayload,
    ) -> Result<(), SyncError> {
        let entries = self.directory.list_for_account(username).await?;
        debug!(username, count = entries.len(), "fanning out");

        for entry in entries {
            if exclude == Some(entry.access_token.as_str()) {
                debug!(username, "skipping origin token");
                continue;
            }
            self.deliver(username, &entry, payload).await;
        }
        Ok(())
    }

    async fn deliver(&self, username: &str, entry: &SubscriptionEntry, payload: &FanoutPayload) {
        let result = match payload {
            FanoutPayload::States(states) => {
                self.gateway
                    .send_state_update(&entry.callback_urls, &entry.auth, states)
                    .await
            }
            FanoutPayload::Discovery(device) => {
                self.gateway
                    .send_discovery(&entry.callback_urls, &entry.auth, device)
                    .await
            }
        };

        match result {
            Ok(outcome) => {
                if let Some(refreshed) = outcome.refreshed_auth
                    && let Err(err) = self
                        .credentials
                        .refresh_subscription_credential(&entry.access_token, refreshed)
                        .await
                {
                    warn!(
                        username,
                        url = entry.callback_urls.state_callback,
                        %err,
                        "failed to persist refreshed callback credential"
                    );
                }
            }
            Err(err) => {
                warn!(
                    username,
                    url = entry.callback_urls.state_callback,
                    %err,
                    "callback delivery failed"
                );
            }
        }
    }
}
