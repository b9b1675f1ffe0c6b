//! Protocol request dispatch.

use std::sync::Arc;

use tracing::debug;

use homelink_auth::{AuthError, CredentialStore, SubscriptionDirectory};
use homelink_storage::DeviceStore;

use crate::engine::StateSyncEngine;
use crate::error::SyncError;
use crate::gateway::{DeviceState, DiscoveryDevice};
use crate::mapper::StateMapper;
use crate::protocol::{CommandTarget, GlobalErrorType, ProtocolRequest, ProtocolResponse};

/// Handles decoded protocol requests against the stores and the sync
/// engine.
///
/// Mirrors the platform's handler set: discovery, state refresh, command
/// execution, callback-access grants, and integration deletion.
pub struct Connector {
    credentials: CredentialStore,
    directory: SubscriptionDirectory,
    devices: DeviceStore,
    engine: Arc<StateSyncEngine>,
    mapper: Arc<dyn StateMapper>,
}

impl Connector {
    #[must_use]
    pub fn new(
        credentials: CredentialStore,
        directory: SubscriptionDirectory,
        devices: DeviceStore,
        engine: Arc<StateSyncEngine>,
        mapper: Arc<dyn StateMapper>,
    ) -> Self {
        Self {
            credentials,
            directory,
            devices,
            engine,
            mapper,
        }
    }

    /// Dispatches one request to its handler.
    pub async fn handle(&self, request: ProtocolRequest) -> Result<ProtocolResponse, SyncError> {
        match request {
            ProtocolRequest::Discovery { access_token } => self.discovery(&access_token).await,
            ProtocolRequest::StateRefresh {
                access_token,
                device_ids,
            } => self.state_refresh(&access_token, &device_ids).await,
            ProtocolRequest::Command {
                access_token,
                devices,
            } => self.command(&access_token, devices).await,
            ProtocolRequest::CallbackAccess {
                access_token,
                auth,
                callback_urls,
            } => {
                self.credentials
                    .attach_subscription(&access_token, auth, callback_urls)
                    .await?;
                debug!("callback access granted");
                Ok(ProtocolResponse::Acknowledged)
            }
            ProtocolRequest::IntegrationDeleted { access_token } => {
                match self.credentials.revoke(&access_token).await {
                    Ok(()) | Err(AuthError::NotFound { .. }) => {
                        Ok(ProtocolResponse::Acknowledged)
                    }
                    Err(err) => Err(err.into()),
                }
            }
        }
    }

    async fn discovery(&self, access_token: &str) -> Result<ProtocolResponse, SyncError> {
        let Some(username) = self.resolve_account(access_token).await? else {
            // A deleted integration discovers nothing.
            return Ok(ProtocolResponse::Discovery { devices: vec![] });
        };

        let devices = self
            .devices
            .list_all(&username)
            .await?
            .iter()
            .map(DiscoveryDevice::from)
            .collect();
        Ok(ProtocolResponse::Discovery { devices })
    }

    async fn state_refresh(
        &self,
        access_token: &str,
        device_ids: &[String],
    ) -> Result<ProtocolResponse, SyncError> {
        let Some(username) = self.resolve_account(access_token).await? else {
            return Ok(ProtocolResponse::DeviceStates { devices: vec![] });
        };

        let devices = self
            .devices
            .list_all(&username)
            .await?
            .into_iter()
            .filter(|device| device_ids.contains(&device.external_id))
            .map(|device| {
                let states = self.mapper.external_states(&device.states, &device.states);
                DeviceState::with_states(device.external_id, states)
            })
            .collect();
        Ok(ProtocolResponse::DeviceStates { devices })
    }

    async fn command(
        &self,
        access_token: &str,
        targets: Vec<CommandTarget>,
    ) -> Result<ProtocolResponse, SyncError> {
        let Some(username) = self.resolve_account(access_token).await? else {
            return Ok(ProtocolResponse::GlobalError {
                error: GlobalErrorType::IntegrationDeleted,
                detail: "Integration deleted".to_string(),
            });
        };

        let mut responses = Vec::with_capacity(targets.len());
        for target in targets {
            match self.devices.get(&username, &target.external_device_id).await {
                Ok(device) => {
                    let changed = self.mapper.states_for_commands(&target.commands);
                    let updated = self
                        .devices
                        .merge_state(&username, &device.external_id, &changed)
                        .await?;

                    let mut echoed = DeviceState::with_states(
                        device.external_id.clone(),
                        self.mapper.external_states(&changed, &updated.states),
                    );
                    echoed.device_cookie = target.device_cookie;
                    responses.push(echoed);

                    // The commanding token is the origin; its subscription
                    // must not hear its own write back.
                    self.engine
                        .notify_state_change(
                            &username,
                            &device.external_id,
                            &changed,
                            Some(access_token),
                        )
                        .await?;
                }
                Err(err) if err.is_not_found() => {
                    let mut deleted = DeviceState::deleted(target.external_device_id);
                    deleted.device_cookie = target.device_cookie;
                    responses.push(deleted);
                }
                Err(err) => return Err(err.into()),
            }
        }
        Ok(ProtocolResponse::DeviceStates { devices: responses })
    }

    async fn resolve_account(&self, access_token: &str) -> Result<Option<String>, SyncError> {
        match self.directory.account_for_token(access_token).await {
            Ok(account) => Ok(Some(account.username)),
            Err(AuthError::Unauthorized { .. }) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}
