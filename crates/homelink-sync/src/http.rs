//! HTTP implementation of the callback gateway.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};
use uuid::Uuid;

use homelink_config::ConnectorConfig;
use homelink_core::is_expired;
use homelink_storage::{CallbackAuth, CallbackUrls};

use crate::gateway::{CallbackGateway, CallbackResult, DeviceState, DiscoveryDevice, GatewayError};

/// Delivers callback payloads over HTTPS with bearer authentication.
///
/// When the stored callback credential is expired, or the subscriber
/// answers 401, the gateway refreshes the credential against the
/// subscriber's token endpoint (once per delivery) and reports the new
/// credential back to the caller for persistence.
pub struct HttpCallbackGateway {
    client: reqwest::Client,
    config: ConnectorConfig,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

impl HttpCallbackGateway {
    #[must_use]
    pub fn new(config: ConnectorConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    async fn post(
        &self,
        urls: &CallbackUrls,
        auth: &CallbackAuth,
        interaction: &str,
        body_key: &str,
        body: serde_json::Value,
    ) -> Result<CallbackResult, GatewayError> {
        let mut auth = auth.clone();
        let mut refreshed = false;

        // A credential known to be expired is refreshed up front rather
        // than burning a delivery on a guaranteed 401.
        if let Some(expires_at) = auth.expires_at
            && is_expired(expires_at)
        {
            auth = self.refresh(urls, &auth).await?;
            refreshed = true;
        }

        let mut status = self.post_once(urls, &auth, interaction, body_key, &body).await?;
        if status == 401 && !refreshed {
            warn!(url = urls.state_callback, "callback rejected credential, refreshing");
            auth = self.refresh(urls, &auth).await?;
            refreshed = true;
            status = self.post_once(urls, &auth, interaction, body_key, &body).await?;
        }

        if !(200..300).contains(&status) {
            return Err(GatewayError::Rejected { status });
        }
        debug!(url = urls.state_callback, interaction, "callback delivered");
        Ok(CallbackResult {
            refreshed_auth: refreshed.then_some(auth),
        })
    }

    async fn post_once(
        &self,
        urls: &CallbackUrls,
        auth: &CallbackAuth,
        interaction: &str,
        body_key: &str,
        body: &serde_json::Value,
    ) -> Result<u16, GatewayError> {
        let mut payload = serde_json::Map::new();
        payload.insert(
            "headers".to_string(),
            json!({
                "interactionType": interaction,
                "requestId": Uuid::new_v4().to_string(),
            }),
        );
        payload.insert(
            "authentication".to_string(),
            json!({
                "tokenType": auth.token_type.as_deref().unwrap_or("Bearer"),
                "token": auth.access_token,
            }),
        );
        payload.insert(body_key.to_string(), body.clone());
        let payload = serde_json::Value::Object(payload);

        let response = self
            .client
            .post(&urls.state_callback)
            .bearer_auth(&auth.access_token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| GatewayError::Request(e.to_string()))?;
        Ok(response.status().as_u16())
    }

    async fn refresh(
        &self,
        urls: &CallbackUrls,
        auth: &CallbackAuth,
    ) -> Result<CallbackAuth, GatewayError> {
        let token_url = urls
            .oauth_token
            .as_deref()
            .ok_or_else(|| GatewayError::RefreshFailed("no token endpoint registered".into()))?;
        let refresh_token = auth
            .refresh_token
            .as_deref()
            .ok_or_else(|| GatewayError::RefreshFailed("no refresh token stored".into()))?;

        let response = self
            .client
            .post(token_url)
            .json(&json!({
                "grant_type": "refresh_token",
                "refresh_token": refresh_token,
                "client_id": self.config.client_id,
                "client_secret": self.config.client_secret,
            }))
            .send()
            .await
            .map_err(|e| GatewayError::RefreshFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GatewayError::RefreshFailed(format!(
                "token endpoint answered {}",
                response.status()
            )));
        }

        let refreshed: RefreshResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::RefreshFailed(e.to_string()))?;
        Ok(CallbackAuth {
            access_token: refreshed.access_token,
            refresh_token: refreshed.refresh_token.or_else(|| auth.refresh_token.clone()),
            token_type: refreshed.token_type.or_else(|| auth.token_type.clone()),
            expires_in: refreshed.expires_in,
            expires_at: None,
        })
    }
}

#[async_trait]
impl CallbackGateway for HttpCallbackGateway {
    async fn send_state_update(
        &self,
        urls: &CallbackUrls,
        auth: &CallbackAuth,
        device_states: &[DeviceState],
    ) -> Result<CallbackResult, GatewayError> {
        self.post(urls, auth, "stateCallback", "deviceState", json!(device_states))
            .await
    }

    async fn send_discovery(
        &self,
        urls: &CallbackUrls,
        auth: &CallbackAuth,
        device: &DiscoveryDevice,
    ) -> Result<CallbackResult, GatewayError> {
        self.post(urls, auth, "discoveryCallback", "device", json!(device))
            .await
    }
}
