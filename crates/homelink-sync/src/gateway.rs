//! The callback delivery seam.
//!
//! Wire-level payload construction and validation belong to the external
//! protocol library; this trait is the boundary the sync engine talks
//! through. A delivery may come back with a transparently refreshed
//! callback credential, which the engine persists before moving on.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use homelink_core::Device;
use homelink_storage::{CallbackAuth, CallbackUrls};

/// Errors from one callback delivery. Always scoped to one subscriber and
/// caught at the fan-out boundary.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The subscriber endpoint could not be reached.
    #[error("Request failed: {0}")]
    Request(String),

    /// The subscriber answered with a non-success status.
    #[error("Rejected with status {status}")]
    Rejected {
        /// HTTP status returned by the subscriber.
        status: u16,
    },

    /// The stored callback credential is expired and could not be
    /// refreshed.
    #[error("Credential refresh failed: {0}")]
    RefreshFailed(String),
}

/// Result of a successful delivery.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallbackResult {
    /// Set when the delivery refreshed the callback credential in passing.
    pub refreshed_auth: Option<CallbackAuth>,
}

/// Per-device error codes understood by subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviceErrorType {
    DeviceDeleted,
}

/// One per-device error in a state payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceErrorEntry {
    pub error_enum: DeviceErrorType,
    pub detail: String,
}

/// Normalized per-device slice of a state update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceState {
    pub external_device_id: String,

    /// Externally reported state representation, as produced by the
    /// mapping collaborator.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub states: Option<Value>,

    /// Opaque cookie echoed back on command responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_cookie: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_error: Option<Vec<DeviceErrorEntry>>,
}

impl DeviceState {
    /// A plain state slice.
    #[must_use]
    pub fn with_states(external_device_id: impl Into<String>, states: Value) -> Self {
        Self {
            external_device_id: external_device_id.into(),
            states: Some(states),
            device_cookie: None,
            device_error: None,
        }
    }

    /// A deletion notice. Deliverable even when the device record is
    /// already gone.
    #[must_use]
    pub fn deleted(external_device_id: impl Into<String>) -> Self {
        Self {
            external_device_id: external_device_id.into(),
            states: None,
            device_cookie: None,
            device_error: Some(vec![DeviceErrorEntry {
                error_enum: DeviceErrorType::DeviceDeleted,
                detail: "Device deleted".to_string(),
            }]),
        }
    }
}

/// Device description sent to subscribers when a device appears.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryDevice {
    pub external_device_id: String,
    pub friendly_name: String,
    pub device_handler_type: String,
}

impl From<&Device> for DiscoveryDevice {
    fn from(device: &Device) -> Self {
        Self {
            external_device_id: device.external_id.clone(),
            friendly_name: device.display_name.clone(),
            device_handler_type: device.handler_type.clone(),
        }
    }
}

/// Delivers protocol payloads to one subscriber endpoint.
#[async_trait]
pub trait CallbackGateway: Send + Sync {
    /// Delivers a state update (or deletion notice) batch.
    async fn send_state_update(
        &self,
        urls: &CallbackUrls,
        auth: &CallbackAuth,
        device_states: &[DeviceState],
    ) -> Result<CallbackResult, GatewayError>;

    /// Announces a newly added device.
    async fn send_discovery(
        &self,
        urls: &CallbackUrls,
        auth: &CallbackAuth,
        device: &DiscoveryDevice,
    ) -> Result<CallbackResult, GatewayError>;
}
