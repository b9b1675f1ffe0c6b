//! Inbound protocol requests and their responses.
//!
//! The wire library decodes protocol messages into these tagged variants;
//! [`Connector`](crate::Connector) dispatches them. One variant per
//! protocol operation, nothing duck-typed.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use homelink_storage::{CallbackAuth, CallbackUrls};

use crate::gateway::{DeviceState, DiscoveryDevice};

/// One command against one device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandEntry {
    pub capability: String,
    pub command: String,
    #[serde(default)]
    pub arguments: Vec<Value>,
}

/// A device addressed by a command request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandTarget {
    pub external_device_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_cookie: Option<String>,
    pub commands: Vec<CommandEntry>,
}

/// A decoded inbound protocol request. Every variant carries the caller's
/// access token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "interaction", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ProtocolRequest {
    /// Enumerate the caller's devices.
    Discovery { access_token: String },

    /// Report current states for the named devices.
    StateRefresh {
        access_token: String,
        device_ids: Vec<String>,
    },

    /// Execute commands and echo the resulting states.
    Command {
        access_token: String,
        devices: Vec<CommandTarget>,
    },

    /// The platform granted callback access for this token.
    CallbackAccess {
        access_token: String,
        auth: CallbackAuth,
        callback_urls: CallbackUrls,
    },

    /// The integration was deleted upstream; its credentials must go.
    IntegrationDeleted { access_token: String },
}

impl ProtocolRequest {
    /// The access token the request was made with.
    #[must_use]
    pub fn access_token(&self) -> &str {
        match self {
            Self::Discovery { access_token }
            | Self::StateRefresh { access_token, .. }
            | Self::Command { access_token, .. }
            | Self::CallbackAccess { access_token, .. }
            | Self::IntegrationDeleted { access_token } => access_token,
        }
    }
}

/// Request-level error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GlobalErrorType {
    IntegrationDeleted,
}

/// The response to one protocol request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ProtocolResponse {
    /// Device list for a discovery request.
    Discovery { devices: Vec<DiscoveryDevice> },

    /// Per-device states (and per-device errors) for state refresh and
    /// command requests.
    DeviceStates { devices: Vec<DeviceState> },

    /// Callback access or integration deletion processed.
    Acknowledged,

    /// The whole request failed, e.g. the token no longer maps to an
    /// account.
    GlobalError {
        error: GlobalErrorType,
        detail: String,
    },
}
