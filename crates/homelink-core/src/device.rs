//! Device and account records.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::state::StateMap;

/// A third-party device owned by an account.
///
/// `external_id` is opaque, immutable, and unique within the owning
/// account. `states` is schemaless; see [`crate::state`] for merge
/// semantics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    /// Opaque immutable identifier.
    pub external_id: String,

    /// Device handler type, e.g. `"c2c-switch"`. Interpreted by the
    /// device-type catalog, which is outside this core.
    pub handler_type: String,

    /// Human-readable name.
    pub display_name: String,

    /// Current attribute map.
    pub states: StateMap,
}

/// An account, referenced only to resolve ownership.
///
/// Password verification belongs to the console login path, which this
/// core does not implement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub username: String,
    pub password_hash: String,
    pub salt: String,
}

/// Rejects empty or whitespace-only identifier values.
///
/// `what` names the field in the resulting error message.
pub fn validate_identifier(what: &str, value: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::invalid_id(format!("{what} must not be empty")));
    }
    Ok(())
}
