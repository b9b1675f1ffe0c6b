//! The state mapping collaborator.
//!
//! Real deployments translate between the connector's internal attribute
//! maps and the platform's capability model (including unit conversion,
//! which lives outside this core). The engine only needs the two
//! translations below.

use serde_json::Value;

use homelink_core::StateMap;

use crate::protocol::CommandEntry;

/// Translates internal state maps to the externally reported
/// representation and inbound commands to state writes.
pub trait StateMapper: Send + Sync {
    /// External representation of `changed`, with the device's full
    /// `current` map available for context.
    fn external_states(&self, changed: &StateMap, current: &StateMap) -> Value;

    /// The state writes implied by a command batch.
    fn states_for_commands(&self, commands: &[CommandEntry]) -> StateMap;
}

/// Identity mapping: states pass through as a JSON object, a command
/// becomes a write of its command name under its capability key.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughMapper;

impl StateMapper for PassthroughMapper {
    fn external_states(&self, changed: &StateMap, _current: &StateMap) -> Value {
        Value::Object(
            changed
                .iter()
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        )
    }

    fn states_for_commands(&self, commands: &[CommandEntry]) -> StateMap {
        commands
            .iter()
            .map(|entry| {
                let value = entry
                    .arguments
                    .first()
                    .cloned()
                    .unwrap_or_else(|| Value::String(entry.command.clone()));
                (entry.capability.clone(), value)
            })
            .collect()
    }
}
