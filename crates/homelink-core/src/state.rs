//! Schemaless device state maps.
//!
//! Device state is a flat map of attribute name to JSON value. Keys are
//! merged and removed individually; the map is never replaced wholesale.

use std::collections::BTreeMap;

use serde_json::Value;

/// Attribute-name to value map for a device.
pub type StateMap = BTreeMap<String, Value>;

/// Overwrites each key of `partial` into `states`, leaving untouched keys
/// unchanged. Applying the same partial twice yields the same result as
/// applying it once.
pub fn merge_states(states: &mut StateMap, partial: &StateMap) {
    for (key, value) in partial {
        states.insert(key.clone(), value.clone());
    }
}

/// Removes the named keys from `states`. Missing keys are ignored.
pub fn remove_state_keys(states: &mut StateMap, keys: &[String]) {
    for key in keys {
        states.remove(key);
    }
}
