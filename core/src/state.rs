//! Component state merging.
//!
//! State is a [`serde_json::Value`]. Only objects count as structured: arrays and scalars
//! are always overwritten as a whole.

use serde_json::{Map, Value};

/// Applies `patch` to `current`.
///
/// Without a current state, or with a non-object one, the patch replaces it wholesale. An
/// object state absorbs an object patch key by key: a key whose current value is an object
/// and whose patch value is an object is merged recursively; every other key is
/// overwritten. Keys missing from the patch are never removed.
pub fn merge_state(current: &mut Option<Value>, patch: Value) {
    match (current.as_mut(), patch) {
        (Some(Value::Object(state)), Value::Object(patch)) => merge_object(state, patch),
        (_, patch) => *current = Some(patch),
    }
}

fn merge_object(state: &mut Map<String, Value>, patch: Map<String, Value>) {
    for (key, value) in patch {
        match (state.get_mut(&key), value) {
            (Some(Value::Object(nested)), Value::Object(value)) => merge_object(nested, value),
            (_, value) => {
                state.insert(key, value);
            }
        }
    }
}
