//! Snapshot primitive and initial-state merging.

use serde_json::Value as JsonValue;

use super::State;

/// Produces a new state by running `mutator` on a working copy of `base`.
///
/// `base` is never touched. When `mutator` fails, the working copy is
/// dropped with every partial edit and the error is returned as-is.
pub fn produce<E, F>(base: &State, mutator: F) -> Result<State, E>
where
    F: FnOnce(&mut State) -> Result<(), E>,
{
    let mut draft = base.clone();
    mutator(&mut draft)?;
    Ok(draft)
}

/// Deep-merges `overlay` into a copy of `base`.
///
/// Objects merge key by key, recursively. On any other collision the
/// overlay value wins, `null` included.
pub fn deep_merge(base: &JsonValue, overlay: &JsonValue) -> JsonValue {
    match (base, overlay) {
        (JsonValue::Object(base_map), JsonValue::Object(overlay_map)) => {
            let mut merged = base_map.clone();
            for (key, value) in overlay_map {
                let next = match merged.get(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value.clone(),
                };
                merged.insert(key.clone(), next);
            }
            JsonValue::Object(merged)
        }
        (_, overlay) => overlay.clone(),
    }
}
