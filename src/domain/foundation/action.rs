//! Action objects and the function shapes that produce and consume them.
//!
//! An `Action` is a JSON object carrying the reserved `type` field. The
//! identifier stamped there always wins over caller-supplied fields.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::sync::Arc;

use super::CommandError;

/// Reserved key holding the full identifier of a command.
pub const TYPE_FIELD: &str = "type";

/// Plain payload object produced by a payload constructor.
pub type Payload = Map<String, JsonValue>;

/// Working state of an Area (normally a JSON object).
pub type State = JsonValue;

/// Builds a payload from call arguments (`Value::Null` when there are none).
pub type PayloadFn = Arc<dyn Fn(&JsonValue) -> Result<Payload, CommandError> + Send + Sync>;

/// Mutates a working copy of state in response to an action.
pub type TransitionFn = Arc<dyn Fn(&mut State, &Action) -> Result<(), CommandError> + Send + Sync>;

/// Cross-cutting transition registered under a tag.
pub type Hook = TransitionFn;

/// Shares a payload constructor.
pub fn payload_fn<F>(f: F) -> PayloadFn
where
    F: Fn(&JsonValue) -> Result<Payload, CommandError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Shares a transition or hook.
pub fn transition_fn<F>(f: F) -> TransitionFn
where
    F: Fn(&mut State, &Action) -> Result<(), CommandError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Payload constructor used when a stage declares none.
pub fn empty_payload() -> PayloadFn {
    payload_fn(|_| Ok(Payload::new()))
}

/// Transition used when a stage declares none.
pub fn noop_transition() -> TransitionFn {
    transition_fn(|_, _| Ok(()))
}

/// Event object dispatched into a registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Action(Payload);

impl Action {
    /// Creates an action carrying only an identifier.
    pub fn new(identifier: impl Into<String>) -> Self {
        Self::from_payload(identifier, Payload::new())
    }

    /// Stamps `identifier` onto `payload`, replacing any caller `type` field.
    pub fn from_payload(identifier: impl Into<String>, mut payload: Payload) -> Self {
        payload.insert(TYPE_FIELD.to_string(), JsonValue::String(identifier.into()));
        Self(payload)
    }

    /// Wraps an arbitrary JSON object without stamping.
    ///
    /// Used for actions arriving from an outer dispatch loop. Such an action
    /// may lack a `type` field, in which case no command matches it.
    pub fn from_raw(payload: Payload) -> Self {
        Self(payload)
    }

    /// Returns the identifier held in the `type` field.
    pub fn action_type(&self) -> Option<&str> {
        self.0.get(TYPE_FIELD).and_then(JsonValue::as_str)
    }

    /// Returns a payload field.
    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.0.get(key)
    }

    /// Returns the full object, `type` included.
    pub fn fields(&self) -> &Payload {
        &self.0
    }

    /// Consumes the action into its JSON object form.
    pub fn into_value(self) -> JsonValue {
        JsonValue::Object(self.0)
    }
}

impl From<Action> for JsonValue {
    fn from(action: Action) -> Self {
        action.into_value()
    }
}
