//! Error types for the domain layer.
//!
//! Three families exist:
//! - `CommandError` - raised by caller code (payload constructors, transitions, hooks)
//! - `DispatchError` - a `CommandError` annotated with the identifier being dispatched
//! - `ChainError` - configuration mistakes detected while building chains or bindings

use thiserror::Error;

/// Errors raised by caller-supplied logic during invocation or dispatch.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandError {
    #[error("Command rejected: {reason}")]
    Rejected { reason: String },

    #[error("Field '{field}' has invalid payload value: {reason}")]
    InvalidPayload { field: String, reason: String },

    #[error("JSON error: {0}")]
    Json(String),
}

impl CommandError {
    /// Creates a rejection with a free-form reason.
    pub fn rejected(reason: impl Into<String>) -> Self {
        CommandError::Rejected {
            reason: reason.into(),
        }
    }

    /// Creates an invalid payload error for a specific field.
    pub fn invalid_payload(field: impl Into<String>, reason: impl Into<String>) -> Self {
        CommandError::InvalidPayload {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for CommandError {
    fn from(err: serde_json::Error) -> Self {
        CommandError::Json(err.to_string())
    }
}

/// Failure while dispatching an action through a registry.
///
/// The state handed to `dispatch` is left untouched when this is returned.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Dispatch of '{identifier}' failed: {source}")]
pub struct DispatchError {
    pub identifier: String,
    #[source]
    pub source: CommandError,
}

impl DispatchError {
    pub fn new(identifier: impl Into<String>, source: CommandError) -> Self {
        Self {
            identifier: identifier.into(),
            source,
        }
    }
}

/// Configuration errors surfaced at the offending builder call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    #[error("Fetch chain '{name}' requested the base failure command, but none is configured")]
    MissingBaseFailure { name: String },

    #[error("Fetch chain '{name}' requested the area failure command, but none is configured")]
    MissingAreaFailure { name: String },

    #[error("Workflow target has no extractable identifier")]
    UnboundWorkflow,
}
