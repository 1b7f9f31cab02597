//! Foundation module - Shared domain primitives.
//!
//! Contains the action object, the function shapes passed around by the
//! builders, the snapshot primitive and the error types that form the
//! vocabulary of the command registry.

mod action;
mod errors;
mod snapshot;

pub use action::{
    empty_payload, noop_transition, payload_fn, transition_fn, Action, Hook, Payload, PayloadFn,
    State, TransitionFn, TYPE_FIELD,
};
pub use errors::{ChainError, CommandError, DispatchError};
pub use snapshot::{deep_merge, produce};
