//! Command Chain - Named-command registry builder
//!
//! Declares uniquely named commands with deterministic identifiers, payload
//! constructors, state transitions and tag-resolved hooks, and exposes a
//! total root dispatcher plus workflow binding metadata.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;

pub use domain::area::{AreaConfig, Base, BaseBuilder};
pub use domain::chain::{FetchBundle, FetchChain, PlainChain};
pub use domain::command::{CommandDescriptor, CommandMeta, FailureCommand};
pub use domain::foundation::{
    payload_fn, transition_fn, Action, ChainError, CommandError, DispatchError, Payload, State,
};
pub use domain::interceptor::HookMap;
pub use domain::naming::{NamingConvention, Postfixes, Stage};
pub use domain::registry::{Registry, RootReducer};
pub use domain::workflow::{Strategy, WorkflowBinder, WorkflowBinding, WorkflowTarget};
