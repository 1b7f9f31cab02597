//! Ports - Interfaces for external dependencies.
//!
//! Ports define the contracts between the registry and the runtimes that
//! consume its output. Adapters implement these ports.
//!
//! ## Workflow Ports
//!
//! - `WorkflowHandler` - Asynchronous workflow bound to a command identifier
//! - `EffectScheduler` - Runtime that receives workflow bindings

mod effect_scheduler;

pub use effect_scheduler::{EffectScheduler, WorkflowHandler};
