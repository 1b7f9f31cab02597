//! Adapters - Implementations of port interfaces.
//!
//! - `scheduler` - Effect scheduler implementations (in-memory)

pub mod scheduler;

pub use scheduler::{InMemoryScheduler, ScheduledWorkflow};
