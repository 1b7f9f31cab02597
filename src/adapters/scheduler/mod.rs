//! Effect scheduler adapters.

mod in_memory;

pub use in_memory::{InMemoryScheduler, ScheduledWorkflow};
