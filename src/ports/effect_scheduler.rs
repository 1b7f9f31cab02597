//! EffectScheduler port - Interface to the runtime that executes workflows.
//!
//! The registry only records bindings. Running handlers, and honouring the
//! invocation strategy, is the scheduler's contract.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::foundation::{Action, CommandError};
use crate::domain::workflow::Strategy;

/// Asynchronous workflow triggered by a dispatched action.
///
/// # Example
///
/// ```ignore
/// struct LoadTodos { api: Arc<dyn TodoApi> }
///
/// #[async_trait]
/// impl WorkflowHandler for LoadTodos {
///     async fn run(&self, action: Action) -> Result<(), CommandError> {
///         let items = self.api.fetch().await?;
///         // dispatch the success stage...
///         Ok(())
///     }
///
///     fn name(&self) -> &'static str {
///         "LoadTodos"
///     }
/// }
/// ```
#[async_trait]
pub trait WorkflowHandler: Send + Sync {
    /// Run the workflow for one dispatched action.
    async fn run(&self, action: Action) -> Result<(), CommandError>;

    /// Handler name for logging.
    fn name(&self) -> &'static str;
}

/// Port for the external effect runtime.
///
/// Receives `(strategy, identifier, handler)` and is responsible for
/// invoking `handler` whenever an action bearing `identifier` is dispatched.
pub trait EffectScheduler: Send + Sync {
    fn schedule(&self, strategy: Strategy, identifier: &str, handler: Arc<dyn WorkflowHandler>);
}
