//! Workflow binding records.
//!
//! Records which asynchronous workflow runs for which request identifier,
//! and under which invocation strategy. Nothing is executed here; the
//! records are handed to an [`EffectScheduler`](crate::ports::EffectScheduler).

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use super::chain::FetchBundle;
use super::command::CommandDescriptor;
use super::foundation::{Action, ChainError, TYPE_FIELD};
use crate::ports::{EffectScheduler, WorkflowHandler};

/// How the scheduler should treat overlapping runs of one workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Run for every dispatch.
    Every,
    /// Run for the latest dispatch only, superseding earlier runs.
    Latest,
    /// Run for the first dispatch and ignore others until it is done.
    Leading,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Strategy::Every => "every",
            Strategy::Latest => "latest",
            Strategy::Leading => "leading",
        };
        write!(f, "{}", s)
    }
}

/// Anything a workflow can be keyed on.
pub trait WorkflowTarget {
    /// Identifier the workflow listens to, if one can be extracted.
    fn workflow_identifier(&self) -> Option<&str>;
}

impl WorkflowTarget for CommandDescriptor {
    fn workflow_identifier(&self) -> Option<&str> {
        Some(self.identifier())
    }
}

/// A fetch bundle is keyed on its request stage.
impl WorkflowTarget for FetchBundle {
    fn workflow_identifier(&self) -> Option<&str> {
        Some(self.request.identifier())
    }
}

impl WorkflowTarget for Action {
    fn workflow_identifier(&self) -> Option<&str> {
        self.action_type()
    }
}

impl WorkflowTarget for JsonValue {
    fn workflow_identifier(&self) -> Option<&str> {
        self.get(TYPE_FIELD).and_then(JsonValue::as_str)
    }
}

/// One recorded binding.
#[derive(Clone)]
pub struct WorkflowBinding {
    pub identifier: String,
    pub strategy: Strategy,
    pub handler: Arc<dyn WorkflowHandler>,
}

impl fmt::Debug for WorkflowBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkflowBinding")
            .field("identifier", &self.identifier)
            .field("strategy", &self.strategy)
            .field("handler", &self.handler.name())
            .finish()
    }
}

/// Collects workflow bindings in registration order.
#[derive(Debug, Default)]
pub struct WorkflowBinder {
    bindings: Vec<WorkflowBinding>,
}

impl WorkflowBinder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `handler` for the identifier extracted from `target`.
    ///
    /// # Errors
    ///
    /// - `UnboundWorkflow` if `target` has no identifier (or an empty one)
    pub fn register<T>(
        &mut self,
        target: &T,
        strategy: Strategy,
        handler: Arc<dyn WorkflowHandler>,
    ) -> Result<&WorkflowBinding, ChainError>
    where
        T: WorkflowTarget + ?Sized,
    {
        let identifier = target
            .workflow_identifier()
            .filter(|id| !id.is_empty())
            .ok_or(ChainError::UnboundWorkflow)?
            .to_string();

        debug!(
            identifier = identifier.as_str(),
            strategy = %strategy,
            handler = handler.name(),
            "workflow bound"
        );
        self.bindings.push(WorkflowBinding {
            identifier,
            strategy,
            handler,
        });
        Ok(&self.bindings[self.bindings.len() - 1])
    }

    /// Run `handler` for every dispatch of `target`.
    pub fn take_every<T>(&mut self, target: &T, handler: Arc<dyn WorkflowHandler>) -> Result<&WorkflowBinding, ChainError>
    where
        T: WorkflowTarget + ?Sized,
    {
        self.register(target, Strategy::Every, handler)
    }

    /// Run `handler` for the latest dispatch of `target` only.
    pub fn take_latest<T>(&mut self, target: &T, handler: Arc<dyn WorkflowHandler>) -> Result<&WorkflowBinding, ChainError>
    where
        T: WorkflowTarget + ?Sized,
    {
        self.register(target, Strategy::Latest, handler)
    }

    /// Run `handler` for the first dispatch of `target` until it completes.
    pub fn take_leading<T>(&mut self, target: &T, handler: Arc<dyn WorkflowHandler>) -> Result<&WorkflowBinding, ChainError>
    where
        T: WorkflowTarget + ?Sized,
    {
        self.register(target, Strategy::Leading, handler)
    }

    pub fn bindings(&self) -> &[WorkflowBinding] {
        &self.bindings
    }

    /// Bindings keyed on `identifier`, in registration order.
    pub fn bindings_for<'a>(&'a self, identifier: &'a str) -> impl Iterator<Item = &'a WorkflowBinding> + 'a {
        self.bindings.iter().filter(move |b| b.identifier == identifier)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Hands every binding to `scheduler`, in registration order.
    ///
    /// Returns the number of bindings handed over.
    pub fn mount(&self, scheduler: &dyn EffectScheduler) -> usize {
        for binding in &self.bindings {
            scheduler.schedule(binding.strategy, &binding.identifier, binding.handler.clone());
        }
        self.bindings.len()
    }
}
