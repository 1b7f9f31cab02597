//! In-memory effect scheduler for testing.
//!
//! Records every binding handed over by a `WorkflowBinder` and can deliver
//! actions to matching handlers synchronously, one after another.
//!
//! # Security Note
//!
//! This adapter is for **testing only**. It uses `.expect()` on lock
//! operations which will panic if locks are poisoned, and it does not
//! enforce invocation strategies: delivery always behaves like `Every`.

use std::sync::{Arc, RwLock};

use crate::domain::foundation::{Action, CommandError};
use crate::domain::workflow::Strategy;
use crate::ports::{EffectScheduler, WorkflowHandler};

/// A binding as received by the scheduler.
#[derive(Clone)]
pub struct ScheduledWorkflow {
    pub strategy: Strategy,
    pub identifier: String,
    pub handler: Arc<dyn WorkflowHandler>,
}

/// In-memory scheduler for tests.
///
/// # Panics
///
/// Methods may panic if internal locks are poisoned. This is acceptable
/// for test code but this adapter should NOT be used in production.
///
/// # Example
///
/// ```ignore
/// let scheduler = InMemoryScheduler::new();
/// binder.mount(&scheduler);
///
/// assert_eq!(scheduler.scheduled_count(), 1);
/// scheduler.deliver(bundle.request.action()?).await?;
/// ```
pub struct InMemoryScheduler {
    scheduled: RwLock<Vec<ScheduledWorkflow>>,
}

impl InMemoryScheduler {
    /// Creates a scheduler with no bindings.
    pub fn new() -> Self {
        Self {
            scheduled: RwLock::new(Vec::new()),
        }
    }

    // === Test Helpers ===

    /// Returns all received bindings (for test assertions).
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn scheduled(&self) -> Vec<ScheduledWorkflow> {
        self.scheduled
            .read()
            .expect("InMemoryScheduler: scheduled lock poisoned")
            .clone()
    }

    /// Returns count of received bindings.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn scheduled_count(&self) -> usize {
        self.scheduled
            .read()
            .expect("InMemoryScheduler: scheduled lock poisoned")
            .len()
    }

    /// Returns the strategies registered for `identifier`, in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn strategies_for(&self, identifier: &str) -> Vec<Strategy> {
        self.scheduled()
            .into_iter()
            .filter(|s| s.identifier == identifier)
            .map(|s| s.strategy)
            .collect()
    }

    /// Runs every handler bound to the action's identifier.
    ///
    /// All handlers run even when one fails; failures are reported together.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub async fn deliver(&self, action: Action) -> Result<usize, CommandError> {
        let Some(identifier) = action.action_type().map(str::to_string) else {
            return Ok(0);
        };

        // Clone handlers to release lock before await points
        let handlers: Vec<Arc<dyn WorkflowHandler>> = self
            .scheduled()
            .into_iter()
            .filter(|s| s.identifier == identifier)
            .map(|s| s.handler)
            .collect();

        let mut errors = Vec::new();
        for handler in &handlers {
            if let Err(e) = handler.run(action.clone()).await {
                errors.push(format!("{}: {}", handler.name(), e));
            }
        }

        if !errors.is_empty() {
            return Err(CommandError::rejected(format!(
                "Workflow errors: {}",
                errors.join(", ")
            )));
        }

        Ok(handlers.len())
    }

    /// Drops every binding (for test isolation).
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn clear(&self) {
        self.scheduled
            .write()
            .expect("InMemoryScheduler: scheduled write lock poisoned")
            .clear();
    }
}

impl Default for InMemoryScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl EffectScheduler for InMemoryScheduler {
    fn schedule(&self, strategy: Strategy, identifier: &str, handler: Arc<dyn WorkflowHandler>) {
        self.scheduled
            .write()
            .expect("InMemoryScheduler: scheduled write lock poisoned")
            .push(ScheduledWorkflow {
                strategy,
                identifier: identifier.to_string(),
                handler,
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::workflow::WorkflowBinder;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingHandler(Arc<AtomicUsize>);

    #[async_trait]
    impl WorkflowHandler for CountingHandler {
        async fn run(&self, _: Action) -> Result<(), CommandError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        fn name(&self) -> &'static str {
            "CountingHandler"
        }
    }

    struct FailingHandler;

    #[async_trait]
    impl WorkflowHandler for FailingHandler {
        async fn run(&self, _: Action) -> Result<(), CommandError> {
            Err(CommandError::rejected("upstream down"))
        }
        fn name(&self) -> &'static str {
            "FailingHandler"
        }
    }

    #[test]
    fn mount_hands_over_every_binding_in_order() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut binder = WorkflowBinder::new();
        binder
            .take_every(&json!({"type": "a"}), Arc::new(CountingHandler(counter.clone())))
            .unwrap();
        binder
            .take_latest(&json!({"type": "b"}), Arc::new(CountingHandler(counter.clone())))
            .unwrap();

        let scheduler = InMemoryScheduler::new();
        assert_eq!(binder.mount(&scheduler), 2);

        let identifiers: Vec<String> = scheduler.scheduled().into_iter().map(|s| s.identifier).collect();
        assert_eq!(identifiers, vec!["a", "b"]);
        assert_eq!(scheduler.strategies_for("b"), vec![Strategy::Latest]);
    }

    #[tokio::test]
    async fn deliver_runs_matching_handlers_only() {
        let counter = Arc::new(AtomicUsize::new(0));
        let scheduler = InMemoryScheduler::new();
        scheduler.schedule(Strategy::Every, "a", Arc::new(CountingHandler(counter.clone())));
        scheduler.schedule(Strategy::Leading, "a", Arc::new(CountingHandler(counter.clone())));
        scheduler.schedule(Strategy::Every, "b", Arc::new(CountingHandler(counter.clone())));

        let ran = scheduler.deliver(Action::new("a")).await.unwrap();

        assert_eq!(ran, 2);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn deliver_without_identifier_runs_nothing() {
        let scheduler = InMemoryScheduler::new();
        let ran = scheduler
            .deliver(Action::from_raw(serde_json::Map::new()))
            .await
            .unwrap();
        assert_eq!(ran, 0);
    }

    #[tokio::test]
    async fn deliver_reports_handler_errors() {
        let scheduler = InMemoryScheduler::new();
        scheduler.schedule(Strategy::Every, "a", Arc::new(FailingHandler));

        let err = scheduler.deliver(Action::new("a")).await.unwrap_err();
        assert!(err.to_string().contains("FailingHandler: Command rejected: upstream down"));
    }

    #[test]
    fn clear_drops_bindings() {
        let scheduler = InMemoryScheduler::new();
        scheduler.schedule(Strategy::Every, "a", Arc::new(FailingHandler));
        scheduler.clear();
        assert_eq!(scheduler.scheduled_count(), 0);
    }
}
