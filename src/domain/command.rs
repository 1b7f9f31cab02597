//! Command descriptors and the factory that builds them.
//!
//! A descriptor pairs an action constructor with a composed transition:
//! caller mutation first, then base-scope hooks, then area-scope hooks,
//! all on one working copy.

use serde_json::Value as JsonValue;
use std::fmt;
use std::sync::Arc;

use super::foundation::{
    empty_payload, noop_transition, produce, Action, CommandError, Payload, PayloadFn, State,
    TransitionFn,
};
use super::interceptor::{resolve, HookMap, ResolvedHooks};

/// Descriptor metadata handed to the shared enrichment function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandMeta {
    pub identifier: String,
    pub name: String,
    pub tags: Vec<String>,
}

/// Shared enrichment: extra fields merged into every produced action.
pub type EnrichFn = Arc<dyn Fn(&CommandMeta) -> Payload + Send + Sync>;

/// Payload constructor and transition usable as a fallback failure stage.
#[derive(Clone)]
pub struct FailureCommand {
    pub payload: PayloadFn,
    pub transition: TransitionFn,
}

impl FailureCommand {
    pub fn new<P, T>(payload: P, transition: T) -> Self
    where
        P: Fn(&JsonValue) -> Result<Payload, CommandError> + Send + Sync + 'static,
        T: Fn(&mut State, &Action) -> Result<(), CommandError> + Send + Sync + 'static,
    {
        Self {
            payload: Arc::new(payload),
            transition: Arc::new(transition),
        }
    }

    /// Failure command with an empty payload and the given transition.
    pub fn with_transition<T>(transition: T) -> Self
    where
        T: Fn(&mut State, &Action) -> Result<(), CommandError> + Send + Sync + 'static,
    {
        Self {
            payload: empty_payload(),
            transition: Arc::new(transition),
        }
    }
}

impl fmt::Debug for FailureCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FailureCommand").finish_non_exhaustive()
    }
}

struct DescriptorInner {
    meta: CommandMeta,
    payload: PayloadFn,
    transition: TransitionFn,
    hooks: ResolvedHooks,
    enrich: Option<EnrichFn>,
}

/// Immutable descriptor of one declared command.
///
/// Cloning is cheap and shares the same underlying descriptor.
#[derive(Clone)]
pub struct CommandDescriptor {
    inner: Arc<DescriptorInner>,
}

impl CommandDescriptor {
    /// Returns the full identifier.
    pub fn identifier(&self) -> &str {
        &self.inner.meta.identifier
    }

    /// Returns the short name the command was declared with.
    pub fn name(&self) -> &str {
        &self.inner.meta.name
    }

    /// Returns the ordered tag list.
    pub fn tags(&self) -> &[String] {
        &self.inner.meta.tags
    }

    pub fn meta(&self) -> &CommandMeta {
        &self.inner.meta
    }

    /// Returns the hooks resolved at construction time.
    pub fn hooks(&self) -> &ResolvedHooks {
        &self.inner.hooks
    }

    /// Builds an action from `args`.
    ///
    /// Runs the payload constructor, stamps the identifier, applies the
    /// shared enrichment, then stamps again so the identifier always wins.
    pub fn invoke(&self, args: &JsonValue) -> Result<Action, CommandError> {
        let payload = (self.inner.payload)(args)?;
        Ok(self.stamp(payload))
    }

    /// Builds an action with no call arguments.
    pub fn action(&self) -> Result<Action, CommandError> {
        self.invoke(&JsonValue::Null)
    }

    fn stamp(&self, payload: Payload) -> Action {
        let action = Action::from_payload(self.identifier(), payload);
        match &self.inner.enrich {
            Some(enrich) => {
                let mut fields = action.fields().clone();
                fields.extend(enrich(&self.inner.meta));
                Action::from_payload(self.identifier(), fields)
            }
            None => action,
        }
    }

    /// Runs the composed transition on a working copy.
    ///
    /// Edits already applied stay on `state` when a later phase fails;
    /// callers that need all-or-nothing go through [`reduce`](Self::reduce).
    pub fn transition(&self, state: &mut State, action: &Action) -> Result<(), CommandError> {
        (self.inner.transition)(state, action)?;
        self.inner.hooks.run(state, action)
    }

    /// Applies this command to a working copy from inside another transition.
    ///
    /// The identifier is stamped onto `payload` exactly as [`invoke`](Self::invoke) does.
    pub fn apply_directly(&self, state: &mut State, payload: Payload) -> Result<(), CommandError> {
        let action = self.stamp(payload);
        self.transition(state, &action)
    }

    /// Produces the next state without touching `state`.
    pub fn reduce(&self, state: &State, action: &Action) -> Result<State, CommandError> {
        produce(state, |draft| self.transition(draft, action))
    }
}

impl fmt::Debug for CommandDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDescriptor")
            .field("identifier", &self.inner.meta.identifier)
            .field("tags", &self.inner.meta.tags)
            .field("hooks", &self.inner.hooks)
            .finish()
    }
}

/// Builds descriptors against one pair of hook scopes.
pub struct CommandFactory<'a> {
    base_hooks: &'a HookMap,
    area_hooks: &'a HookMap,
    enrich: Option<EnrichFn>,
}

impl<'a> CommandFactory<'a> {
    pub fn new(base_hooks: &'a HookMap, area_hooks: &'a HookMap, enrich: Option<EnrichFn>) -> Self {
        Self {
            base_hooks,
            area_hooks,
            enrich,
        }
    }

    /// Builds a descriptor. Omitted pieces default to an empty payload and a no-op.
    pub fn build(
        &self,
        identifier: impl Into<String>,
        name: impl Into<String>,
        tags: Vec<String>,
        payload: Option<PayloadFn>,
        transition: Option<TransitionFn>,
    ) -> CommandDescriptor {
        let hooks = resolve(self.base_hooks, self.area_hooks, tags.as_slice());
        CommandDescriptor {
            inner: Arc::new(DescriptorInner {
                meta: CommandMeta {
                    identifier: identifier.into(),
                    name: name.into(),
                    tags,
                },
                payload: payload.unwrap_or_else(empty_payload),
                transition: transition.unwrap_or_else(noop_transition),
                hooks,
                enrich: self.enrich.clone(),
            }),
        }
    }
}
