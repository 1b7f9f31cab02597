//! Base and Area configuration.
//!
//! A `Base` is shared by every Area created from one root: naming, shared
//! hooks, shared failure command, shared enrichment and a state fragment.
//! An `AreaConfig` describes one state slice. Both are immutable once built.

use serde_json::{json, Value as JsonValue};
use std::fmt;
use std::sync::Arc;

use super::command::{CommandMeta, EnrichFn, FailureCommand};
use super::foundation::{deep_merge, Action, CommandError, Payload, State};
use super::interceptor::HookMap;
use super::naming::NamingConvention;

/// Shared configuration across all Areas of one root.
pub struct Base {
    naming: NamingConvention,
    state: JsonValue,
    enrich: Option<EnrichFn>,
    failure: Option<FailureCommand>,
    hooks: HookMap,
}

impl Base {
    /// Starts building a Base with default naming and no hooks.
    pub fn builder() -> BaseBuilder {
        BaseBuilder::default()
    }

    pub fn naming(&self) -> &NamingConvention {
        &self.naming
    }

    /// Returns the Base state fragment.
    pub fn state(&self) -> &JsonValue {
        &self.state
    }

    pub fn enrich(&self) -> Option<&EnrichFn> {
        self.enrich.as_ref()
    }

    pub fn failure(&self) -> Option<&FailureCommand> {
        self.failure.as_ref()
    }

    pub fn hooks(&self) -> &HookMap {
        &self.hooks
    }
}

impl fmt::Debug for Base {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Base")
            .field("naming", &self.naming)
            .field("state", &self.state)
            .field("enrich", &self.enrich.is_some())
            .field("failure", &self.failure.is_some())
            .field("hooks", &self.hooks)
            .finish()
    }
}

/// Builder for [`Base`].
pub struct BaseBuilder {
    naming: NamingConvention,
    state: JsonValue,
    enrich: Option<EnrichFn>,
    failure: Option<FailureCommand>,
    hooks: HookMap,
}

impl Default for BaseBuilder {
    fn default() -> Self {
        Self {
            naming: NamingConvention::default(),
            state: json!({}),
            enrich: None,
            failure: None,
            hooks: HookMap::new(),
        }
    }
}

impl BaseBuilder {
    pub fn naming(mut self, naming: NamingConvention) -> Self {
        self.naming = naming;
        self
    }

    /// Sets the state fragment merged under every Area's fragment.
    pub fn state(mut self, state: JsonValue) -> Self {
        self.state = state;
        self
    }

    /// Sets the enrichment applied to every produced action.
    pub fn enrich<F>(mut self, enrich: F) -> Self
    where
        F: Fn(&CommandMeta) -> Payload + Send + Sync + 'static,
    {
        self.enrich = Some(Arc::new(enrich));
        self
    }

    /// Sets the failure command reachable through `use_base_failure`.
    pub fn failure(mut self, failure: FailureCommand) -> Self {
        self.failure = Some(failure);
        self
    }

    /// Registers a shared hook under `tag`.
    pub fn hook<F>(mut self, tag: impl Into<String>, hook: F) -> Self
    where
        F: Fn(&mut State, &Action) -> Result<(), CommandError> + Send + Sync + 'static,
    {
        self.hooks.register(tag, hook);
        self
    }

    /// Replaces the whole shared hook map.
    pub fn hooks(mut self, hooks: HookMap) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn build(self) -> Arc<Base> {
        Arc::new(Base {
            naming: self.naming,
            state: self.state,
            enrich: self.enrich,
            failure: self.failure,
            hooks: self.hooks,
        })
    }
}

/// Configuration of one state slice.
pub struct AreaConfig {
    state: JsonValue,
    prefix: Option<String>,
    tags: Vec<String>,
    failure: Option<FailureCommand>,
    hooks: HookMap,
}

impl AreaConfig {
    /// Creates an Area with its local state fragment.
    pub fn new(state: JsonValue) -> Self {
        Self {
            state,
            prefix: None,
            tags: Vec::new(),
            failure: None,
            hooks: HookMap::new(),
        }
    }

    /// Builder: set the local name prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Builder: set tags applied to every command declared in this Area.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Builder: set the failure command reachable through `use_area_failure`.
    pub fn with_failure(mut self, failure: FailureCommand) -> Self {
        self.failure = Some(failure);
        self
    }

    /// Builder: register an area-scope hook under `tag`.
    pub fn with_hook<F>(mut self, tag: impl Into<String>, hook: F) -> Self
    where
        F: Fn(&mut State, &Action) -> Result<(), CommandError> + Send + Sync + 'static,
    {
        self.hooks.register(tag, hook);
        self
    }

    /// Builder: replace the whole area-scope hook map.
    pub fn with_hooks(mut self, hooks: HookMap) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn state(&self) -> &JsonValue {
        &self.state
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn failure(&self) -> Option<&FailureCommand> {
        self.failure.as_ref()
    }

    pub fn hooks(&self) -> &HookMap {
        &self.hooks
    }

    /// Base fragment first, Area fragment deep-merged over it.
    pub fn initial_state(&self, base: &Base) -> State {
        deep_merge(base.state(), &self.state)
    }
}

impl Default for AreaConfig {
    fn default() -> Self {
        Self::new(json!({}))
    }
}

impl fmt::Debug for AreaConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AreaConfig")
            .field("state", &self.state)
            .field("prefix", &self.prefix)
            .field("tags", &self.tags)
            .field("failure", &self.failure.is_some())
            .field("hooks", &self.hooks)
            .finish()
    }
}
