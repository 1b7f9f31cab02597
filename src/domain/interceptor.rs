//! Tag-keyed interceptor hooks.
//!
//! Hooks are registered under tags at configuration time and resolved once
//! per descriptor. Hooks run in tag-declaration order, and within a tag in
//! registration order. A hook listed under two matching tags runs twice.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::foundation::{Action, CommandError, Hook, State};

/// Implicit tag carried by every descriptor.
pub const TAG_ALL: &str = "All";

/// Implicit tag carried by plain command descriptors.
pub const TAG_NORMAL: &str = "Normal";

/// Implicit tag carried by every fetch stage descriptor.
pub const TAG_FETCH: &str = "Fetch";

/// Mapping from tag to its ordered hook list.
#[derive(Clone, Default)]
pub struct HookMap {
    hooks: HashMap<String, Vec<Hook>>,
}

impl HookMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `hook` to the list registered under `tag`.
    pub fn register<F>(&mut self, tag: impl Into<String>, hook: F)
    where
        F: Fn(&mut State, &Action) -> Result<(), CommandError> + Send + Sync + 'static,
    {
        self.register_shared(tag, Arc::new(hook));
    }

    /// Appends an already shared hook under `tag`.
    pub fn register_shared(&mut self, tag: impl Into<String>, hook: Hook) {
        self.hooks.entry(tag.into()).or_default().push(hook);
    }

    /// Returns the hooks registered under `tag`, in registration order.
    pub fn hooks_for(&self, tag: &str) -> &[Hook] {
        self.hooks.get(tag).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns true when no hook is registered.
    pub fn is_empty(&self) -> bool {
        self.hooks.values().all(Vec::is_empty)
    }

    /// Collects the hooks matching `tags`, tag by tag.
    pub fn collect<S: AsRef<str>>(&self, tags: &[S]) -> Vec<Hook> {
        tags.iter()
            .flat_map(|tag| self.hooks_for(tag.as_ref()).iter().cloned())
            .collect()
    }
}

impl fmt::Debug for HookMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut counts: Vec<(&String, usize)> =
            self.hooks.iter().map(|(tag, list)| (tag, list.len())).collect();
        counts.sort();
        f.debug_struct("HookMap").field("hooks", &counts).finish()
    }
}

/// Hooks resolved for one descriptor, split by scope.
#[derive(Clone, Default)]
pub struct ResolvedHooks {
    pub base: Vec<Hook>,
    pub area: Vec<Hook>,
}

impl ResolvedHooks {
    /// Runs base-scope hooks, then area-scope hooks, on the same working copy.
    pub fn run(&self, state: &mut State, action: &Action) -> Result<(), CommandError> {
        for hook in self.base.iter().chain(self.area.iter()) {
            hook(state, action)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.base.len() + self.area.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for ResolvedHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedHooks")
            .field("base", &self.base.len())
            .field("area", &self.area.len())
            .finish()
    }
}

/// Resolves `tags` against both scopes.
pub fn resolve<S: AsRef<str>>(base: &HookMap, area: &HookMap, tags: &[S]) -> ResolvedHooks {
    ResolvedHooks {
        base: base.collect(tags),
        area: area.collect(tags),
    }
}
