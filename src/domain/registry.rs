//! Registry, root dispatcher and slice combiner.
//!
//! A `Registry` is the live instance of one Area: it owns the merged
//! initial state and the insertion-ordered descriptor list. Dispatch is a
//! total function `state x action -> state`; unknown identifiers leave the
//! state unchanged.

use std::sync::Arc;
use tracing::{debug, trace, warn};

use super::area::{AreaConfig, Base};
use super::chain::{stage, FetchChain, PlainChain};
use super::command::{CommandDescriptor, CommandFactory};
use super::foundation::{Action, DispatchError, Payload, State};

/// Descriptor list and initial state of one Area.
pub struct Registry {
    base: Arc<Base>,
    area: AreaConfig,
    initial_state: State,
    descriptors: Vec<CommandDescriptor>,
}

impl Registry {
    /// Creates an empty registry for `area` under `base`.
    pub fn new(base: Arc<Base>, area: AreaConfig) -> Self {
        let initial_state = area.initial_state(&base);
        Self {
            base,
            area,
            initial_state,
            descriptors: Vec::new(),
        }
    }

    pub fn base(&self) -> &Base {
        &self.base
    }

    pub fn area(&self) -> &AreaConfig {
        &self.area
    }

    /// Base fragment deep-merged with the Area fragment.
    pub fn initial_state(&self) -> &State {
        &self.initial_state
    }

    /// Starts a plain command chain.
    pub fn add_command(&mut self, name: impl Into<String>) -> PlainChain<'_, stage::Start> {
        PlainChain::new(self, name.into())
    }

    /// Starts a four-stage fetch chain.
    pub fn add_fetch(&mut self, name: impl Into<String>) -> FetchChain<'_, stage::Start> {
        FetchChain::new(self, name.into())
    }

    /// Descriptors in registration order.
    pub fn descriptors(&self) -> &[CommandDescriptor] {
        &self.descriptors
    }

    /// Identifiers in registration order.
    pub fn identifiers(&self) -> Vec<&str> {
        self.descriptors.iter().map(CommandDescriptor::identifier).collect()
    }

    /// First descriptor registered under `identifier`.
    pub fn find(&self, identifier: &str) -> Option<&CommandDescriptor> {
        self.descriptors
            .iter()
            .find(|descriptor| descriptor.identifier() == identifier)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Root dispatcher.
    ///
    /// `None` stands for an absent state and selects the initial state.
    /// The state passed in is never modified, also when an error is returned.
    pub fn dispatch(&self, state: Option<&State>, action: &Action) -> Result<State, DispatchError> {
        let current = state.unwrap_or(&self.initial_state);
        let Some(identifier) = action.action_type() else {
            trace!("dispatch without identifier, state unchanged");
            return Ok(current.clone());
        };

        match self.find(identifier) {
            Some(descriptor) => {
                trace!(identifier, "dispatch matched");
                descriptor
                    .reduce(current, action)
                    .map_err(|source| DispatchError::new(identifier, source))
            }
            None => {
                trace!(identifier, "dispatch unmatched, state unchanged");
                Ok(current.clone())
            }
        }
    }

    /// Folds `actions` through [`dispatch`](Self::dispatch), stopping at the first error.
    pub fn replay<'a, I>(&self, state: Option<&State>, actions: I) -> Result<State, DispatchError>
    where
        I: IntoIterator<Item = &'a Action>,
    {
        let mut current = state.unwrap_or(&self.initial_state).clone();
        for action in actions {
            current = self.dispatch(Some(&current), action)?;
        }
        Ok(current)
    }

    /// Effective name prefix: Base prefix joined with the Area segment.
    pub(crate) fn prefix(&self) -> Option<String> {
        self.base.naming().scoped_prefix(self.area.prefix())
    }

    pub(crate) fn factory(&self) -> CommandFactory<'_> {
        CommandFactory::new(
            self.base.hooks(),
            self.area.hooks(),
            self.base.enrich().cloned(),
        )
    }

    pub(crate) fn append(&mut self, descriptor: CommandDescriptor) {
        if self.find(descriptor.identifier()).is_some() {
            warn!(
                identifier = descriptor.identifier(),
                "identifier already registered; the first registration keeps handling dispatch"
            );
        }
        debug!(
            identifier = descriptor.identifier(),
            tags = descriptor.tags().len(),
            hooks = descriptor.hooks().len(),
            "registered command"
        );
        self.descriptors.push(descriptor);
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("initial_state", &self.initial_state)
            .field("identifiers", &self.identifiers())
            .finish()
    }
}

/// Combines several Area registries under slice keys.
///
/// The combined state is a JSON object with one entry per mounted slice.
#[derive(Debug, Default)]
pub struct RootReducer {
    slices: Vec<(String, Registry)>,
}

impl RootReducer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mounts `registry` under `key`. A later mount under the same key replaces the earlier one.
    pub fn mount(mut self, key: impl Into<String>, registry: Registry) -> Self {
        let key = key.into();
        debug!(slice = key.as_str(), commands = registry.len(), "mounted slice");
        match self.slices.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = registry,
            None => self.slices.push((key, registry)),
        }
        self
    }

    /// Slice keys in mount order.
    pub fn keys(&self) -> Vec<&str> {
        self.slices.iter().map(|(key, _)| key.as_str()).collect()
    }

    pub fn slice(&self, key: &str) -> Option<&Registry> {
        self.slices
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, registry)| registry)
    }

    /// Object holding each slice's initial state under its key.
    pub fn initial_state(&self) -> State {
        let mut root = Payload::new();
        for (key, registry) in &self.slices {
            root.insert(key.clone(), registry.initial_state().clone());
        }
        State::Object(root)
    }

    /// Routes `action` to every slice.
    ///
    /// Only slices with a matching descriptor are replaced. A matching slice
    /// missing from `state` starts from its initial state; a non-object
    /// `state` is treated as empty.
    pub fn dispatch(&self, state: Option<&State>, action: &Action) -> Result<State, DispatchError> {
        let Some(current) = state else {
            return self.dispatch(Some(&self.initial_state()), action);
        };
        let Some(identifier) = action.action_type() else {
            return Ok(current.clone());
        };

        let mut next = match current {
            State::Object(map) => map.clone(),
            _ => Payload::new(),
        };
        for (key, registry) in &self.slices {
            if registry.find(identifier).is_none() {
                continue;
            }
            let slice = registry.dispatch(next.get(key), action)?;
            next.insert(key.clone(), slice);
        }
        Ok(State::Object(next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::CommandError;
    use crate::domain::naming::NamingConvention;
    use serde_json::json;

    fn registry() -> Registry {
        let base = Base::builder()
            .naming(NamingConvention::default().with_prefix("@@App").with_slash(true))
            .state(json!({"loading": false}))
            .build();
        Registry::new(base, AreaConfig::new(json!({"count": 0})))
    }

    #[test]
    fn initial_state_merges_base_and_area() {
        assert_eq!(registry().initial_state(), &json!({"loading": false, "count": 0}));
    }

    #[test]
    fn dispatch_unknown_identifier_returns_equal_state() {
        let registry = registry();
        let state = json!({"count": 3});
        let next = registry.dispatch(Some(&state), &Action::new("@@Unknown")).unwrap();
        assert_eq!(next, state);
    }

    #[test]
    fn dispatch_without_state_uses_initial_state() {
        let registry = registry();
        let next = registry.dispatch(None, &Action::new("@@Unknown")).unwrap();
        assert_eq!(&next, registry.initial_state());
    }

    #[test]
    fn dispatch_action_without_type_is_identity() {
        let registry = registry();
        let state = json!({"count": 1});
        let next = registry
            .dispatch(Some(&state), &Action::from_raw(Payload::new()))
            .unwrap();
        assert_eq!(next, state);
    }

    #[test]
    fn dispatch_runs_matching_transition() {
        let mut registry = registry();
        let increment = registry.add_command("increment").with_transition(|state, _| {
            let count = state["count"].as_i64().unwrap_or(0);
            state["count"] = json!(count + 1);
            Ok(())
        });

        let next = registry
            .dispatch(None, &increment.action().unwrap())
            .unwrap();
        assert_eq!(next["count"], json!(1));
        assert_eq!(registry.initial_state()["count"], json!(0));
    }

    #[test]
    fn dispatch_error_names_identifier_and_keeps_state() {
        let mut registry = registry();
        let fail = registry
            .add_command("explode")
            .with_transition(|state, _| {
                state["count"] = json!(100);
                Err(CommandError::rejected("explode"))
            });

        let state = json!({"count": 1});
        let err = registry
            .dispatch(Some(&state), &fail.action().unwrap())
            .unwrap_err();

        assert_eq!(err.identifier, "@@App/explode");
        assert_eq!(err.source, CommandError::rejected("explode"));
        assert_eq!(state, json!({"count": 1}));
    }

    #[test]
    fn duplicate_identifier_first_registration_wins() {
        let mut registry = registry();
        let first = registry.add_command("set").with_transition(|state, _| {
            state["who"] = json!("first");
            Ok(())
        });
        registry.add_command("set").with_transition(|state, _| {
            state["who"] = json!("second");
            Ok(())
        });

        assert_eq!(registry.len(), 2);
        let next = registry.dispatch(None, &first.action().unwrap()).unwrap();
        assert_eq!(next["who"], json!("first"));
    }

    #[test]
    fn replay_folds_actions_in_order() {
        let mut registry = registry();
        let add = registry
            .add_command("add")
            .with_payload(|args| {
                let mut payload = Payload::new();
                payload.insert("n".to_string(), args.clone());
                Ok(payload)
            })
            .with_transition(|state, action| {
                let n = action.get("n").and_then(|v| v.as_i64()).unwrap_or(0);
                let count = state["count"].as_i64().unwrap_or(0);
                state["count"] = json!(count + n);
                Ok(())
            });

        let actions = vec![
            add.invoke(&json!(2)).unwrap(),
            Action::new("@@Unknown"),
            add.invoke(&json!(5)).unwrap(),
        ];
        let next = registry.replay(None, &actions).unwrap();
        assert_eq!(next["count"], json!(7));
    }

    #[test]
    fn find_and_identifiers_follow_registration_order() {
        let mut registry = registry();
        registry.add_command("a").with_transition(|_, _| Ok(()));
        registry.add_command("b").with_transition(|_, _| Ok(()));

        assert_eq!(registry.identifiers(), vec!["@@App/a", "@@App/b"]);
        assert!(registry.find("@@App/b").is_some());
        assert!(registry.find("@@App/c").is_none());
        assert!(!registry.is_empty());
    }

    #[test]
    fn root_initial_state_is_keyed_by_slice() {
        let root = RootReducer::new()
            .mount("counter", registry())
            .mount("todos", Registry::new(Base::builder().build(), AreaConfig::new(json!({"items": []}))));

        assert_eq!(root.keys(), vec!["counter", "todos"]);
        assert_eq!(
            root.initial_state(),
            json!({"counter": {"loading": false, "count": 0}, "todos": {"items": []}})
        );
    }

    #[test]
    fn root_dispatch_replaces_matching_slice_only() {
        let mut counter = registry();
        let increment = counter.add_command("increment").with_transition(|state, _| {
            let count = state["count"].as_i64().unwrap_or(0);
            state["count"] = json!(count + 1);
            Ok(())
        });
        let todos = Registry::new(Base::builder().build(), AreaConfig::new(json!({"items": []})));
        let root = RootReducer::new().mount("counter", counter).mount("todos", todos);

        let state = root.initial_state();
        let next = root.dispatch(Some(&state), &increment.action().unwrap()).unwrap();

        assert_eq!(next["counter"]["count"], json!(1));
        assert_eq!(next["todos"], state["todos"]);
        assert_eq!(state["counter"]["count"], json!(0));
    }

    #[test]
    fn root_dispatch_unknown_action_is_identity() {
        let root = RootReducer::new().mount("counter", registry());
        let state = json!({"counter": {"count": 9}});
        let next = root.dispatch(Some(&state), &Action::new("@@Unknown")).unwrap();
        assert_eq!(next, state);
    }

    #[test]
    fn root_dispatch_without_state_starts_from_initial() {
        let root = RootReducer::new().mount("counter", registry());
        let next = root.dispatch(None, &Action::new("@@Unknown")).unwrap();
        assert_eq!(next, root.initial_state());
    }

    #[test]
    fn root_mount_same_key_replaces_slice() {
        let root = RootReducer::new()
            .mount("a", registry())
            .mount("a", Registry::new(Base::builder().build(), AreaConfig::default()));
        assert_eq!(root.keys(), vec!["a"]);
        assert_eq!(root.initial_state(), json!({"a": {}}));
    }
}
