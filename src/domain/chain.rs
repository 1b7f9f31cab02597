//! Chain builders.
//!
//! Each builder state is a capability object: the marker type parameter
//! decides which operations are offered next. A plain chain appends one
//! descriptor; a fetch chain always appends four (request, success, clear,
//! failure, in that order) whatever stages were skipped. Skipped stages get
//! an empty payload and a no-op transition but still pick up hooks.
//!
//! ```ignore
//! let load = registry
//!     .add_fetch("load")
//!     .with_transition(|state, _| { state["loading"] = json!(true); Ok(()) })
//!     .with_success_payload(|args| Ok(items_payload(args)))
//!     .with_success_transition(store_items)
//!     .use_base_failure()?;
//! ```

use serde_json::Value as JsonValue;
use std::marker::PhantomData;

use super::command::{CommandDescriptor, FailureCommand};
use super::foundation::{
    payload_fn, transition_fn, Action, ChainError, CommandError, Payload, PayloadFn, State,
    TransitionFn,
};
use super::interceptor::{TAG_ALL, TAG_FETCH, TAG_NORMAL};
use super::naming::Stage;
use super::registry::Registry;

/// Builder state markers.
pub mod stage {
    /// Nothing declared yet.
    pub struct Start;
    /// Plain chain: payload constructor declared.
    pub struct PayloadDeclared;
    pub struct RequestDeclared;
    pub struct RequestReady;
    pub struct SuccessDeclared;
    pub struct SuccessReady;
    pub struct ClearDeclared;
    pub struct ClearReady;
    pub struct FailureDeclared;
}

mod sealed {
    pub trait Sealed {}

    impl Sealed for super::stage::Start {}
    impl Sealed for super::stage::PayloadDeclared {}
    impl Sealed for super::stage::RequestDeclared {}
    impl Sealed for super::stage::RequestReady {}
    impl Sealed for super::stage::SuccessDeclared {}
    impl Sealed for super::stage::SuccessReady {}
    impl Sealed for super::stage::ClearDeclared {}
    impl Sealed for super::stage::ClearReady {}
    impl Sealed for super::stage::FailureDeclared {}
}

macro_rules! marker {
    ($(#[$doc:meta])* $name:ident: $($stage:ident),+) => {
        $(#[$doc])*
        pub trait $name: sealed::Sealed {}
        $(impl $name for stage::$stage {})+
    };
}

marker!(
    /// Plain chain states that accept the terminal `with_transition`.
    PlainOpen: Start, PayloadDeclared
);
marker!(
    /// Fetch states that still accept the request transition.
    RequestOpen: Start, RequestDeclared
);
marker!(
    /// Fetch states before any success declaration.
    BeforeSuccess: Start, RequestDeclared, RequestReady
);
marker!(
    /// Fetch states that still accept the success transition.
    SuccessOpen: Start, RequestDeclared, RequestReady, SuccessDeclared
);
marker!(
    /// Fetch states before any clear declaration.
    BeforeClear: Start, RequestDeclared, RequestReady, SuccessDeclared, SuccessReady
);
marker!(
    /// Fetch states that still accept the clear transition.
    ClearOpen: Start, RequestDeclared, RequestReady, SuccessDeclared, SuccessReady, ClearDeclared
);
marker!(
    /// Fetch states before any failure declaration.
    BeforeFailure: Start, RequestDeclared, RequestReady, SuccessDeclared, SuccessReady,
        ClearDeclared, ClearReady
);
marker!(
    /// Fetch states that accept a terminal failure operation.
    FailureOpen: Start, RequestDeclared, RequestReady, SuccessDeclared, SuccessReady,
        ClearDeclared, ClearReady, FailureDeclared
);

fn collect_tags(implicit: &[&str], area: &[String], call_site: &[String]) -> Vec<String> {
    implicit
        .iter()
        .map(|tag| tag.to_string())
        .chain(area.iter().cloned())
        .chain(call_site.iter().cloned())
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────
// Plain chain
// ─────────────────────────────────────────────────────────────────────────

/// Builder for a single plain command.
pub struct PlainChain<'r, S> {
    registry: &'r mut Registry,
    name: String,
    tags: Vec<String>,
    payload: Option<PayloadFn>,
    _stage: PhantomData<S>,
}

impl<'r> PlainChain<'r, stage::Start> {
    pub(crate) fn new(registry: &'r mut Registry, name: String) -> Self {
        Self {
            registry,
            name,
            tags: Vec::new(),
            payload: None,
            _stage: PhantomData,
        }
    }

    /// Adds call-site tags after the implicit and Area tags.
    pub fn tagged<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Declares the payload constructor.
    pub fn with_payload<F>(self, payload: F) -> PlainChain<'r, stage::PayloadDeclared>
    where
        F: Fn(&JsonValue) -> Result<Payload, CommandError> + Send + Sync + 'static,
    {
        PlainChain {
            registry: self.registry,
            name: self.name,
            tags: self.tags,
            payload: Some(payload_fn(payload)),
            _stage: PhantomData,
        }
    }
}

impl<'r, S: PlainOpen> PlainChain<'r, S> {
    /// Declares the transition and appends the descriptor.
    pub fn with_transition<F>(self, transition: F) -> CommandDescriptor
    where
        F: Fn(&mut State, &Action) -> Result<(), CommandError> + Send + Sync + 'static,
    {
        let prefix = self.registry.prefix();
        let identifier = self
            .registry
            .base()
            .naming()
            .plain_identifier(prefix.as_deref(), &self.name);
        let tags = collect_tags(&[TAG_ALL, TAG_NORMAL], self.registry.area().tags(), &self.tags);
        let descriptor = self.registry.factory().build(
            identifier,
            self.name,
            tags,
            self.payload,
            Some(transition_fn(transition)),
        );
        self.registry.append(descriptor.clone());
        descriptor
    }
}

// ─────────────────────────────────────────────────────────────────────────
// Fetch chain
// ─────────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct StageDraft {
    payload: Option<PayloadFn>,
    transition: Option<TransitionFn>,
}

/// The four descriptors produced by one fetch chain.
#[derive(Debug, Clone)]
pub struct FetchBundle {
    pub request: CommandDescriptor,
    pub success: CommandDescriptor,
    pub clear: CommandDescriptor,
    pub failure: CommandDescriptor,
    pub name: String,
}

impl FetchBundle {
    /// Returns the descriptor of one stage.
    pub fn stage(&self, stage: Stage) -> &CommandDescriptor {
        match stage {
            Stage::Request => &self.request,
            Stage::Success => &self.success,
            Stage::Clear => &self.clear,
            Stage::Failure => &self.failure,
        }
    }

    /// All four descriptors, in finalization order.
    pub fn stages(&self) -> [&CommandDescriptor; 4] {
        [&self.request, &self.success, &self.clear, &self.failure]
    }
}

/// Builder for a four-stage fetch chain.
pub struct FetchChain<'r, S> {
    registry: &'r mut Registry,
    name: String,
    tags: Vec<String>,
    request: StageDraft,
    success: StageDraft,
    clear: StageDraft,
    failure: StageDraft,
    _stage: PhantomData<S>,
}

impl<'r, S> FetchChain<'r, S> {
    fn advance<T>(self) -> FetchChain<'r, T> {
        FetchChain {
            registry: self.registry,
            name: self.name,
            tags: self.tags,
            request: self.request,
            success: self.success,
            clear: self.clear,
            failure: self.failure,
            _stage: PhantomData,
        }
    }

    fn draft(&mut self, stage: Stage) -> &mut StageDraft {
        match stage {
            Stage::Request => &mut self.request,
            Stage::Success => &mut self.success,
            Stage::Clear => &mut self.clear,
            Stage::Failure => &mut self.failure,
        }
    }

    fn declare_payload<T>(mut self, stage: Stage, payload: PayloadFn) -> FetchChain<'r, T> {
        self.draft(stage).payload = Some(payload);
        self.advance()
    }

    fn declare_transition<T>(mut self, stage: Stage, transition: TransitionFn) -> FetchChain<'r, T> {
        self.draft(stage).transition = Some(transition);
        self.advance()
    }

    fn finalize(mut self) -> FetchBundle {
        let prefix = self.registry.prefix();
        let [request, success, clear, failure] = Stage::ALL.map(|stage| {
            let draft = std::mem::take(self.draft(stage));
            let identifier = self
                .registry
                .base()
                .naming()
                .stage_identifier(prefix.as_deref(), &self.name, stage);
            let tags = collect_tags(
                &[TAG_ALL, TAG_FETCH, stage.tag()],
                self.registry.area().tags(),
                &self.tags,
            );
            self.registry
                .factory()
                .build(identifier, self.name.clone(), tags, draft.payload, draft.transition)
        });

        for descriptor in [&request, &success, &clear, &failure] {
            self.registry.append(descriptor.clone());
        }

        FetchBundle {
            request,
            success,
            clear,
            failure,
            name: self.name,
        }
    }
}

impl<'r> FetchChain<'r, stage::Start> {
    pub(crate) fn new(registry: &'r mut Registry, name: String) -> Self {
        Self {
            registry,
            name,
            tags: Vec::new(),
            request: StageDraft::default(),
            success: StageDraft::default(),
            clear: StageDraft::default(),
            failure: StageDraft::default(),
            _stage: PhantomData,
        }
    }

    /// Adds call-site tags to all four stages.
    pub fn tagged<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Declares the request payload constructor.
    pub fn with_payload<F>(self, payload: F) -> FetchChain<'r, stage::RequestDeclared>
    where
        F: Fn(&JsonValue) -> Result<Payload, CommandError> + Send + Sync + 'static,
    {
        self.declare_payload(Stage::Request, payload_fn(payload))
    }
}

impl<'r, S: RequestOpen> FetchChain<'r, S> {
    /// Declares the request transition.
    pub fn with_transition<F>(self, transition: F) -> FetchChain<'r, stage::RequestReady>
    where
        F: Fn(&mut State, &Action) -> Result<(), CommandError> + Send + Sync + 'static,
    {
        self.declare_transition(Stage::Request, transition_fn(transition))
    }
}

impl<'r, S: BeforeSuccess> FetchChain<'r, S> {
    pub fn with_success_payload<F>(self, payload: F) -> FetchChain<'r, stage::SuccessDeclared>
    where
        F: Fn(&JsonValue) -> Result<Payload, CommandError> + Send + Sync + 'static,
    {
        self.declare_payload(Stage::Success, payload_fn(payload))
    }
}

impl<'r, S: SuccessOpen> FetchChain<'r, S> {
    pub fn with_success_transition<F>(self, transition: F) -> FetchChain<'r, stage::SuccessReady>
    where
        F: Fn(&mut State, &Action) -> Result<(), CommandError> + Send + Sync + 'static,
    {
        self.declare_transition(Stage::Success, transition_fn(transition))
    }
}

impl<'r, S: BeforeClear> FetchChain<'r, S> {
    pub fn with_clear_payload<F>(self, payload: F) -> FetchChain<'r, stage::ClearDeclared>
    where
        F: Fn(&JsonValue) -> Result<Payload, CommandError> + Send + Sync + 'static,
    {
        self.declare_payload(Stage::Clear, payload_fn(payload))
    }
}

impl<'r, S: ClearOpen> FetchChain<'r, S> {
    pub fn with_clear_transition<F>(self, transition: F) -> FetchChain<'r, stage::ClearReady>
    where
        F: Fn(&mut State, &Action) -> Result<(), CommandError> + Send + Sync + 'static,
    {
        self.declare_transition(Stage::Clear, transition_fn(transition))
    }
}

impl<'r, S: BeforeFailure> FetchChain<'r, S> {
    pub fn with_failure_payload<F>(self, payload: F) -> FetchChain<'r, stage::FailureDeclared>
    where
        F: Fn(&JsonValue) -> Result<Payload, CommandError> + Send + Sync + 'static,
    {
        self.declare_payload(Stage::Failure, payload_fn(payload))
    }

    /// Finalizes with the Base's shared failure command.
    ///
    /// # Errors
    ///
    /// - `MissingBaseFailure` if the Base has none; nothing is appended
    pub fn use_base_failure(self) -> Result<FetchBundle, ChainError> {
        let failure = self.registry.base().failure().cloned();
        match failure {
            Some(failure) => Ok(self.with_failure_command(failure)),
            None => Err(ChainError::MissingBaseFailure { name: self.name }),
        }
    }

    /// Finalizes with the Area's shared failure command.
    ///
    /// # Errors
    ///
    /// - `MissingAreaFailure` if the Area has none; nothing is appended
    pub fn use_area_failure(self) -> Result<FetchBundle, ChainError> {
        let failure = self.registry.area().failure().cloned();
        match failure {
            Some(failure) => Ok(self.with_failure_command(failure)),
            None => Err(ChainError::MissingAreaFailure { name: self.name }),
        }
    }

    fn with_failure_command(mut self, failure: FailureCommand) -> FetchBundle {
        self.failure = StageDraft {
            payload: Some(failure.payload),
            transition: Some(failure.transition),
        };
        self.finalize()
    }
}

impl<'r, S: FailureOpen> FetchChain<'r, S> {
    /// Declares the failure transition and appends all four descriptors.
    pub fn with_failure_transition<F>(self, transition: F) -> FetchBundle
    where
        F: Fn(&mut State, &Action) -> Result<(), CommandError> + Send + Sync + 'static,
    {
        self.declare_transition::<stage::FailureDeclared>(Stage::Failure, transition_fn(transition))
            .finalize()
    }

    /// Appends all four descriptors, defaulting whatever was not declared.
    pub fn finish(self) -> FetchBundle {
        self.finalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::area::{AreaConfig, Base};
    use crate::domain::naming::NamingConvention;
    use serde_json::json;
    use std::sync::Arc;

    fn base() -> Arc<Base> {
        Base::builder()
            .naming(NamingConvention::default().with_prefix("@@App").with_slash(true))
            .build()
    }

    fn log(label: &'static str) -> impl Fn(&mut State, &Action) -> Result<(), CommandError> {
        move |state: &mut State, _: &Action| {
            if let Some(entries) = state["log"].as_array_mut() {
                entries.push(json!(label));
            }
            Ok(())
        }
    }

    fn ids(registry: &Registry) -> Vec<String> {
        registry.identifiers().into_iter().map(str::to_string).collect()
    }

    #[test]
    fn plain_chain_appends_one_descriptor_with_tags() {
        let mut registry = Registry::new(base(), AreaConfig::default().with_tags(["Local"]));
        let reset = registry
            .add_command("reset")
            .tagged(["Audit"])
            .with_transition(log("reset"));

        assert_eq!(ids(&registry), vec!["@@App/reset"]);
        assert_eq!(reset.tags(), &["All", "Normal", "Local", "Audit"]);
    }

    #[test]
    fn plain_chain_with_payload() {
        let mut registry = Registry::new(base(), AreaConfig::default());
        let select = registry
            .add_command("select")
            .with_payload(|args| {
                let mut payload = Payload::new();
                payload.insert("id".to_string(), args.clone());
                Ok(payload)
            })
            .with_transition(|state, action| {
                state["selected"] = action.get("id").cloned().unwrap_or_default();
                Ok(())
            });

        let next = registry.dispatch(None, &select.invoke(&json!("a")).unwrap()).unwrap();
        assert_eq!(next["selected"], json!("a"));
    }

    #[test]
    fn fetch_chain_finish_appends_four_in_order() {
        let mut registry = Registry::new(base(), AreaConfig::default());
        let bundle = registry.add_fetch("load").finish();

        assert_eq!(
            ids(&registry),
            vec![
                "@@App/load/Request",
                "@@App/load/Success",
                "@@App/load/Clear",
                "@@App/load/Failure",
            ]
        );
        assert_eq!(bundle.name, "load");
        assert_eq!(bundle.request.tags(), &["All", "Fetch", "Request"]);
        assert_eq!(bundle.failure.tags(), &["All", "Fetch", "Failure"]);
    }

    #[test]
    fn fetch_chain_full_declaration_keeps_stage_logic() {
        let mut registry = Registry::new(base(), AreaConfig::new(json!({"log": []})));
        let bundle = registry
            .add_fetch("load")
            .with_payload(|_| Ok(Payload::new()))
            .with_transition(log("request"))
            .with_success_payload(|_| Ok(Payload::new()))
            .with_success_transition(log("success"))
            .with_clear_payload(|_| Ok(Payload::new()))
            .with_clear_transition(log("clear"))
            .with_failure_payload(|_| Ok(Payload::new()))
            .with_failure_transition(log("failure"));

        let actions: Vec<Action> = bundle.stages().iter().map(|d| d.action().unwrap()).collect();
        let next = registry.replay(None, &actions).unwrap();
        assert_eq!(next["log"], json!(["request", "success", "clear", "failure"]));
    }

    #[test]
    fn fetch_chain_jump_to_clear_defaults_skipped_stages() {
        let mut registry = Registry::new(base(), AreaConfig::new(json!({"log": []})));
        let bundle = registry
            .add_fetch("load")
            .with_clear_transition(log("clear"))
            .finish();

        assert_eq!(registry.len(), 4);
        let after_success = registry.dispatch(None, &bundle.success.action().unwrap()).unwrap();
        assert_eq!(after_success["log"], json!([]));
        let after_clear = registry.dispatch(None, &bundle.clear.action().unwrap()).unwrap();
        assert_eq!(after_clear["log"], json!(["clear"]));
    }

    #[test]
    fn use_base_failure_without_config_fails_and_appends_nothing() {
        let mut registry = Registry::new(base(), AreaConfig::default());
        let result = registry.add_fetch("load").use_base_failure();

        assert_eq!(
            result.unwrap_err(),
            ChainError::MissingBaseFailure {
                name: "load".to_string()
            }
        );
        assert!(registry.is_empty());
    }

    #[test]
    fn use_area_failure_without_config_fails() {
        let mut registry = Registry::new(base(), AreaConfig::default());
        let result = registry
            .add_fetch("load")
            .with_transition(log("request"))
            .use_area_failure();

        assert!(matches!(result, Err(ChainError::MissingAreaFailure { .. })));
        assert!(registry.is_empty());
    }

    #[test]
    fn use_area_failure_installs_area_transition() {
        let area = AreaConfig::new(json!({"log": []}))
            .with_failure(FailureCommand::with_transition(log("area-failure")));
        let mut registry = Registry::new(base(), area);
        let bundle = registry.add_fetch("load").use_area_failure().unwrap();

        let next = registry.dispatch(None, &bundle.failure.action().unwrap()).unwrap();
        assert_eq!(next["log"], json!(["area-failure"]));
    }

    #[test]
    fn area_prefix_scopes_identifiers() {
        let mut registry = Registry::new(base(), AreaConfig::default().with_prefix("todos"));
        let bundle = registry.add_fetch("load").tagged(["Remote"]).finish();

        assert_eq!(bundle.request.identifier(), "@@App/todos/load/Request");
        assert_eq!(bundle.clear.tags(), &["All", "Fetch", "Clear", "Remote"]);
    }

    #[test]
    fn use_base_failure_composes_failure_hooks() {
        let base = Base::builder()
            .naming(NamingConvention::default().with_prefix("@@App").with_slash(true))
            .failure(FailureCommand::with_transition(log("base-failure")))
            .hook("Failure", log("A"))
            .build();
        let area = AreaConfig::new(json!({"log": []})).with_hook("Failure", log("B"));
        let mut registry = Registry::new(base, area);
        let bundle = registry.add_fetch("load").use_base_failure().unwrap();

        let next = registry.dispatch(None, &bundle.stage(Stage::Failure).action().unwrap()).unwrap();
        assert_eq!(next["log"], json!(["base-failure", "A", "B"]));
    }

    #[test]
    fn use_area_failure_composes_failure_hooks() {
        let base = Base::builder()
            .naming(NamingConvention::default().with_prefix("@@App").with_slash(true))
            .hook("Failure", log("A"))
            .build();
        let area = AreaConfig::new(json!({"log": []}))
            .with_failure(FailureCommand::with_transition(log("area-failure")))
            .with_hook("Failure", log("B"));
        let mut registry = Registry::new(base, area);
        let bundle = registry.add_fetch("load").use_area_failure().unwrap();

        let next = registry.dispatch(None, &bundle.failure.action().unwrap()).unwrap();
        assert_eq!(next["log"], json!(["area-failure", "A", "B"]));
    }

    #[test]
    fn stage_lookup_matches_fields() {
        let mut registry = Registry::new(base(), AreaConfig::default());
        let bundle = registry.add_fetch("load").finish();

        for (stage, descriptor) in Stage::ALL.into_iter().zip(bundle.stages()) {
            assert_eq!(bundle.stage(stage).identifier(), descriptor.identifier());
        }
    }
}
