//! The authorization enforcer
//!
//! The [`Enforcer`] owns a parsed model, the in-memory policy store, a
//! storage adapter, and one role manager per grouping definition. Requests
//! come in as ordered string arguments and leave as a boolean decision.
//!
//! ## Decision Flow
//!
//! 1. **Gate check**: a disabled enforcement gate returns `true` at once
//! 2. **Arity check**: the request must match the `r` definition
//! 3. **Row evaluation**: the `m` matcher runs once per `p` policy row
//! 4. **Effect merge**: the `e` rule folds per-row outcomes into one bool
//! 5. **Diagnostics**: `log_enforce` fires when the attached logger is on
//!
//! ## Runtime Toggles
//!
//! `enforce`, `set_logger`, `enable_log`, and `enable_enforce` take `&self`
//! and are safe across threads sharing one `Arc<Enforcer>`. The logger
//! slot is a `RwLock` whose readers clone the handle out and release the
//! lock before any sink I/O; the two flags are `AtomicBool` with `SeqCst`
//! ordering. Mutating operations (`load_policy`, `add_policy`, ...) take
//! `&mut self`.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use tracing::{debug, info, warn};

use warden_core::domain::{
    merge_effects, Effect, EnforceEvent, Model, PolicyRule, PolicyStore,
};
use warden_core::errors::{ConfigurationError, EnforcerError, EvaluationError};
use warden_core::matcher::{eval_bool, EvalContext, FunctionMap, MatcherFn};
use warden_core::ports::decision_logger::IDecisionLogger;
use warden_core::ports::policy_adapter::IPolicyAdapter;
use warden_core::ports::role_manager::IRoleManager;
use warden_core::ports::watcher::IPolicyWatcher;
use warden_rbac::DefaultRoleManager;

use crate::builder::EnforcerBuilder;

/// Definition keys the default decision path evaluates against
pub(crate) const DEFAULT_REQUEST: &str = "r";
pub(crate) const DEFAULT_POLICY: &str = "p";
pub(crate) const DEFAULT_EFFECT: &str = "e";
pub(crate) const DEFAULT_MATCHER: &str = "m";
pub(crate) const DEFAULT_ROLE: &str = "g";

// ============================================================================
// ModelSource
// ============================================================================

/// Where the model definition comes from
///
/// Kept by the enforcer so `load_model` can re-parse the same source
/// later without the caller passing it again.
#[derive(Debug, Clone)]
pub(crate) enum ModelSource {
    /// A model file on disk
    Path(PathBuf),
    /// An inline definition, used by embedders and tests
    Text(String),
}

impl ModelSource {
    pub(crate) fn parse(&self) -> Result<Model, ConfigurationError> {
        match self {
            ModelSource::Path(path) => Model::from_file(path),
            ModelSource::Text(text) => Model::from_text(text),
        }
    }
}

// ============================================================================
// Enforcer
// ============================================================================

/// Authorization decision engine
///
/// ## Dependencies
///
/// - `adapter`: policy persistence (load, save, incremental updates)
/// - `role_managers`: one inheritance graph per grouping definition
/// - `logger`: the currently attached diagnostic sink
/// - `watcher`: optional change notifications toward sibling instances
pub struct Enforcer {
    /// The parsed model this enforcer evaluates against
    pub(crate) model: Model,
    /// In-memory policy rows, grouped by type
    pub(crate) store: PolicyStore,
    /// Policy persistence backend
    pub(crate) adapter: Arc<dyn IPolicyAdapter>,
    /// Role inheritance graphs, keyed by grouping type (`g`, `g2`, ...)
    pub(crate) role_managers: HashMap<String, Arc<dyn IRoleManager>>,
    /// Matching functions available to matcher expressions
    pub(crate) functions: FunctionMap,
    /// The attached decision logger; swappable at runtime through `&self`
    pub(crate) logger: RwLock<Arc<dyn IDecisionLogger>>,
    /// The enforcement gate; disabled means every decision is `true`
    pub(crate) enforcement_enabled: AtomicBool,
    /// Whether mutations are pushed to the adapter incrementally
    pub(crate) auto_save: bool,
    /// Whether grouping mutations update the role managers immediately
    pub(crate) auto_build_role_links: bool,
    /// Optional policy change notifier
    pub(crate) watcher: Option<Arc<dyn IPolicyWatcher>>,
    /// The model source, retained for `load_model`
    pub(crate) source: ModelSource,
}

/// Manual impl: the port trait objects (`adapter`, `role_managers`,
/// `logger`, `watcher`) and `functions` do not implement `Debug`.
impl std::fmt::Debug for Enforcer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Enforcer")
            .field("model", &self.model)
            .field("store", &self.store)
            .field("enforcement_enabled", &self.enforcement_enabled)
            .field("auto_save", &self.auto_save)
            .field("auto_build_role_links", &self.auto_build_role_links)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

impl Enforcer {
    /// Creates an enforcer from a model file and a CSV policy file
    ///
    /// Shorthand for the common two-file setup. Use [`EnforcerBuilder`]
    /// to pick a different adapter, logger, or watcher.
    ///
    /// # Errors
    /// Returns a configuration error for malformed definitions, or an
    /// adapter error when the policy source cannot be read.
    pub async fn new(
        model_path: impl Into<PathBuf>,
        policy_path: impl Into<PathBuf>,
    ) -> Result<Self, EnforcerError> {
        EnforcerBuilder::new()
            .model_path(model_path)
            .policy_file(policy_path)
            .build()
            .await
    }

    // ========================================================================
    // Decision path
    // ========================================================================

    /// Decides whether a request is allowed
    ///
    /// Arguments bind positionally to the `r` definition tokens, so a
    /// `r = sub, obj, act` model takes `["alice", "data1", "read"]`.
    ///
    /// # Errors
    /// Returns [`EvaluationError::RequestArity`] (wrapped) when the
    /// argument count is wrong, or an evaluation fault from the matcher.
    pub fn enforce<S: AsRef<str>>(&self, request: &[S]) -> Result<bool, EnforcerError> {
        Ok(self.enforce_ex(request)?.0)
    }

    /// Decides a request and returns the policy rows that explain it
    ///
    /// The explanation list is empty when the decision fell back to a
    /// default (nothing matched, or a deny-override model had no denying
    /// row) and when the enforcement gate is disabled.
    pub fn enforce_ex<S: AsRef<str>>(
        &self,
        request: &[S],
    ) -> Result<(bool, Vec<PolicyRule>), EnforcerError> {
        if !self.enforcement_enabled.load(Ordering::SeqCst) {
            debug!("Enforcement disabled, bypassing evaluation");
            return Ok((true, Vec::new()));
        }
        let request: Vec<String> = request
            .iter()
            .map(|arg| arg.as_ref().to_string())
            .collect();
        self.evaluate(request)
    }

    /// Evaluates the matcher over every policy row and merges the effects
    fn evaluate(&self, request: Vec<String>) -> Result<(bool, Vec<PolicyRule>), EnforcerError> {
        let tokens = self
            .model
            .request_tokens(DEFAULT_REQUEST)
            .ok_or_else(|| missing_key("request_definition", DEFAULT_REQUEST))?;
        if request.len() != tokens.len() {
            return Err(EvaluationError::RequestArity {
                expected: tokens.len(),
                actual: request.len(),
            }
            .into());
        }
        let policy_def = self
            .model
            .policy_definition(DEFAULT_POLICY)
            .ok_or_else(|| missing_key("policy_definition", DEFAULT_POLICY))?;
        let effect_kind = self
            .model
            .effect(DEFAULT_EFFECT)
            .ok_or_else(|| missing_key("policy_effect", DEFAULT_EFFECT))?;
        let matcher = self
            .model
            .matcher(DEFAULT_MATCHER)
            .ok_or_else(|| missing_key("matchers", DEFAULT_MATCHER))?;

        let mut ctx = EvalContext::new();
        for (token, value) in tokens.iter().zip(&request) {
            ctx.bind(format!("{DEFAULT_REQUEST}.{token}"), value.clone());
        }

        let rows = self.store.rules(DEFAULT_POLICY);
        let decision;
        let mut explains = Vec::new();

        if rows.is_empty() {
            // No rows to bind: evaluate once with empty policy attributes
            // so attribute-only matchers still decide. Nothing can explain
            // the outcome in this case.
            for token in policy_def.tokens() {
                ctx.bind(format!("{DEFAULT_POLICY}.{token}"), "");
            }
            let matched = eval_bool(matcher.expr(), &ctx, &self.functions, &self.role_managers)?;
            let effect = if matched {
                Effect::Allow
            } else {
                Effect::Indeterminate
            };
            let (allowed, _) = merge_effects(effect_kind, &[effect]);
            decision = allowed;
        } else {
            let mut effects = Vec::with_capacity(rows.len());
            for row in rows {
                let mut row_ctx = ctx.clone();
                for (token, value) in policy_def.tokens().iter().zip(row.values()) {
                    row_ctx.bind(format!("{DEFAULT_POLICY}.{token}"), value.clone());
                }
                let matched =
                    eval_bool(matcher.expr(), &row_ctx, &self.functions, &self.role_managers)?;
                effects.push(row_effect(matched, policy_def.eft_index(), row));
            }
            let (allowed, hits) = merge_effects(effect_kind, &effects);
            decision = allowed;
            explains = hits
                .into_iter()
                .filter_map(|index| rows.get(index).cloned())
                .collect();
        }

        let logger = self.current_logger();
        if logger.is_enabled() {
            logger.log_enforce(&EnforceEvent::new(
                matcher.text(),
                request,
                decision,
                explains.clone(),
            ));
        }
        Ok((decision, explains))
    }

    // ========================================================================
    // Loading and saving
    // ========================================================================

    /// Re-parses the configured model source
    ///
    /// Policy rows do not survive a model reload: the store is reset to
    /// the new model's registered types and role managers are cleared.
    /// Call [`load_policy`](Self::load_policy) afterwards.
    ///
    /// # Errors
    /// Returns a configuration error when the source no longer parses;
    /// the previous model stays in place in that case.
    pub fn load_model(&mut self) -> Result<(), EnforcerError> {
        let model = self.source.parse()?;

        let mut store = PolicyStore::new();
        for ptype in model.policy_types() {
            store.register_type(ptype);
        }
        for ptype in model.role_types() {
            store.register_type(ptype);
        }

        // Keep custom role managers installed for grouping types that
        // still exist; drop the rest.
        let mut role_managers: HashMap<String, Arc<dyn IRoleManager>> = HashMap::new();
        for ptype in model.role_types() {
            let manager = self
                .role_managers
                .remove(ptype)
                .unwrap_or_else(|| Arc::new(DefaultRoleManager::default()));
            manager.clear();
            role_managers.insert(ptype.to_string(), manager);
        }

        self.model = model;
        self.store = store;
        self.role_managers = role_managers;
        info!("Model reloaded, policy cleared pending reload");

        self.emit_model_event();
        Ok(())
    }

    /// Replaces the policy store with the adapter's current rules
    ///
    /// Every loaded row is validated against its definition's arity
    /// before anything is applied; a malformed row rejects the whole
    /// load and leaves the previous policy in place. Duplicate rows from
    /// the adapter are dropped.
    ///
    /// # Errors
    /// Returns [`ConfigurationError::RuleArity`] (wrapped) for malformed
    /// rows, [`ConfigurationError::UnknownPolicyType`] for rows of a type
    /// the model does not define, or an adapter failure.
    pub async fn load_policy(&mut self) -> Result<(), EnforcerError> {
        let loaded = self
            .adapter
            .load_policy()
            .await
            .map_err(EnforcerError::Adapter)?;

        let mut staged = PolicyStore::new();
        for ptype in self.model.policy_types() {
            staged.register_type(ptype);
        }
        for ptype in self.model.role_types() {
            staged.register_type(ptype);
        }
        for (ptype, rule) in loaded {
            self.validate_rule(&ptype, &rule)?;
            if !staged.add(&ptype, rule) {
                debug!(ptype = %ptype, "Skipping duplicate policy row from adapter");
            }
        }

        self.store = staged;
        info!(rules = self.store.len(), "Policy loaded");

        if self.auto_build_role_links {
            self.rebuild_role_links();
            self.emit_role_event();
        }
        self.emit_policy_event();
        Ok(())
    }

    /// Writes the current policy store through the adapter
    ///
    /// An attached watcher is notified afterwards on a best-effort basis;
    /// notification failures are logged and never fail the save.
    ///
    /// # Errors
    /// Returns an adapter failure when the snapshot cannot be written.
    pub async fn save_policy(&mut self) -> Result<(), EnforcerError> {
        let rules: Vec<(String, PolicyRule)> = self
            .store
            .iter()
            .flat_map(|(ptype, rows)| {
                rows.iter().map(move |rule| (ptype.to_string(), rule.clone()))
            })
            .collect();
        self.adapter
            .save_policy(&rules)
            .await
            .map_err(EnforcerError::Adapter)?;
        info!(rules = rules.len(), "Policy saved");
        self.notify_watcher().await;
        Ok(())
    }

    /// Rebuilds every role manager from the current grouping rows
    pub fn build_role_links(&self) {
        self.rebuild_role_links();
        self.emit_role_event();
    }

    // ========================================================================
    // Runtime toggles
    // ========================================================================

    /// Atomically replaces the attached logger
    ///
    /// The outgoing handle is not drained or flushed; callers that still
    /// hold it externally will see no further calls from this enforcer.
    pub fn set_logger(&self, logger: Arc<dyn IDecisionLogger>) {
        match self.logger.write() {
            Ok(mut guard) => *guard = logger,
            Err(poisoned) => *poisoned.into_inner() = logger,
        }
    }

    /// Flips the attached logger's enabled flag
    pub fn enable_log(&self, enabled: bool) {
        self.current_logger().set_enabled(enabled);
    }

    /// Reports the attached logger's enabled flag
    pub fn is_log_enabled(&self) -> bool {
        self.current_logger().is_enabled()
    }

    /// Opens or closes the enforcement gate
    ///
    /// A closed gate makes [`enforce`](Self::enforce) return `Ok(true)`
    /// without consulting policy. This is a full bypass, not a deny mode;
    /// mutation, load, and save operations are unaffected.
    pub fn enable_enforce(&self, enabled: bool) {
        self.enforcement_enabled.store(enabled, Ordering::SeqCst);
    }

    /// Reports whether the enforcement gate is open
    pub fn is_enforce_enabled(&self) -> bool {
        self.enforcement_enabled.load(Ordering::SeqCst)
    }

    // ========================================================================
    // Collaborator wiring
    // ========================================================================

    /// Registers a custom matcher function under `name`
    ///
    /// The function becomes callable from matcher expressions. Grouping
    /// types shadow function names, so `g` cannot be overridden this way.
    pub fn add_function(&mut self, name: impl Into<String>, function: MatcherFn) {
        self.functions.register(name, function);
    }

    /// Replaces the role manager behind a grouping type
    ///
    /// The new manager is rebuilt from the currently stored grouping rows.
    ///
    /// # Errors
    /// Returns [`ConfigurationError::UnknownPolicyType`] (wrapped) when
    /// the model has no such grouping definition.
    pub fn set_role_manager(
        &mut self,
        ptype: &str,
        role_manager: Arc<dyn IRoleManager>,
    ) -> Result<(), EnforcerError> {
        if self.model.role_arity(ptype).is_none() {
            return Err(ConfigurationError::UnknownPolicyType {
                key: ptype.to_string(),
            }
            .into());
        }
        self.role_managers.insert(ptype.to_string(), role_manager);
        self.rebuild_links_for(ptype);
        Ok(())
    }

    /// Replaces the storage adapter without touching loaded rows
    ///
    /// Call [`load_policy`](Self::load_policy) to read from the new
    /// backend, or [`save_policy`](Self::save_policy) to migrate the
    /// current rows into it.
    pub fn set_adapter(&mut self, adapter: Arc<dyn IPolicyAdapter>) {
        self.adapter = adapter;
    }

    /// Attaches a policy change watcher
    ///
    /// The enforcer only publishes through `notify_update`; reacting to
    /// sibling updates is the embedder's side of the wiring, via the
    /// watcher's `set_update_callback`.
    pub fn set_watcher(&mut self, watcher: Arc<dyn IPolicyWatcher>) {
        self.watcher = Some(watcher);
    }

    /// Returns the parsed model
    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Returns the role manager behind a grouping type, if any
    pub fn role_manager(&self, ptype: &str) -> Option<Arc<dyn IRoleManager>> {
        self.role_managers.get(ptype).cloned()
    }

    // ========================================================================
    // Internal plumbing
    // ========================================================================

    /// Clones the current logger handle out of the slot
    ///
    /// The lock is released before the caller does any sink I/O. A
    /// poisoned slot still holds a valid handle and is recovered.
    pub(crate) fn current_logger(&self) -> Arc<dyn IDecisionLogger> {
        match self.logger.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    pub(crate) fn emit_model_event(&self) {
        let logger = self.current_logger();
        if logger.is_enabled() {
            logger.log_model(&self.model.snapshot());
        }
    }

    pub(crate) fn emit_policy_event(&self) {
        let logger = self.current_logger();
        if logger.is_enabled() {
            logger.log_policy(&self.store.snapshot());
        }
    }

    pub(crate) fn emit_role_event(&self) {
        let logger = self.current_logger();
        if logger.is_enabled() {
            logger.log_role(&self.collect_role_names());
        }
    }

    /// Checks a row's value count against its definition
    pub(crate) fn validate_rule(
        &self,
        ptype: &str,
        rule: &PolicyRule,
    ) -> Result<(), ConfigurationError> {
        let expected =
            self.model
                .rule_arity(ptype)
                .ok_or_else(|| ConfigurationError::UnknownPolicyType {
                    key: ptype.to_string(),
                })?;
        if rule.len() != expected {
            return Err(ConfigurationError::RuleArity {
                key: ptype.to_string(),
                expected,
                actual: rule.len(),
            });
        }
        Ok(())
    }

    pub(crate) fn rebuild_role_links(&self) {
        for ptype in self.role_managers.keys() {
            self.rebuild_links_for(ptype);
        }
    }

    /// Clears one role manager and relinks it from its grouping rows
    ///
    /// Rows carry `(user, role)` or `(user, role, domain)`; the third
    /// value is the domain when the definition declares one.
    pub(crate) fn rebuild_links_for(&self, ptype: &str) {
        if let Some(manager) = self.role_managers.get(ptype) {
            manager.clear();
            for rule in self.store.rules(ptype) {
                if let (Some(user), Some(role)) = (rule.get(0), rule.get(1)) {
                    manager.add_link(user, role, rule.get(2));
                }
            }
        }
    }

    /// Tells the watcher the shared policy source changed, best-effort
    pub(crate) async fn notify_watcher(&self) {
        if let Some(watcher) = &self.watcher {
            if let Err(e) = watcher.notify_update().await {
                warn!(error = %e, "Policy watcher notification failed");
            }
        }
    }

    fn collect_role_names(&self) -> Vec<String> {
        let mut roles: Vec<String> = self
            .role_managers
            .values()
            .flat_map(|manager| manager.all_roles())
            .collect();
        roles.sort();
        roles.dedup();
        roles
    }
}

fn missing_key(section: &str, key: &str) -> EnforcerError {
    ConfigurationError::MissingKey {
        section: section.to_string(),
        key: key.to_string(),
    }
    .into()
}

/// Maps one evaluated row to its effect
///
/// Rows of a definition without an `eft` token always allow when they
/// match. With an `eft` token, an empty value or `allow` allows, `deny`
/// denies, and anything else does not participate in the decision.
fn row_effect(matched: bool, eft_index: Option<usize>, row: &PolicyRule) -> Effect {
    if !matched {
        return Effect::Indeterminate;
    }
    match eft_index.and_then(|index| row.get(index)) {
        None | Some("") | Some("allow") => Effect::Allow,
        Some("deny") => Effect::Deny,
        Some(_) => Effect::Indeterminate,
    }
}
