//! Policy management API
//!
//! Read and mutate policy (`p`) and grouping (`g`) rows on a live
//! enforcer. Mutations validate row arity, write through the adapter
//! when `auto_save` is on, keep role links current when
//! `auto_build_role_links` is on, and notify the watcher. The `named`
//! variants address secondary definitions (`p2`, `g2`, ...).

use tracing::warn;

use warden_core::domain::PolicyRule;
use warden_core::errors::EnforcerError;

use crate::enforcer::{Enforcer, DEFAULT_POLICY, DEFAULT_ROLE};

impl Enforcer {
    // ========================================================================
    // Queries
    // ========================================================================

    /// Returns the `p` policy rows
    pub fn get_policy(&self) -> Vec<PolicyRule> {
        self.get_named_policy(DEFAULT_POLICY)
    }

    /// Returns the rows of an arbitrary policy type
    pub fn get_named_policy(&self, ptype: &str) -> Vec<PolicyRule> {
        self.store.rules(ptype).to_vec()
    }

    /// Reports whether an identical `p` row exists
    pub fn has_policy(&self, rule: &PolicyRule) -> bool {
        self.has_named_policy(DEFAULT_POLICY, rule)
    }

    /// Reports whether an identical row exists under `ptype`
    pub fn has_named_policy(&self, ptype: &str, rule: &PolicyRule) -> bool {
        self.store.contains(ptype, rule)
    }

    /// Returns the `g` grouping rows
    pub fn get_grouping_policy(&self) -> Vec<PolicyRule> {
        self.get_named_policy(DEFAULT_ROLE)
    }

    /// Returns the rows of an arbitrary grouping type
    pub fn get_named_grouping_policy(&self, ptype: &str) -> Vec<PolicyRule> {
        self.get_named_policy(ptype)
    }

    /// Reports whether an identical `g` row exists
    pub fn has_grouping_policy(&self, rule: &PolicyRule) -> bool {
        self.has_named_policy(DEFAULT_ROLE, rule)
    }

    /// Reports whether an identical row exists under a grouping type
    pub fn has_named_grouping_policy(&self, ptype: &str, rule: &PolicyRule) -> bool {
        self.has_named_policy(ptype, rule)
    }

    /// Distinct subjects across the `p` rows, in first-seen order
    pub fn get_all_subjects(&self) -> Vec<String> {
        self.store.values_for_field(DEFAULT_POLICY, 0)
    }

    /// Distinct objects across the `p` rows, in first-seen order
    pub fn get_all_objects(&self) -> Vec<String> {
        self.store.values_for_field(DEFAULT_POLICY, 1)
    }

    /// Distinct actions across the `p` rows, in first-seen order
    pub fn get_all_actions(&self) -> Vec<String> {
        self.store.values_for_field(DEFAULT_POLICY, 2)
    }

    /// Distinct roles granted through the `g` rows, in first-seen order
    pub fn get_all_roles(&self) -> Vec<String> {
        self.store.values_for_field(DEFAULT_ROLE, 1)
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Adds a `p` policy row
    ///
    /// Returns false when an identical row already exists.
    ///
    /// # Errors
    /// Returns a configuration error for a row of the wrong arity, or an
    /// adapter failure when `auto_save` is on and the write fails; the
    /// in-memory store is unchanged in both cases.
    pub async fn add_policy(&mut self, rule: PolicyRule) -> Result<bool, EnforcerError> {
        self.add_named_policy(DEFAULT_POLICY, rule).await
    }

    /// Adds a row under an arbitrary policy type
    pub async fn add_named_policy(
        &mut self,
        ptype: &str,
        rule: PolicyRule,
    ) -> Result<bool, EnforcerError> {
        self.add_rule_internal(ptype, rule).await
    }

    /// Removes a `p` policy row
    ///
    /// Returns false when no identical row exists.
    pub async fn remove_policy(&mut self, rule: &PolicyRule) -> Result<bool, EnforcerError> {
        self.remove_named_policy(DEFAULT_POLICY, rule).await
    }

    /// Removes a row under an arbitrary policy type
    pub async fn remove_named_policy(
        &mut self,
        ptype: &str,
        rule: &PolicyRule,
    ) -> Result<bool, EnforcerError> {
        self.remove_rule_internal(ptype, rule).await
    }

    /// Adds a `g` grouping row, linking a user to a role
    pub async fn add_grouping_policy(&mut self, rule: PolicyRule) -> Result<bool, EnforcerError> {
        self.add_named_grouping_policy(DEFAULT_ROLE, rule).await
    }

    /// Adds a row under an arbitrary grouping type
    pub async fn add_named_grouping_policy(
        &mut self,
        ptype: &str,
        rule: PolicyRule,
    ) -> Result<bool, EnforcerError> {
        self.add_rule_internal(ptype, rule).await
    }

    /// Removes a `g` grouping row
    pub async fn remove_grouping_policy(
        &mut self,
        rule: &PolicyRule,
    ) -> Result<bool, EnforcerError> {
        self.remove_named_grouping_policy(DEFAULT_ROLE, rule).await
    }

    /// Removes a row under an arbitrary grouping type
    pub async fn remove_named_grouping_policy(
        &mut self,
        ptype: &str,
        rule: &PolicyRule,
    ) -> Result<bool, EnforcerError> {
        self.remove_rule_internal(ptype, rule).await
    }

    // ========================================================================
    // Shared mutation path
    // ========================================================================

    /// Adds one row: validate, persist, link, store, notify
    ///
    /// The adapter write happens before the store mutation so a failed
    /// write leaves memory and storage consistent.
    async fn add_rule_internal(
        &mut self,
        ptype: &str,
        rule: PolicyRule,
    ) -> Result<bool, EnforcerError> {
        self.validate_rule(ptype, &rule)?;
        if self.store.contains(ptype, &rule) {
            return Ok(false);
        }
        if self.auto_save {
            self.adapter
                .add_rule(ptype, &rule)
                .await
                .map_err(EnforcerError::Adapter)?;
        }
        if self.auto_build_role_links {
            if let Some(manager) = self.role_managers.get(ptype) {
                if let (Some(user), Some(role)) = (rule.get(0), rule.get(1)) {
                    manager.add_link(user, role, rule.get(2));
                }
            }
        }
        self.store.add(ptype, rule);
        self.notify_watcher().await;
        Ok(true)
    }

    /// Removes one row: persist, unlink, store, notify
    async fn remove_rule_internal(
        &mut self,
        ptype: &str,
        rule: &PolicyRule,
    ) -> Result<bool, EnforcerError> {
        if !self.store.contains(ptype, rule) {
            return Ok(false);
        }
        if self.auto_save {
            self.adapter
                .remove_rule(ptype, rule)
                .await
                .map_err(EnforcerError::Adapter)?;
        }
        if self.auto_build_role_links {
            if let Some(manager) = self.role_managers.get(ptype) {
                if let (Some(user), Some(role)) = (rule.get(0), rule.get(1)) {
                    if let Err(e) = manager.delete_link(user, role, rule.get(2)) {
                        warn!(error = %e, "Role link already absent while removing grouping row");
                    }
                }
            }
        }
        self.store.remove(ptype, rule);
        self.notify_watcher().await;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use warden_core::errors::ConfigurationError;
    use warden_core::ports::policy_adapter::IPolicyAdapter;
    use warden_store::MemoryAdapter;

    use crate::builder::EnforcerBuilder;

    use super::*;

    const RBAC_MODEL: &str = r#"
[request_definition]
r = sub, obj, act

[policy_definition]
p = sub, obj, act

[role_definition]
g = _, _

[policy_effect]
e = some(where (p.eft == allow))

[matchers]
m = g(r.sub, p.sub) && r.obj == p.obj && r.act == p.act
"#;

    fn rule(values: &[&str]) -> PolicyRule {
        PolicyRule::new(values.iter().copied())
    }

    async fn build_with(adapter: Arc<MemoryAdapter>) -> Enforcer {
        EnforcerBuilder::new()
            .model_text(RBAC_MODEL)
            .adapter(adapter)
            .build()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_add_and_remove_policy_round_trip() {
        let mut enforcer = build_with(Arc::new(MemoryAdapter::new())).await;
        let row = rule(&["alice", "data1", "read"]);

        assert!(enforcer.add_policy(row.clone()).await.unwrap());
        assert!(enforcer.has_policy(&row));
        assert_eq!(enforcer.get_policy(), vec![row.clone()]);

        assert!(enforcer.remove_policy(&row).await.unwrap());
        assert!(!enforcer.has_policy(&row));
        assert!(enforcer.get_policy().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_add_and_missing_remove_return_false() {
        let mut enforcer = build_with(Arc::new(MemoryAdapter::new())).await;
        let row = rule(&["alice", "data1", "read"]);

        assert!(enforcer.add_policy(row.clone()).await.unwrap());
        assert!(!enforcer.add_policy(row.clone()).await.unwrap());

        let absent = rule(&["bob", "data2", "write"]);
        assert!(!enforcer.remove_policy(&absent).await.unwrap());
    }

    #[tokio::test]
    async fn test_add_policy_validates_arity() {
        let mut enforcer = build_with(Arc::new(MemoryAdapter::new())).await;

        let err = enforcer
            .add_policy(rule(&["alice", "data1"]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EnforcerError::Configuration(ConfigurationError::RuleArity { .. })
        ));
        assert!(enforcer.get_policy().is_empty());

        let err = enforcer
            .add_named_policy("p9", rule(&["alice", "data1", "read"]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EnforcerError::Configuration(ConfigurationError::UnknownPolicyType { .. })
        ));
    }

    #[tokio::test]
    async fn test_auto_save_writes_through_the_adapter() {
        let adapter = Arc::new(MemoryAdapter::new());
        let mut enforcer = build_with(Arc::clone(&adapter)).await;

        enforcer
            .add_policy(rule(&["alice", "data1", "read"]))
            .await
            .unwrap();

        let persisted = adapter.load_policy().await.unwrap();
        assert_eq!(
            persisted,
            vec![("p".to_string(), rule(&["alice", "data1", "read"]))]
        );

        enforcer
            .remove_policy(&rule(&["alice", "data1", "read"]))
            .await
            .unwrap();
        assert!(adapter.load_policy().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_auto_save_off_keeps_the_adapter_untouched() {
        let adapter: Arc<dyn IPolicyAdapter> = Arc::new(MemoryAdapter::new());
        let mut enforcer = EnforcerBuilder::new()
            .model_text(RBAC_MODEL)
            .adapter(Arc::clone(&adapter))
            .auto_save(false)
            .build()
            .await
            .unwrap();

        enforcer
            .add_policy(rule(&["alice", "data1", "read"]))
            .await
            .unwrap();
        assert!(adapter.load_policy().await.unwrap().is_empty());

        enforcer.save_policy().await.unwrap();
        assert_eq!(adapter.load_policy().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_grouping_mutations_update_role_links() {
        let mut enforcer = build_with(Arc::new(MemoryAdapter::new())).await;
        enforcer
            .add_policy(rule(&["admin", "data1", "read"]))
            .await
            .unwrap();

        assert!(!enforcer.enforce(&["alice", "data1", "read"]).unwrap());

        enforcer
            .add_grouping_policy(rule(&["alice", "admin"]))
            .await
            .unwrap();
        assert!(enforcer.enforce(&["alice", "data1", "read"]).unwrap());

        enforcer
            .remove_grouping_policy(&rule(&["alice", "admin"]))
            .await
            .unwrap();
        assert!(!enforcer.enforce(&["alice", "data1", "read"]).unwrap());
    }

    #[tokio::test]
    async fn test_field_extraction_helpers() {
        let mut enforcer = build_with(Arc::new(MemoryAdapter::new())).await;
        enforcer
            .add_policy(rule(&["alice", "data1", "read"]))
            .await
            .unwrap();
        enforcer
            .add_policy(rule(&["bob", "data2", "write"]))
            .await
            .unwrap();
        enforcer
            .add_policy(rule(&["alice", "data2", "read"]))
            .await
            .unwrap();
        enforcer
            .add_grouping_policy(rule(&["alice", "admin"]))
            .await
            .unwrap();

        assert_eq!(enforcer.get_all_subjects(), vec!["alice", "bob"]);
        assert_eq!(enforcer.get_all_objects(), vec!["data1", "data2"]);
        assert_eq!(enforcer.get_all_actions(), vec!["read", "write"]);
        assert_eq!(enforcer.get_all_roles(), vec!["admin"]);
    }

    #[tokio::test]
    async fn test_named_variants_address_the_same_rows() {
        let mut enforcer = build_with(Arc::new(MemoryAdapter::new())).await;
        let row = rule(&["alice", "admin"]);

        enforcer
            .add_named_grouping_policy("g", row.clone())
            .await
            .unwrap();
        assert!(enforcer.has_grouping_policy(&row));
        assert_eq!(enforcer.get_named_grouping_policy("g"), vec![row.clone()]);

        enforcer
            .remove_named_grouping_policy("g", &row)
            .await
            .unwrap();
        assert!(enforcer.get_grouping_policy().is_empty());
    }
}
