//! Role management API
//!
//! Convenience operations over the default `g` grouping definition:
//! granting and revoking roles, querying the inheritance graph, and
//! listing a user's permissions. Grants delegate to the grouping
//! mutations in the management API, so persistence, role links, and
//! watcher notification follow the same path.

use warden_core::domain::PolicyRule;
use warden_core::errors::EnforcerError;

use crate::enforcer::{Enforcer, DEFAULT_POLICY, DEFAULT_ROLE};

impl Enforcer {
    /// Grants `role` to `user`, optionally scoped to a domain
    ///
    /// Returns false when the grant already exists.
    ///
    /// # Errors
    /// Returns an adapter failure when `auto_save` is on and the write
    /// fails.
    pub async fn add_role_for_user(
        &mut self,
        user: &str,
        role: &str,
        domain: Option<&str>,
    ) -> Result<bool, EnforcerError> {
        self.add_named_grouping_policy(DEFAULT_ROLE, grouping_rule(user, role, domain))
            .await
    }

    /// Revokes `role` from `user`, optionally scoped to a domain
    ///
    /// Returns false when no such grant exists.
    pub async fn delete_role_for_user(
        &mut self,
        user: &str,
        role: &str,
        domain: Option<&str>,
    ) -> Result<bool, EnforcerError> {
        self.remove_named_grouping_policy(DEFAULT_ROLE, &grouping_rule(user, role, domain))
            .await
    }

    /// Returns the roles `user` holds directly
    ///
    /// Inherited roles are not expanded. The result goes to the attached
    /// logger's role channel when logging is enabled.
    pub fn get_roles_for_user(&self, user: &str, domain: Option<&str>) -> Vec<String> {
        let roles = match self.role_managers.get(DEFAULT_ROLE) {
            Some(manager) => manager.get_roles(user, domain),
            None => Vec::new(),
        };
        let logger = self.current_logger();
        if logger.is_enabled() {
            logger.log_role(&roles);
        }
        roles
    }

    /// Returns the users that hold `role` directly
    pub fn get_users_for_role(&self, role: &str, domain: Option<&str>) -> Vec<String> {
        let users = match self.role_managers.get(DEFAULT_ROLE) {
            Some(manager) => manager.get_users(role, domain),
            None => Vec::new(),
        };
        let logger = self.current_logger();
        if logger.is_enabled() {
            logger.log_role(&users);
        }
        users
    }

    /// Reports whether `user` holds `role` directly
    pub fn has_role_for_user(&self, user: &str, role: &str, domain: Option<&str>) -> bool {
        self.get_roles_for_user(user, domain)
            .iter()
            .any(|held| held == role)
    }

    /// Returns the `p` rows whose subject is `user`
    ///
    /// With a domain, only rows whose second field matches it are kept,
    /// which fits the conventional `sub, dom, obj, act` layout.
    pub fn get_permissions_for_user(&self, user: &str, domain: Option<&str>) -> Vec<PolicyRule> {
        self.store
            .rules(DEFAULT_POLICY)
            .iter()
            .filter(|rule| rule.get(0) == Some(user))
            .filter(|rule| domain.map_or(true, |wanted| rule.get(1) == Some(wanted)))
            .cloned()
            .collect()
    }

    /// Reports whether a `p` row grants `permission` to `user` directly
    pub fn has_permission_for_user(&self, user: &str, permission: &[&str]) -> bool {
        let mut values = Vec::with_capacity(permission.len() + 1);
        values.push(user);
        values.extend_from_slice(permission);
        self.store
            .contains(DEFAULT_POLICY, &PolicyRule::new(values))
    }
}

/// Builds the `g` row for a grant, appending the domain when present
fn grouping_rule(user: &str, role: &str, domain: Option<&str>) -> PolicyRule {
    match domain {
        Some(domain) => PolicyRule::new([user, role, domain]),
        None => PolicyRule::new([user, role]),
    }
}
