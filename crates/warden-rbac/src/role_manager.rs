//! Default role manager backed by a concurrent adjacency map
//!
//! Stores direct inheritance links keyed by `(domain, user)` and answers
//! reachability queries with a breadth-first search bounded by a maximum
//! hierarchy depth. The bound makes accidental cycles in grouping policy
//! terminate instead of spinning: a role further away than the bound is
//! simply not reachable.
//!
//! ## Design Notes
//!
//! - `DashMap` gives lock-free reads on the enforcement hot path while
//!   links are added or removed concurrently.
//! - The unscoped graph is stored under the empty domain, so `None` and
//!   `Some("")` address the same links.
//! - Queries never allocate a key when they can borrow; the `(domain,
//!   user)` tuple is cloned only on insertion.

use std::collections::HashSet;

use dashmap::DashMap;
use thiserror::Error;
use tracing::debug;

use warden_core::ports::role_manager::IRoleManager;

/// Default depth bound for reachability searches
pub const DEFAULT_MAX_HIERARCHY: usize = 10;

/// Failures surfaced by role graph mutations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RoleError {
    /// `delete_link` was asked to remove a link that is not in the graph
    #[error("No inheritance link from `{name1}` to `{name2}`")]
    LinkNotFound { name1: String, name2: String },
}

fn scope(domain: Option<&str>) -> &str {
    domain.unwrap_or("")
}

/// The standard [`IRoleManager`] implementation
///
/// One instance backs one grouping definition. The engine rebuilds the
/// link set from grouping policy rows whenever the policy store reloads,
/// and queries it from matcher evaluation whenever the grouping function
/// is invoked.
#[derive(Debug)]
pub struct DefaultRoleManager {
    /// Direct inheritance links: `(domain, user)` to the roles it inherits
    links: DashMap<(String, String), Vec<String>>,
    /// Maximum inheritance chain length considered reachable
    max_hierarchy: usize,
}

impl DefaultRoleManager {
    /// Creates a role manager with the given reachability depth bound
    pub fn new(max_hierarchy: usize) -> Self {
        Self {
            links: DashMap::new(),
            max_hierarchy,
        }
    }

    fn direct_roles(&self, name: &str, domain: &str) -> Vec<String> {
        self.links
            .get(&(domain.to_string(), name.to_string()))
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }
}

impl Default for DefaultRoleManager {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HIERARCHY)
    }
}

impl IRoleManager for DefaultRoleManager {
    fn clear(&self) {
        debug!("Clearing role inheritance graph");
        self.links.clear();
    }

    fn add_link(&self, name1: &str, name2: &str, domain: Option<&str>) {
        let key = (scope(domain).to_string(), name1.to_string());
        let mut roles = self.links.entry(key).or_default();
        if !roles.iter().any(|role| role == name2) {
            debug!(user = name1, role = name2, domain = scope(domain), "Adding role link");
            roles.push(name2.to_string());
        }
    }

    fn delete_link(&self, name1: &str, name2: &str, domain: Option<&str>) -> anyhow::Result<()> {
        let key = (scope(domain).to_string(), name1.to_string());
        let mut removed = false;
        if let Some(mut roles) = self.links.get_mut(&key) {
            if let Some(index) = roles.iter().position(|role| role == name2) {
                roles.remove(index);
                removed = true;
            }
        }
        if removed {
            debug!(user = name1, role = name2, domain = scope(domain), "Removed role link");
            Ok(())
        } else {
            Err(RoleError::LinkNotFound {
                name1: name1.to_string(),
                name2: name2.to_string(),
            }
            .into())
        }
    }

    fn has_link(&self, name1: &str, name2: &str, domain: Option<&str>) -> bool {
        if name1 == name2 {
            return true;
        }
        let domain = scope(domain);
        let mut visited: HashSet<String> = HashSet::new();
        let mut frontier = vec![name1.to_string()];
        for _ in 0..self.max_hierarchy {
            let mut next = Vec::new();
            for name in frontier {
                for role in self.direct_roles(&name, domain) {
                    if role == name2 {
                        return true;
                    }
                    if visited.insert(role.clone()) {
                        next.push(role);
                    }
                }
            }
            if next.is_empty() {
                return false;
            }
            frontier = next;
        }
        false
    }

    fn get_roles(&self, name: &str, domain: Option<&str>) -> Vec<String> {
        self.direct_roles(name, scope(domain))
    }

    fn get_users(&self, name: &str, domain: Option<&str>) -> Vec<String> {
        let domain = scope(domain);
        let mut users: Vec<String> = self
            .links
            .iter()
            .filter(|entry| {
                entry.key().0 == domain && entry.value().iter().any(|role| role == name)
            })
            .map(|entry| entry.key().1.clone())
            .collect();
        users.sort();
        users
    }

    fn all_roles(&self) -> Vec<String> {
        let mut roles: Vec<String> = self
            .links
            .iter()
            .flat_map(|entry| entry.value().clone())
            .collect();
        roles.sort();
        roles.dedup();
        roles
    }
}
