//! Role manager port (driven/secondary port)
//!
//! This module defines the interface for the role inheritance graph behind
//! each grouping definition (`g`, `g2`, ...). The matcher evaluator calls
//! into it whenever a matcher invokes a grouping function, so the
//! reachability query is on the hot path of every enforcement request.
//!
//! ## Design Notes
//!
//! - All methods take `&self`; implementations use interior mutability so
//!   a shared `Arc<dyn IRoleManager>` can serve concurrent enforcement
//!   requests while links are being added.
//! - `domain` scopes a link or query to a tenant. `None` and `Some("")`
//!   address the same unscoped graph.
//! - `has_link` must bound its traversal; inheritance chains deeper than
//!   the implementation's configured maximum are treated as unreachable
//!   rather than looping.

/// Port trait for role inheritance queries
///
/// The engine keeps one role manager per grouping definition and rebuilds
/// the link set from grouping policy rows whenever the policy store is
/// reloaded.
///
/// ## Implementation Notes
///
/// - `add_link` is idempotent; repeating an existing link changes nothing.
/// - `delete_link` reports an error when the link does not exist, so the
///   management API can surface the miss.
/// - `get_roles` returns only direct roles, not the transitive closure.
pub trait IRoleManager: Send + Sync {
    /// Removes every link from the graph
    fn clear(&self);

    /// Adds an inheritance link: `name1` inherits from `name2`
    fn add_link(&self, name1: &str, name2: &str, domain: Option<&str>);

    /// Removes the inheritance link between `name1` and `name2`
    fn delete_link(&self, name1: &str, name2: &str, domain: Option<&str>) -> anyhow::Result<()>;

    /// Reports whether `name2` is reachable from `name1` through
    /// inheritance links, within the traversal bound
    fn has_link(&self, name1: &str, name2: &str, domain: Option<&str>) -> bool;

    /// Returns the roles `name` inherits from directly
    fn get_roles(&self, name: &str, domain: Option<&str>) -> Vec<String>;

    /// Returns the users that directly inherit from `name`
    fn get_users(&self, name: &str, domain: Option<&str>) -> Vec<String>;

    /// Returns every name that appears as a direct role of some user
    fn all_roles(&self) -> Vec<String>;
}
