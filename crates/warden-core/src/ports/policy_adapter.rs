//! Policy storage port (driven/secondary port)
//!
//! This module defines the interface for loading and persisting policy
//! rules. Implementations may read CSV files, query a SQLite database, or
//! hold rules in memory for tests.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because storage errors are adapter-specific
//!   (I/O errors, SQL errors, serialization issues). The engine wraps them
//!   in its own error type at the boundary.
//! - Rules travel as `(ptype, rule)` pairs, where `ptype` is the policy
//!   definition key (`"p"`, `"p2"`, `"g"`, ...) and the rule holds the
//!   field values in definition order.
//! - `load_policy` returns rows in storage order. The engine preserves
//!   that order in its in-memory store.

use crate::domain::policy::PolicyRule;

/// Port trait for policy rule persistence
///
/// The enforcer reads the complete rule set through `load_policy` and
/// writes it back through `save_policy`. When auto-save is active,
/// incremental mutations go through `add_rule` and `remove_rule` instead
/// of rewriting the whole set.
///
/// ## Implementation Notes
///
/// - `save_policy` replaces the stored rule set atomically from the
///   caller's perspective; partial writes should not be observable by a
///   subsequent `load_policy`.
/// - `add_rule` with a duplicate row and `remove_rule` with a missing row
///   are not errors; adapters may treat them as no-ops.
#[async_trait::async_trait]
pub trait IPolicyAdapter: Send + Sync {
    /// Loads every stored rule as `(ptype, rule)` pairs in storage order
    async fn load_policy(&self) -> anyhow::Result<Vec<(String, PolicyRule)>>;

    /// Replaces the stored rule set with the given rows
    async fn save_policy(&self, rules: &[(String, PolicyRule)]) -> anyhow::Result<()>;

    /// Persists a single added rule
    async fn add_rule(&self, ptype: &str, rule: &PolicyRule) -> anyhow::Result<()>;

    /// Removes a single rule from storage
    async fn remove_rule(&self, ptype: &str, rule: &PolicyRule) -> anyhow::Result<()>;
}
