//! Policy rows and the in-memory policy store
//!
//! A policy is a set of ordered string rows grouped by policy type (`p`,
//! `p2`, `g`, ...). The store preserves both the insertion order of rows
//! within a type and the registration order of the types themselves, so
//! diagnostic snapshots reproduce the order sections were declared in the
//! model definition.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::events::PolicyEvent;

/// A single policy row: an ordered list of values
///
/// Rows carry no schema of their own; the policy definition in the model
/// determines how many values a row of a given type must have and what
/// each position means.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PolicyRule(Vec<String>);

impl PolicyRule {
    /// Creates a rule from any iterator of string-like values
    ///
    /// # Example
    ///
    /// ```
    /// use warden_core::domain::PolicyRule;
    ///
    /// let rule = PolicyRule::new(["alice", "data1", "read"]);
    /// assert_eq!(rule.to_string(), "alice, data1, read");
    /// ```
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        PolicyRule(values.into_iter().map(Into::into).collect())
    }

    /// Returns the ordered values of this rule
    pub fn values(&self) -> &[String] {
        &self.0
    }

    /// Returns the value at `index`, if present
    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    /// Returns the number of values in this rule
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the rule has no values
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for PolicyRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.join(", "))
    }
}

impl From<Vec<String>> for PolicyRule {
    fn from(values: Vec<String>) -> Self {
        PolicyRule(values)
    }
}

/// In-memory policy storage, grouped by policy type
///
/// Types are registered up front from the model's policy and role
/// definitions; rows added later slot into the registered order. Duplicate
/// rows within a type are rejected at insertion, so the store never holds
/// the same row twice.
#[derive(Debug, Clone, Default)]
pub struct PolicyStore {
    rules: IndexMap<String, Vec<PolicyRule>>,
}

impl PolicyStore {
    /// Creates an empty store with no registered types
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a policy type so it appears in snapshots even while empty
    ///
    /// Registration order is snapshot order. Registering an existing type
    /// is a no-op.
    pub fn register_type(&mut self, key: &str) {
        self.rules.entry(key.to_string()).or_default();
    }

    /// Adds a row under `key`, returning false if an equal row already exists
    pub fn add(&mut self, key: &str, rule: PolicyRule) -> bool {
        let rows = self.rules.entry(key.to_string()).or_default();
        if rows.contains(&rule) {
            return false;
        }
        rows.push(rule);
        true
    }

    /// Removes a row under `key`, returning false if it was not present
    pub fn remove(&mut self, key: &str, rule: &PolicyRule) -> bool {
        match self.rules.get_mut(key) {
            Some(rows) => match rows.iter().position(|r| r == rule) {
                Some(index) => {
                    rows.remove(index);
                    true
                }
                None => false,
            },
            None => false,
        }
    }

    /// Returns true if an equal row exists under `key`
    pub fn contains(&self, key: &str, rule: &PolicyRule) -> bool {
        self.rules
            .get(key)
            .map(|rows| rows.contains(rule))
            .unwrap_or(false)
    }

    /// Returns the rows stored under `key`, empty for unknown types
    pub fn rules(&self, key: &str) -> &[PolicyRule] {
        self.rules.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Iterates registered types in registration order
    pub fn types(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    /// Iterates `(type, rows)` pairs in registration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[PolicyRule])> {
        self.rules
            .iter()
            .map(|(key, rows)| (key.as_str(), rows.as_slice()))
    }

    /// Removes all rows while keeping the registered types
    pub fn clear(&mut self) {
        for rows in self.rules.values_mut() {
            rows.clear();
        }
    }

    /// Returns the total number of rows across all types
    pub fn len(&self) -> usize {
        self.rules.values().map(Vec::len).sum()
    }

    /// Returns true if no rows are stored
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Captures the stored rows grouped by type, in registration order
    pub fn snapshot(&self) -> PolicyEvent {
        PolicyEvent::new(self.rules.clone())
    }

    /// Collects the distinct values at `index` across all rows of `key`
    ///
    /// Values appear in first-seen order. Rows shorter than `index + 1`
    /// are skipped.
    pub fn values_for_field(&self, key: &str, index: usize) -> Vec<String> {
        let mut seen = Vec::new();
        for rule in self.rules(key) {
            if let Some(value) = rule.get(index) {
                if !seen.iter().any(|v| v == value) {
                    seen.push(value.to_string());
                }
            }
        }
        seen
    }
}
