//! Diagnostic event snapshots
//!
//! These types carry the data handed to a decision logger at each extension
//! point. They are plain immutable snapshots: constructed fresh per call,
//! only when the attached logger is enabled, and never retained by the
//! engine afterwards.

use indexmap::IndexMap;
use serde::Serialize;

use super::policy::PolicyRule;

/// Snapshot of a fully parsed model, emitted after a model load
///
/// Sections, and the keys within each section, iterate in the order they
/// appeared in the model definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelEvent {
    sections: IndexMap<String, IndexMap<String, String>>,
}

impl ModelEvent {
    /// Creates a snapshot from raw model sections
    pub fn new(sections: IndexMap<String, IndexMap<String, String>>) -> Self {
        Self { sections }
    }

    /// Iterates `(section, entries)` pairs in definition order
    pub fn sections(&self) -> impl Iterator<Item = (&str, &IndexMap<String, String>)> {
        self.sections
            .iter()
            .map(|(name, entries)| (name.as_str(), entries))
    }
}

/// Snapshot of a single authorization decision, emitted per enforce call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnforceEvent {
    matcher: String,
    request: Vec<String>,
    decision: bool,
    explains: Vec<PolicyRule>,
}

impl EnforceEvent {
    /// Creates a decision snapshot
    ///
    /// # Arguments
    ///
    /// * `matcher` - The matcher text the decision was evaluated against
    /// * `request` - The request arguments in their natural string form
    /// * `decision` - The boolean outcome
    /// * `explains` - The policy rows that explain the outcome, in policy
    ///   order; empty when the decision fell back to a default
    pub fn new(
        matcher: impl Into<String>,
        request: Vec<String>,
        decision: bool,
        explains: Vec<PolicyRule>,
    ) -> Self {
        Self {
            matcher: matcher.into(),
            request,
            decision,
            explains,
        }
    }

    /// Returns the matcher text
    pub fn matcher(&self) -> &str {
        &self.matcher
    }

    /// Returns the ordered request arguments
    pub fn request(&self) -> &[String] {
        &self.request
    }

    /// Returns the decision outcome
    pub fn decision(&self) -> bool {
        self.decision
    }

    /// Returns the rows that explain the outcome
    pub fn explains(&self) -> &[PolicyRule] {
        &self.explains
    }
}

/// Snapshot of the currently loaded policy, emitted after a policy load
///
/// Sections iterate in the order their definitions appeared in the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyEvent {
    sections: IndexMap<String, Vec<PolicyRule>>,
}

impl PolicyEvent {
    /// Creates a snapshot from `(type, rows)` pairs
    pub fn new(sections: IndexMap<String, Vec<PolicyRule>>) -> Self {
        Self { sections }
    }

    /// Iterates `(type, rows)` pairs in definition order
    pub fn sections(&self) -> impl Iterator<Item = (&str, &[PolicyRule])> {
        self.sections
            .iter()
            .map(|(name, rows)| (name.as_str(), rows.as_slice()))
    }

    /// Returns true if no section holds any rows
    pub fn is_empty(&self) -> bool {
        self.sections.values().all(Vec::is_empty)
    }
}
