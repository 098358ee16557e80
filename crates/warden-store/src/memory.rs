//! In-memory policy adapter
//!
//! Holds the rule set in process memory. Nothing survives the process,
//! which is exactly what tests and ephemeral enforcers want. Also the
//! backend the engine falls back to when no storage was configured.
//!
//! ## Design Notes
//!
//! - Uses `tokio::sync::Mutex` because `IPolicyAdapter` methods take
//!   `&self` while mutating the rule set, and the lock is held across
//!   nothing but the Vec operation itself.

use tokio::sync::Mutex;

use warden_core::domain::policy::PolicyRule;
use warden_core::ports::policy_adapter::IPolicyAdapter;

/// Policy adapter that stores rules in memory
///
/// Can be pre-seeded with [`MemoryAdapter::with_rules`] so tests start
/// from a known rule set without touching the filesystem.
#[derive(Debug, Default)]
pub struct MemoryAdapter {
    rules: Mutex<Vec<(String, PolicyRule)>>,
}

impl MemoryAdapter {
    /// Creates an empty in-memory adapter
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an adapter pre-seeded with the given rules
    pub fn with_rules(rules: Vec<(String, PolicyRule)>) -> Self {
        Self {
            rules: Mutex::new(rules),
        }
    }
}

#[async_trait::async_trait]
impl IPolicyAdapter for MemoryAdapter {
    async fn load_policy(&self) -> anyhow::Result<Vec<(String, PolicyRule)>> {
        Ok(self.rules.lock().await.clone())
    }

    async fn save_policy(&self, rules: &[(String, PolicyRule)]) -> anyhow::Result<()> {
        *self.rules.lock().await = rules.to_vec();
        Ok(())
    }

    async fn add_rule(&self, ptype: &str, rule: &PolicyRule) -> anyhow::Result<()> {
        let mut rules = self.rules.lock().await;
        let entry = (ptype.to_string(), rule.clone());
        if !rules.contains(&entry) {
            rules.push(entry);
        }
        Ok(())
    }

    async fn remove_rule(&self, ptype: &str, rule: &PolicyRule) -> anyhow::Result<()> {
        let mut rules = self.rules.lock().await;
        rules.retain(|(stored_type, stored_rule)| {
            !(stored_type == ptype && stored_rule == rule)
        });
        Ok(())
    }
}
