//! CSV file policy adapter
//!
//! Reads and writes the comma-separated policy format shared across PERM
//! engines: one rule per line, policy type first, values after.
//!
//! ```text
//! p, alice, data1, read
//! p, bob, data2, write
//! g, alice, admin
//! ```
//!
//! Blank lines and `#` comments are ignored on load and not preserved on
//! save. Values are split on commas and trimmed, so values themselves must
//! not contain commas.

use std::path::{Path, PathBuf};

use tracing::debug;

use warden_core::domain::policy::PolicyRule;
use warden_core::ports::policy_adapter::IPolicyAdapter;

use crate::StoreError;

/// Policy adapter backed by a CSV file
///
/// `load_policy` on a missing file yields an empty rule set, so a fresh
/// deployment works before any rule was ever saved. Mutations rewrite the
/// whole file; the format has no stable row identity to patch in place.
#[derive(Debug, Clone)]
pub struct FileAdapter {
    path: PathBuf,
}

impl FileAdapter {
    /// Creates an adapter reading and writing `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The file this adapter reads and writes
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_rules(&self) -> Result<Vec<(String, PolicyRule)>, StoreError> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(StoreError::Io(format!(
                    "reading {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };
        parse_csv(&text)
    }

    async fn write_rules(&self, rules: &[(String, PolicyRule)]) -> Result<(), StoreError> {
        let mut text = String::new();
        for (ptype, rule) in rules {
            text.push_str(ptype);
            for value in rule.values() {
                text.push_str(", ");
                text.push_str(value);
            }
            text.push('\n');
        }
        tokio::fs::write(&self.path, text).await.map_err(|e| {
            StoreError::Io(format!("writing {}: {}", self.path.display(), e))
        })?;
        debug!(path = %self.path.display(), rules = rules.len(), "Wrote policy file");
        Ok(())
    }
}

fn parse_csv(text: &str) -> Result<Vec<(String, PolicyRule)>, StoreError> {
    let mut rules = Vec::new();
    for (index, raw_line) in text.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut fields = line.split(',').map(str::trim);
        let ptype = match fields.next() {
            Some(ptype) if !ptype.is_empty() => ptype.to_string(),
            _ => {
                return Err(StoreError::MalformedLine {
                    line: index + 1,
                    text: line.to_string(),
                })
            }
        };
        let values: Vec<&str> = fields.collect();
        if values.is_empty() {
            return Err(StoreError::MalformedLine {
                line: index + 1,
                text: line.to_string(),
            });
        }
        rules.push((ptype, PolicyRule::new(values)));
    }
    Ok(rules)
}

#[async_trait::async_trait]
impl IPolicyAdapter for FileAdapter {
    async fn load_policy(&self) -> anyhow::Result<Vec<(String, PolicyRule)>> {
        Ok(self.read_rules().await?)
    }

    async fn save_policy(&self, rules: &[(String, PolicyRule)]) -> anyhow::Result<()> {
        self.write_rules(rules).await?;
        Ok(())
    }

    async fn add_rule(&self, ptype: &str, rule: &PolicyRule) -> anyhow::Result<()> {
        let mut rules = self.read_rules().await?;
        let entry = (ptype.to_string(), rule.clone());
        if !rules.contains(&entry) {
            rules.push(entry);
            self.write_rules(&rules).await?;
        }
        Ok(())
    }

    async fn remove_rule(&self, ptype: &str, rule: &PolicyRule) -> anyhow::Result<()> {
        let mut rules = self.read_rules().await?;
        let before = rules.len();
        rules.retain(|(stored_type, stored_rule)| {
            !(stored_type == ptype && stored_rule == rule)
        });
        if rules.len() != before {
            self.write_rules(&rules).await?;
        }
        Ok(())
    }
}
