//! SQLite implementation of IPolicyAdapter
//!
//! Stores one rule per row in the `policy_rules` table, with the policy
//! type in `ptype` and the values spread across `v0`..`v5`. Columns past a
//! rule's arity stay NULL, and removal matches them with null-safe `IS`
//! comparisons so a three-value rule only ever matches three-value rows.
//!
//! Load order follows insertion order through the autoincrement id, which
//! keeps the engine's in-memory store in the same order rules were saved.

use sqlx::{Row, SqlitePool};
use tracing::debug;

use warden_core::domain::policy::PolicyRule;
use warden_core::ports::policy_adapter::IPolicyAdapter;

use crate::StoreError;

const VALUE_COLUMNS: usize = 6;

/// SQLite-based implementation of the policy adapter port
///
/// All operations go through a connection pool, so one adapter can serve
/// several enforcer instances concurrently.
pub struct SqliteAdapter {
    pool: SqlitePool,
}

impl SqliteAdapter {
    /// Creates a new adapter with the given connection pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Spreads a rule's values across the six storage columns
fn column_values(rule: &PolicyRule) -> Result<Vec<Option<&str>>, StoreError> {
    if rule.len() > VALUE_COLUMNS {
        return Err(StoreError::RuleTooWide(rule.len()));
    }
    Ok((0..VALUE_COLUMNS).map(|index| rule.get(index)).collect())
}

#[async_trait::async_trait]
impl IPolicyAdapter for SqliteAdapter {
    async fn load_policy(&self) -> anyhow::Result<Vec<(String, PolicyRule)>> {
        let rows = sqlx::query(
            "SELECT ptype, v0, v1, v2, v3, v4, v5 FROM policy_rules ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from)?;

        let mut rules = Vec::with_capacity(rows.len());
        for row in rows {
            let ptype: String = row.get("ptype");
            let values: Vec<String> = ["v0", "v1", "v2", "v3", "v4", "v5"]
                .iter()
                .map(|column| row.get::<Option<String>, _>(*column))
                .take_while(Option::is_some)
                .flatten()
                .collect();
            rules.push((ptype, PolicyRule::from(values)));
        }
        Ok(rules)
    }

    async fn save_policy(&self, rules: &[(String, PolicyRule)]) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await.map_err(StoreError::from)?;

        sqlx::query("DELETE FROM policy_rules")
            .execute(&mut *tx)
            .await
            .map_err(StoreError::from)?;

        for (ptype, rule) in rules {
            let values = column_values(rule)?;
            let mut query = sqlx::query(
                "INSERT INTO policy_rules (ptype, v0, v1, v2, v3, v4, v5) \
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(ptype);
            for value in values {
                query = query.bind(value);
            }
            query.execute(&mut *tx).await.map_err(StoreError::from)?;
        }

        tx.commit().await.map_err(StoreError::from)?;
        debug!(rules = rules.len(), "Replaced policy rule set");
        Ok(())
    }

    async fn add_rule(&self, ptype: &str, rule: &PolicyRule) -> anyhow::Result<()> {
        let values = column_values(rule)?;
        let mut query = sqlx::query(
            "INSERT INTO policy_rules (ptype, v0, v1, v2, v3, v4, v5) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(ptype);
        for value in values {
            query = query.bind(value);
        }
        query.execute(&self.pool).await.map_err(StoreError::from)?;
        Ok(())
    }

    async fn remove_rule(&self, ptype: &str, rule: &PolicyRule) -> anyhow::Result<()> {
        let values = column_values(rule)?;
        let mut query = sqlx::query(
            "DELETE FROM policy_rules WHERE ptype = ? \
             AND v0 IS ? AND v1 IS ? AND v2 IS ? AND v3 IS ? AND v4 IS ? AND v5 IS ?",
        )
        .bind(ptype);
        for value in values {
            query = query.bind(value);
        }
        query.execute(&self.pool).await.map_err(StoreError::from)?;
        Ok(())
    }
}
