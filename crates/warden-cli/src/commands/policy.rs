//! Policy command - List and edit policy rows
//!
//! Provides the `warden policy` CLI command which:
//! 1. Lists every stored row grouped by policy type
//! 2. Adds a row of any defined type, persisting through the adapter
//! 3. Removes a row, reporting when no such row exists

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Args, Subcommand};
use tracing::info;

use warden_core::domain::PolicyRule;

use crate::commands::build_enforcer;
use crate::output::{get_formatter, OutputFormat};

/// Where the model and policy rows live
#[derive(Debug, Args)]
pub struct PolicySource {
    /// Path to the model definition
    #[arg(short, long)]
    pub model: Option<PathBuf>,

    /// Path to the CSV policy file
    #[arg(short, long)]
    pub policy: Option<PathBuf>,
}

/// Policy subcommands
#[derive(Debug, Subcommand)]
pub enum PolicyCommand {
    /// List the stored policy rows
    List(ListArgs),
    /// Add a policy row
    Add(EditArgs),
    /// Remove a policy row
    Remove(EditArgs),
}

#[derive(Debug, Args)]
pub struct ListArgs {
    #[command(flatten)]
    pub source: PolicySource,
}

#[derive(Debug, Args)]
pub struct EditArgs {
    #[command(flatten)]
    pub source: PolicySource,

    /// Policy type the row belongs to, e.g. `p` or `g`
    #[arg(short = 't', long, default_value = "p")]
    pub ptype: String,

    /// Row values in definition order, e.g. `alice data1 read`
    #[arg(required = true, num_args = 1..)]
    pub values: Vec<String>,
}

impl PolicyCommand {
    /// Execute the policy command
    pub async fn execute(&self, format: OutputFormat, config: Option<&Path>) -> Result<()> {
        match self {
            PolicyCommand::List(args) => Self::execute_list(args, format, config).await,
            PolicyCommand::Add(args) => Self::execute_add(args, format, config).await,
            PolicyCommand::Remove(args) => Self::execute_remove(args, format, config).await,
        }
    }

    /// List every row the enforcer loaded, grouped by type
    async fn execute_list(
        args: &ListArgs,
        format: OutputFormat,
        config: Option<&Path>,
    ) -> Result<()> {
        let formatter = get_formatter(matches!(format, OutputFormat::Json));
        let enforcer = build_enforcer(
            args.source.model.as_deref(),
            args.source.policy.as_deref(),
            config,
        )
        .await?;

        let types: Vec<String> = enforcer
            .model()
            .policy_types()
            .chain(enforcer.model().role_types())
            .map(str::to_string)
            .collect();

        if matches!(format, OutputFormat::Json) {
            let mut sections = serde_json::Map::new();
            for ptype in &types {
                let rows = enforcer.get_named_policy(ptype);
                sections.insert(ptype.clone(), serde_json::json!(rows));
            }
            formatter.print_json(&serde_json::Value::Object(sections));
            return Ok(());
        }

        let mut total = 0;
        for ptype in &types {
            for rule in enforcer.get_named_policy(ptype) {
                formatter.info(&format!("{}, {}", ptype, rule));
                total += 1;
            }
        }
        if total == 0 {
            formatter.info("No policy rows");
        }
        Ok(())
    }

    /// Add one row; auto-save persists it through the adapter
    async fn execute_add(args: &EditArgs, format: OutputFormat, config: Option<&Path>) -> Result<()> {
        let formatter = get_formatter(matches!(format, OutputFormat::Json));
        let mut enforcer = build_enforcer(
            args.source.model.as_deref(),
            args.source.policy.as_deref(),
            config,
        )
        .await?;

        let rule = PolicyRule::new(args.values.iter().cloned());
        let added = enforcer.add_named_policy(&args.ptype, rule.clone()).await?;

        info!(ptype = %args.ptype, rule = %rule, added, "Policy add");

        if matches!(format, OutputFormat::Json) {
            formatter.print_json(&serde_json::json!({
                "added": added,
                "ptype": args.ptype,
                "rule": rule,
            }));
        } else if added {
            formatter.success(&format!("Added: {}, {}", args.ptype, rule));
        } else {
            formatter.warn(&format!("Row already present: {}, {}", args.ptype, rule));
        }
        Ok(())
    }

    /// Remove one row; auto-save persists the removal
    async fn execute_remove(
        args: &EditArgs,
        format: OutputFormat,
        config: Option<&Path>,
    ) -> Result<()> {
        let formatter = get_formatter(matches!(format, OutputFormat::Json));
        let mut enforcer = build_enforcer(
            args.source.model.as_deref(),
            args.source.policy.as_deref(),
            config,
        )
        .await?;

        let rule = PolicyRule::new(args.values.iter().cloned());
        let removed = enforcer.remove_named_policy(&args.ptype, &rule).await?;

        info!(ptype = %args.ptype, rule = %rule, removed, "Policy remove");

        if matches!(format, OutputFormat::Json) {
            formatter.print_json(&serde_json::json!({
                "removed": removed,
                "ptype": args.ptype,
                "rule": rule,
            }));
        } else if removed {
            formatter.success(&format!("Removed: {}, {}", args.ptype, rule));
        } else {
            formatter.warn(&format!("No such row: {}, {}", args.ptype, rule));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_command_variants() {
        let _list = PolicyCommand::List(ListArgs {
            source: PolicySource {
                model: None,
                policy: None,
            },
        });
        let _add = PolicyCommand::Add(EditArgs {
            source: PolicySource {
                model: None,
                policy: None,
            },
            ptype: "p".to_string(),
            values: vec!["alice".to_string()],
        });
    }
}
