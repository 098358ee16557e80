//! Check command - Decide one authorization request
//!
//! Provides the `warden check` CLI command which:
//! 1. Builds an enforcer from the given model and policy sources
//! 2. Evaluates the request values in request-definition order
//! 3. Prints ALLOW or DENY, optionally with the rows behind the decision

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;
use tracing::debug;

use crate::commands::build_enforcer;
use crate::output::{get_formatter, OutputFormat};

/// Check one request against the policy
#[derive(Debug, Args)]
pub struct CheckCommand {
    /// Path to the model definition
    #[arg(short, long)]
    pub model: Option<PathBuf>,

    /// Path to the CSV policy file
    #[arg(short, long)]
    pub policy: Option<PathBuf>,

    /// Show the policy rows behind the decision
    #[arg(long)]
    pub explain: bool,

    /// Request values in request-definition order, e.g. `alice data1 read`
    #[arg(required = true, num_args = 1..)]
    pub request: Vec<String>,
}

impl CheckCommand {
    /// Execute the check command
    pub async fn execute(&self, format: OutputFormat, config: Option<&Path>) -> Result<()> {
        let formatter = get_formatter(matches!(format, OutputFormat::Json));

        let enforcer =
            build_enforcer(self.model.as_deref(), self.policy.as_deref(), config).await?;

        debug!(request = ?self.request, "Checking request");
        let (allowed, explains) = enforcer.enforce_ex(&self.request)?;

        if matches!(format, OutputFormat::Json) {
            let json = serde_json::json!({
                "allowed": allowed,
                "request": self.request,
                "explains": explains,
            });
            formatter.print_json(&json);
            return Ok(());
        }

        let request = self.request.join(", ");
        if allowed {
            formatter.success(&format!("ALLOW  {}", request));
        } else {
            formatter.failure(&format!("DENY   {}", request));
        }

        if self.explain {
            if explains.is_empty() {
                formatter.info("No policy row matched; the effect default decided.");
            } else {
                formatter.info(&format!("Matched {} policy row(s):", explains.len()));
                for rule in &explains {
                    formatter.info(&format!("  {}", rule));
                }
            }
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
