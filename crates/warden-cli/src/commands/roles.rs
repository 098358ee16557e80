//! Roles command - Inspect a user's roles and direct permissions
//!
//! Provides the `warden roles <user>` CLI command which:
//! 1. Lists the roles the user holds directly, optionally per domain
//! 2. Lists the policy rows naming the user as subject

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;

use crate::commands::build_enforcer;
use crate::output::{get_formatter, OutputFormat};

/// Show a user's roles and direct permissions
#[derive(Debug, Args)]
pub struct RolesCommand {
    /// Path to the model definition
    #[arg(short, long)]
    pub model: Option<PathBuf>,

    /// Path to the CSV policy file
    #[arg(short, long)]
    pub policy: Option<PathBuf>,

    /// Restrict the query to one domain
    #[arg(short, long)]
    pub domain: Option<String>,

    /// The user to look up
    pub user: String,
}

impl RolesCommand {
    /// Execute the roles command
    pub async fn execute(&self, format: OutputFormat, config: Option<&Path>) -> Result<()> {
        let formatter = get_formatter(matches!(format, OutputFormat::Json));
        let enforcer =
            build_enforcer(self.model.as_deref(), self.policy.as_deref(), config).await?;

        let domain = self.domain.as_deref();
        let roles = enforcer.get_roles_for_user(&self.user, domain);
        let permissions = enforcer.get_permissions_for_user(&self.user, domain);

        if matches!(format, OutputFormat::Json) {
            formatter.print_json(&serde_json::json!({
                "user": self.user,
                "domain": self.domain,
                "roles": roles,
                "permissions": permissions,
            }));
            return Ok(());
        }

        match domain {
            Some(domain) => {
                formatter.success(&format!("{} (domain {})", self.user, domain));
            }
            None => formatter.success(&self.user),
        }

        if roles.is_empty() {
            formatter.info("Roles: none");
        } else {
            formatter.info("Roles:");
            for role in &roles {
                formatter.info(&format!("  - {}", role));
            }
        }

        if permissions.is_empty() {
            formatter.info("Direct permissions: none");
        } else {
            formatter.info("Direct permissions:");
            for rule in &permissions {
                formatter.info(&format!("  - {}", rule));
            }
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
    fn test_roles_command_debug() {
        let cmd = RolesCommand {
            model: None,
            policy: None,
            domain: Some("domain1".to_string()),
            user: "alice".to_string(),
        };
        let debug = format!("{:?}", cmd);
        assert!(debug.contains("domain1"));
    }
}
