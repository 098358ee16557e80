//! Validate command - Check definition files without serving a decision
//!
//! Provides the `warden validate` CLI command which:
//! 1. Parses the model and reports the first syntax error with its line
//! 2. Loads the policy against the model, catching arity mismatches
//! 3. With no model flag, validates the YAML configuration file instead

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;

use warden_core::config::Config;
use warden_engine::EnforcerBuilder;

use crate::output::{get_formatter, OutputFormat, OutputFormatter};

/// Validate model, policy, and configuration files
#[derive(Debug, Args)]
pub struct ValidateCommand {
    /// Path to the model definition
    #[arg(short, long)]
    pub model: Option<PathBuf>,

    /// Path to the CSV policy file, checked against the model
    #[arg(short, long)]
    pub policy: Option<PathBuf>,
}

impl ValidateCommand {
    /// Execute the validate command
    pub async fn execute(&self, format: OutputFormat, config: Option<&Path>) -> Result<()> {
        let formatter = get_formatter(matches!(format, OutputFormat::Json));

        let Some(model) = &self.model else {
            return self.validate_config(&*formatter, format, config);
        };

        let mut builder = EnforcerBuilder::new().model_path(model.clone());
        if let Some(policy) = &self.policy {
            builder = builder.policy_file(policy.clone());
        }

        match builder.build().await {
            Ok(enforcer) => {
                let policy_rows = enforcer.get_policy().len();
                let grouping_rows = enforcer.get_grouping_policy().len();
                if matches!(format, OutputFormat::Json) {
                    formatter.print_json(&serde_json::json!({
                        "valid": true,
                        "policy_rows": policy_rows,
                        "grouping_rows": grouping_rows,
                    }));
                } else {
                    formatter.success(&format!("Model OK: {}", model.display()));
                    if self.policy.is_some() {
                        formatter.info(&format!(
                            "{} policy row(s), {} grouping row(s)",
                            policy_rows, grouping_rows
                        ));
                    }
                }
            }
            Err(e) => {
                if matches!(format, OutputFormat::Json) {
                    formatter.print_json(&serde_json::json!({
                        "valid": false,
                        "error": e.to_string(),
                    }));
                } else {
                    formatter.failure(&e.to_string());
                }
            }
        }

        Ok(())
    }

    /// Validate the configuration file when no model was given
    fn validate_config(
        &self,
        formatter: &dyn OutputFormatter,
        format: OutputFormat,
        config: Option<&Path>,
    ) -> Result<()> {
        let config_path = config
            .map(Path::to_path_buf)
            .unwrap_or_else(Config::default_path);

        let loaded = match Config::load(&config_path) {
            Ok(loaded) => loaded,
            Err(e) => {
                if matches!(format, OutputFormat::Json) {
                    formatter.print_json(&serde_json::json!({
                        "valid": false,
                        "path": config_path.display().to_string(),
                        "error": e.to_string(),
                    }));
                } else {
                    formatter.failure(&format!("{}: {}", config_path.display(), e));
                }
                return Ok(());
            }
        };

        let errors = loaded.validate();
        if matches!(format, OutputFormat::Json) {
            let errors_json: Vec<serde_json::Value> = errors
                .iter()
                .map(|e| serde_json::json!({"field": e.field, "message": e.message}))
                .collect();
            formatter.print_json(&serde_json::json!({
                "valid": errors.is_empty(),
                "path": config_path.display().to_string(),
                "errors": errors_json,
            }));
            return Ok(());
        }

        if errors.is_empty() {
            formatter.success(&format!("Configuration OK: {}", config_path.display()));
        } else {
            formatter.failure(&format!(
                "{} problem(s) in {}",
                errors.len(),
                config_path.display()
            ));
            for error in &errors {
                formatter.info(&format!("- {}", error));
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
    fn test_validate_command_accepts_model_only() {
        let cmd = ValidateCommand {
            model: Some(PathBuf::from("model.conf")),
            policy: None,
        };
        assert!(cmd.model.is_some());
        assert!(cmd.policy.is_none());
    }
}
