//! CLI command implementations

pub mod check;
pub mod policy;
pub mod roles;
pub mod validate;

use std::path::Path;

use anyhow::{Context, Result};

use warden_core::config::Config;
use warden_engine::{Enforcer, EnforcerBuilder};

/// Builds an enforcer from explicit `-m`/`-p` paths, falling back to the
/// configuration file when no model flag is given
pub(crate) async fn build_enforcer(
    model: Option<&Path>,
    policy: Option<&Path>,
    config: Option<&Path>,
) -> Result<Enforcer> {
    let result = match (model, policy) {
        (Some(model), Some(policy)) => {
            EnforcerBuilder::new()
                .model_path(model)
                .policy_file(policy)
                .build()
                .await
        }
        (Some(model), None) => EnforcerBuilder::new().model_path(model).build().await,
        (None, Some(_)) => anyhow::bail!("--policy requires --model"),
        (None, None) => {
            let config_path = config
                .map(Path::to_path_buf)
                .unwrap_or_else(Config::default_path);
            let config = Config::load(&config_path).with_context(|| {
                format!("Failed to load configuration from {}", config_path.display())
            })?;
            EnforcerBuilder::from_config(&config).build().await
        }
    };
    result.context("Failed to build enforcer")
}
