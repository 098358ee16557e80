//! Warden CLI - Command-line authorization checks
//!
//! Provides commands for:
//! - Checking a request against a model and policy
//! - Validating model, policy, and configuration files
//! - Listing and editing policy rows
//! - Inspecting a user's roles and permissions

use std::path::Path;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{
    check::CheckCommand, policy::PolicyCommand, roles::RolesCommand, validate::ValidateCommand,
};
use output::OutputFormat;

#[derive(Debug, Parser)]
#[command(name = "warden", version, about = "Policy-based authorization engine")]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Check one request against the policy
    Check(CheckCommand),
    /// Validate model, policy, and configuration files
    Validate(ValidateCommand),
    /// List and edit policy rows
    #[command(subcommand)]
    Policy(PolicyCommand),
    /// Show a user's roles and direct permissions
    Roles(RolesCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup tracing
    let filter = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };
    let config = cli.config.as_deref().map(Path::new);

    match cli.command {
        Commands::Check(cmd) => cmd.execute(format, config).await,
        Commands::Validate(cmd) => cmd.execute(format, config).await,
        Commands::Policy(cmd) => cmd.execute(format, config).await,
        Commands::Roles(cmd) => cmd.execute(format, config).await,
    }
}
