//! Warden Store - Policy rule persistence
//!
//! Storage backends for policy rules:
//! - In-memory, for tests and ephemeral enforcers
//! - CSV files, the interchange format shared with other PERM engines
//! - SQLite, for concurrent access and larger rule sets
//!
//! ## Architecture
//!
//! This crate implements the `IPolicyAdapter` port from `warden-core`.
//! All three backends are driven (secondary) adapters in the hexagonal
//! architecture; the enforcer never knows which one it is talking to.
//!
//! ## Key Components
//!
//! - [`MemoryAdapter`] - Rule set held in process memory
//! - [`FileAdapter`] - CSV-backed rule set
//! - [`SqliteAdapter`] - SQLite-backed rule set
//! - [`StorePool`] - Connection pool with migration support
//! - [`StoreError`] - Error types for storage operations
//!
//! ## Usage
//!
//! ```no_run
//! use std::path::Path;
//! use warden_store::{SqliteAdapter, StorePool};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let pool = StorePool::new(Path::new("/var/lib/warden/policy.db")).await?;
//! let adapter = SqliteAdapter::new(pool.pool().clone());
//! // Use adapter as IPolicyAdapter...
//! # Ok(())
//! # }
//! ```

pub mod file;
pub mod memory;
pub mod pool;
pub mod sqlite;

pub use file::FileAdapter;
pub use memory::MemoryAdapter;
pub use pool::StorePool;
pub use sqlite::SqliteAdapter;

/// Errors that can occur during storage operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Failed to establish a database connection
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// A database query failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Schema migration failed
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Reading or writing a policy file failed
    #[error("Policy file I/O failed: {0}")]
    Io(String),

    /// A policy file line that is not `ptype, v0, v1, ...`
    #[error("Malformed policy line {line}: `{text}`")]
    MalformedLine { line: usize, text: String },

    /// A rule with more values than the schema can hold
    #[error("Policy rule has {0} values; at most 6 are supported")]
    RuleTooWide(usize),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::QueryFailed(e.to_string())
    }
}
