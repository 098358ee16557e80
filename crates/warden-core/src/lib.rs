//! Warden Core - Domain logic and business rules
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain entities** - `Model`, `PolicyRule`, `PolicyStore`, effect merging,
//!   and the diagnostic event snapshots (`ModelEvent`, `EnforceEvent`, `PolicyEvent`)
//! - **Matcher engine** - Lexer, parser, and evaluator for matcher expressions,
//!   plus the built-in matching functions (`keyMatch`, `keyMatch2`, `regexMatch`,
//!   `globMatch`)
//! - **Port definitions** - Traits for adapters: `IPolicyAdapter`,
//!   `IDecisionLogger`, `IRoleManager`, `IPolicyWatcher`
//! - **Error taxonomy** - `ConfigurationError`, `EvaluationError`, `EnforcerError`
//!
//! # Architecture
//!
//! This crate follows the hexagonal (ports & adapters) architecture pattern.
//! The domain module contains pure business logic with no external dependencies.
//! Ports define trait interfaces that adapter crates implement.
//! The enforcer in `warden-engine` orchestrates domain entities through the
//! port interfaces.

pub mod config;
pub mod domain;
pub mod errors;
pub mod matcher;
pub mod ports;

pub use errors::{ConfigurationError, EnforcerError, EvaluationError};
