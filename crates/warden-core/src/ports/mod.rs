//! Port definitions (hexagonal architecture interfaces)
//!
//! This module defines the port traits that form the boundaries of the
//! hexagonal architecture. Ports are interfaces that the domain core
//! depends on, but whose implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`IPolicyAdapter`] - Persistent storage for policy rules (file, SQLite, memory)
//! - [`IRoleManager`] - Role inheritance graph queried during matcher evaluation
//! - [`IDecisionLogger`] - Diagnostic sink for model, policy, and decision events
//! - [`IPolicyWatcher`] - Cross-instance notification of policy changes

pub mod decision_logger;
pub mod policy_adapter;
pub mod role_manager;
pub mod watcher;

pub use decision_logger::IDecisionLogger;
pub use policy_adapter::IPolicyAdapter;
pub use role_manager::IRoleManager;
pub use watcher::IPolicyWatcher;
