//! Warden Engine - the authorization enforcer
//!
//! Provides:
//! - The [`Enforcer`]: model + policy + matcher evaluation behind one handle
//! - Runtime diagnostics via a swappable decision logger
//! - A reversible enforcement gate for maintenance bypass
//! - Policy management and RBAC convenience APIs
//!
//! ## Modules
//!
//! - [`enforcer`] - Core decision loop, loading, and runtime toggles
//! - [`builder`] - `EnforcerBuilder` wiring model, adapter, logger, watcher
//! - [`management`] - get/has/add/remove over policy and grouping rows
//! - [`rbac`] - Role and permission queries layered on the grouping policy
//! - [`watcher`] - In-process policy change notifications between siblings

pub mod builder;
pub mod enforcer;
pub mod management;
pub mod rbac;
pub mod watcher;

pub use builder::EnforcerBuilder;
pub use enforcer::Enforcer;
pub use watcher::LocalWatcher;
