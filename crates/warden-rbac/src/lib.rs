//! Warden RBAC - Role inheritance graph
//!
//! Provides:
//! - `DefaultRoleManager`: The standard `IRoleManager` implementation backing
//!   grouping definitions (`g`, `g2`, ...), with domain scoping and a bounded
//!   reachability search
//! - `RoleError`: Failures surfaced by role graph mutations

pub mod role_manager;

pub use role_manager::{DefaultRoleManager, RoleError};
