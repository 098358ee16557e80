//! Warden Logging - Decision logger implementations
//!
//! Concrete `IDecisionLogger` sinks for the diagnostic events an enforcer
//! emits:
//! - [`DefaultLogger`]: formatted text lines, stderr by default
//! - [`JsonLogger`]: one timestamped JSON object per event
//! - [`TracingLogger`]: bridges events onto the `tracing` ecosystem
//!
//! All three share the contract semantics: they start disabled, their
//! `log_*` operations are no-ops while disabled, and a sink failure is
//! absorbed (at most a `tracing::warn!`) rather than propagated. Attaching
//! one to an enforcer can therefore never change an authorization
//! decision.

pub mod console;
pub mod json;
pub mod trace;

pub use console::DefaultLogger;
pub use json::JsonLogger;
pub use trace::TracingLogger;
