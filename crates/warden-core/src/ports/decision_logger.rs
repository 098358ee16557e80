//! Decision logger port (driven/secondary port)
//!
//! This module defines the interface for recording what the authorization
//! engine is doing: which model it loaded, which policy rows are in memory,
//! and how each enforcement request was decided. Implementations may write
//! to stderr, emit structured JSON, forward to `tracing`, or discard
//! everything.
//!
//! ## Design Notes
//!
//! - Every operation is infallible. A logger that cannot reach its sink
//!   must absorb the failure itself; diagnostics never change an
//!   authorization decision.
//! - Each logger carries its own enabled flag. When disabled, the `log_*`
//!   operations are no-ops. Callers may also skip event construction when
//!   the logger reports itself disabled, so implementations must not rely
//!   on receiving every event.
//! - `set_enabled` is idempotent and safe to call from any thread.

use crate::domain::events::{EnforceEvent, ModelEvent, PolicyEvent};

/// Port trait for diagnostic logging of engine activity
///
/// An enforcer holds exactly one logger at a time and invokes it at three
/// points: after a model is loaded (`log_model`), after the policy store
/// changes (`log_policy`), and after each enforcement decision
/// (`log_enforce`). Role manager activity is reported through `log_role`.
///
/// ## Implementation Notes
///
/// - `is_enabled` must be a cheap, lock-free read; the engine calls it on
///   every enforcement request.
/// - Implementations are shared across threads behind `Arc`, so all state
///   needs interior mutability.
pub trait IDecisionLogger: Send + Sync {
    /// Turns logging on or off
    ///
    /// Idempotent. Takes effect for subsequent `log_*` calls; calls already
    /// in flight on other threads may still observe the previous state.
    fn set_enabled(&self, enabled: bool);

    /// Reports whether this logger is currently recording events
    fn is_enabled(&self) -> bool;

    /// Records the model configuration currently in effect
    ///
    /// No-op when disabled.
    fn log_model(&self, event: &ModelEvent);

    /// Records a single enforcement decision
    ///
    /// The event carries the matcher expression, the request values, the
    /// boolean outcome, and the indices of the policy rows that determined
    /// it. No-op when disabled.
    fn log_enforce(&self, event: &EnforceEvent);

    /// Records the full policy store contents
    ///
    /// No-op when disabled.
    fn log_policy(&self, event: &PolicyEvent);

    /// Records role inheritance links discovered or traversed
    ///
    /// No-op when disabled.
    fn log_role(&self, roles: &[String]);
}
