//! Policy watcher port (driven/secondary port)
//!
//! This module defines the interface for propagating policy changes
//! between enforcer instances that share a storage backend. One instance
//! announces a change through `notify_update`; the others have registered
//! a callback that tells them to reload.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because the transport is adapter-specific
//!   (in-process channel, message bus, database poll).
//! - The callback runs on whatever thread the watcher delivers from, so
//!   it must be `Send + Sync` and should do no more than schedule a
//!   reload.
//! - Delivery is best-effort. A missed notification means a stale policy
//!   until the next reload, not an authorization fault.

/// Port trait for cross-instance policy change notification
///
/// ## Implementation Notes
///
/// - `set_update_callback` replaces any previously registered callback.
/// - Implementations decide whether the notifying instance also receives
///   its own notification; the engine's reload is idempotent either way.
#[async_trait::async_trait]
pub trait IPolicyWatcher: Send + Sync {
    /// Registers the callback invoked when another instance changes policy
    fn set_update_callback(&self, callback: Box<dyn Fn() + Send + Sync>);

    /// Announces a policy change to the other instances
    async fn notify_update(&self) -> anyhow::Result<()>;
}
