//! In-process policy watcher
//!
//! [`LocalWatcher`] propagates policy change announcements between
//! enforcer instances inside one process over a tokio broadcast channel.
//! Each instance holds a sibling of the same watcher; an announcement
//! from any of them reaches every sibling that registered a callback,
//! including the announcer itself.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;

use warden_core::ports::watcher::IPolicyWatcher;

/// Announcements buffered per receiver before the channel reports a lag
const NOTIFY_CAPACITY: usize = 16;

type UpdateCallback = Box<dyn Fn() + Send + Sync>;

/// Broadcast-backed watcher for enforcers sharing a process
///
/// Call [`LocalWatcher::sibling`] to derive the handle for each further
/// enforcer; siblings share the channel but keep their own callback.
/// Registering a callback spawns a listener task on the current tokio
/// runtime, so [`IPolicyWatcher::set_update_callback`] must run inside
/// one. Delivery is best-effort: a lagged receiver still runs its
/// callback once, which is enough to schedule a reload.
pub struct LocalWatcher {
    /// Shared announcement channel
    sender: broadcast::Sender<()>,
    /// This instance's reload callback, replaced on re-registration
    callback: Arc<Mutex<Option<UpdateCallback>>>,
    /// Set once the listener task for this instance has been spawned
    listening: AtomicBool,
}

impl LocalWatcher {
    /// Creates a watcher with a fresh announcement channel
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(NOTIFY_CAPACITY);
        Self {
            sender,
            callback: Arc::new(Mutex::new(None)),
            listening: AtomicBool::new(false),
        }
    }

    /// Derives a watcher on the same channel with its own callback slot
    pub fn sibling(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            callback: Arc::new(Mutex::new(None)),
            listening: AtomicBool::new(false),
        }
    }
}

impl Default for LocalWatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl IPolicyWatcher for LocalWatcher {
    fn set_update_callback(&self, callback: Box<dyn Fn() + Send + Sync>) {
        match self.callback.lock() {
            Ok(mut slot) => *slot = Some(callback),
            Err(poisoned) => *poisoned.into_inner() = Some(callback),
        }
        // One listener task per instance; later registrations only
        // swap the callback it invokes.
        if self
            .listening
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            let mut receiver = self.sender.subscribe();
            let slot = Arc::clone(&self.callback);
            tokio::spawn(async move {
                loop {
                    match receiver.recv().await {
                        Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => {
                            let guard = match slot.lock() {
                                Ok(guard) => guard,
                                Err(poisoned) => poisoned.into_inner(),
                            };
                            if let Some(callback) = guard.as_ref() {
                                callback();
                            }
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
            });
        }
    }

    async fn notify_update(&self) -> anyhow::Result<()> {
        // A send error only means no sibling is listening yet.
        let _ = self.sender.send(());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::sync::mpsc;
    use tokio::time::timeout;

    use super::*;

    const DELIVERY_WINDOW: Duration = Duration::from_secs(1);

    #[tokio::test]
    async fn test_notification_reaches_a_sibling() {
        let watcher = LocalWatcher::new();
        let sibling = watcher.sibling();

        let (tx, mut rx) = mpsc::unbounded_channel();
        sibling.set_update_callback(Box::new(move || {
            let _ = tx.send(());
        }));

        watcher.notify_update().await.unwrap();

        let delivered = timeout(DELIVERY_WINDOW, rx.recv()).await;
        assert_eq!(delivered.ok().flatten(), Some(()));
    }

    #[tokio::test]
    async fn test_announcer_hears_its_own_announcement() {
        let watcher = LocalWatcher::new();

        let (tx, mut rx) = mpsc::unbounded_channel();
        watcher.set_update_callback(Box::new(move || {
            let _ = tx.send(());
        }));

        watcher.notify_update().await.unwrap();

        let delivered = timeout(DELIVERY_WINDOW, rx.recv()).await;
        assert_eq!(delivered.ok().flatten(), Some(()));
    }

    #[tokio::test]
    async fn test_re_registration_replaces_the_callback() {
        let watcher = LocalWatcher::new();
        let sibling = watcher.sibling();

        let (old_tx, mut old_rx) = mpsc::unbounded_channel();
        sibling.set_update_callback(Box::new(move || {
            let _ = old_tx.send("old");
        }));

        let (new_tx, mut new_rx) = mpsc::unbounded_channel();
        sibling.set_update_callback(Box::new(move || {
            let _ = new_tx.send("new");
        }));

        watcher.notify_update().await.unwrap();

        let delivered = timeout(DELIVERY_WINDOW, new_rx.recv()).await;
        assert_eq!(delivered.ok().flatten(), Some("new"));
        assert!(old_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_notify_without_listeners_succeeds() {
        let watcher = LocalWatcher::new();
        watcher.notify_update().await.unwrap();
    }
}
