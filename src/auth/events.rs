//! Session change fan-out shared by all auth providers.
//!
//! DESIGN
//! ======
//! Listeners are unbounded mpsc senders keyed by a monotonically assigned id.
//! A [`Subscription`] removes its own entry on `unsubscribe()` or drop, so
//! repeated bootstrap cycles never grow the registry. Publishing also prunes
//! any listener whose receiver is already gone.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, Weak};

use tokio::sync::mpsc;

use super::Session;

type Listeners = HashMap<u64, mpsc::UnboundedSender<Option<Session>>>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: Listeners,
}

/// Registry of session-change listeners.
#[derive(Clone, Default)]
pub struct SessionEvents {
    inner: Arc<Mutex<Registry>>,
}

impl SessionEvents {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new listener.
    #[must_use]
    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut registry = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let id = registry.next_id;
        registry.next_id += 1;
        registry.listeners.insert(id, tx);
        Subscription { id, rx, registry: Arc::downgrade(&self.inner) }
    }

    /// Deliver `session` to every live listener. Returns how many received it.
    pub fn publish(&self, session: Option<Session>) -> usize {
        let mut registry = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        registry
            .listeners
            .retain(|_, tx| tx.send(session.clone()).is_ok());
        registry.listeners.len()
    }

    /// Number of currently registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .listeners
            .len()
    }
}

/// Handle for one registered listener.
pub struct Subscription {
    id: u64,
    rx: mpsc::UnboundedReceiver<Option<Session>>,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    /// Wait for the next session change.
    ///
    /// Returns `None` once the subscription is released or the provider is gone.
    pub async fn recv(&mut self) -> Option<Option<Session>> {
        self.rx.recv().await
    }

    /// Remove this listener from its provider. Idempotent.
    pub fn unsubscribe(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .listeners
                .remove(&self.id);
        }
        self.registry = Weak::new();
        self.rx.close();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

#[cfg(test)]
#[path = "events_test.rs"]
mod tests;
