//! Transition notifications
//!
//! Two ways to observe transitions, fed from the same emission point:
//! - callback listeners (`subscribe` / `unsubscribe`)
//! - a broadcast stream for async observers (`stream`)

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::broadcast;

use crate::Key;

/// Transition notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionEvent<P> {
    /// Emitted before any unit is unloaded or loaded
    Transitioning(P),
    /// Emitted after ledger, current place and history are committed
    Transitioned(P),
}

impl<P> TransitionEvent<P> {
    /// Place the transition targets
    pub fn place(&self) -> &P {
        match self {
            Self::Transitioning(place) | Self::Transitioned(place) => place,
        }
    }

    /// Check if this is the post-commit notification
    pub fn is_transitioned(&self) -> bool {
        matches!(self, Self::Transitioned(_))
    }
}

/// Listener ID
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

type Listener<P> = Arc<dyn Fn(&TransitionEvent<P>) + Send + Sync>;

/// Listener registry plus broadcast stream
pub struct TransitionEvents<P: Key> {
    listeners: RwLock<Vec<(ListenerId, Listener<P>)>>,
    next_listener_id: AtomicU64,
    sender: broadcast::Sender<TransitionEvent<P>>,
}

impl<P: Key> TransitionEvents<P> {
    /// Create with a stream capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            listeners: RwLock::new(Vec::new()),
            next_listener_id: AtomicU64::new(1),
            sender,
        }
    }

    /// Register a callback
    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&TransitionEvent<P>) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_listener_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.write().push((id, Arc::new(listener)));
        id
    }

    /// Remove a callback, returning whether it was registered
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        listeners.len() != before
    }

    /// Open a new stream receiving every event emitted from now on
    pub fn stream(&self) -> broadcast::Receiver<TransitionEvent<P>> {
        self.sender.subscribe()
    }

    /// Number of registered callbacks
    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }

    /// Deliver an event to every callback, then to every stream
    pub(crate) fn emit(&self, event: TransitionEvent<P>) {
        // Snapshot so callbacks may subscribe or unsubscribe re-entrantly
        let listeners: Vec<Listener<P>> = self
            .listeners
            .read()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();

        for listener in listeners {
            listener(&event);
        }

        // No receivers is not an error
        let _ = self.sender.send(event);
    }
}

impl<P: Key> Default for TransitionEvents<P> {
    fn default() -> Self {
        Self::new(64)
    }
}
