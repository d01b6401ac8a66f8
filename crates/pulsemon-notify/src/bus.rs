//! In-process publish/subscribe dispatch for notification updates.
//!
//! UI panels subscribe to one event kind and receive every subsequent
//! emission of that kind until they unsubscribe. Dispatch is synchronous on
//! the emitting thread, in registration order, with no batching.

use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::notification::Notification;

/// Events published after store mutations.
#[derive(Debug, Clone)]
pub enum NotificationEvent {
    /// A record was just created.
    New(Notification),
    /// A record transitioned from unread to read.
    Read(Notification),
    /// The full ordered snapshot after a structural or read-state mutation.
    Updated(Vec<Notification>),
}

impl NotificationEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::New(_) => EventKind::New,
            Self::Read(_) => EventKind::Read,
            Self::Updated(_) => EventKind::Updated,
        }
    }
}

/// Discriminant used to subscribe to one event stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    New,
    Read,
    Updated,
}

/// Handle returned by [`NotificationBus::subscribe`], used to detach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler = Arc<dyn Fn(&NotificationEvent) + Send + Sync>;

struct Subscriber {
    id: u64,
    kind: EventKind,
    handler: Handler,
}

/// Synchronous, order-preserving event dispatcher.
///
/// The bus holds no notification state, only subscriber registrations.
/// Emission snapshots the subscriber list before invoking anything, so an
/// unsubscribe that races with an in-flight emission takes effect from the
/// next emission onward; once `unsubscribe` returns, the handler is never
/// invoked again.
pub struct NotificationBus {
    subscribers: Mutex<Vec<Subscriber>>,
    next_id: AtomicU64,
}

impl NotificationBus {
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a handler for one event kind.
    pub fn subscribe(
        &self,
        kind: EventKind,
        handler: impl Fn(&NotificationEvent) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.subscribers.lock().push(Subscriber {
            id,
            kind,
            handler: Arc::new(handler),
        });
        SubscriptionId(id)
    }

    /// Detach a handler. Returns whether the subscription was still active.
    pub fn unsubscribe(&self, subscription: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.lock();
        let before = subscribers.len();
        subscribers.retain(|s| s.id != subscription.0);
        subscribers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }

    /// Dispatch an event to every matching subscriber, in registration
    /// order, on the calling thread.
    pub fn emit(&self, event: &NotificationEvent) {
        let kind = event.kind();
        // Snapshot under the lock, invoke outside it so handlers may
        // subscribe or unsubscribe without deadlocking.
        let handlers: Vec<Handler> = {
            let subscribers = self.subscribers.lock();
            subscribers
                .iter()
                .filter(|s| s.kind == kind)
                .map(|s| Arc::clone(&s.handler))
                .collect()
        };
        for handler in handlers {
            handler(event);
        }
    }
}

impl Default for NotificationBus {
    fn default() -> Self {
        Self::new()
    }
}
