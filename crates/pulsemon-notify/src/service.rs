//! Notification service: the composition root.
//!
//! Owns one store, one bus, and one persistence slot for the whole process.
//! Every mutation goes through here, which keeps the single-writer
//! discipline: panels and the delivery channel never touch the store
//! directly. Persistence is best-effort: failures are logged and the
//! in-memory store remains the source of truth.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::bus::{NotificationBus, NotificationEvent};
use crate::notification::{Notification, NotificationKind, NotificationOptions};
use crate::persist::NotificationSlot;
use crate::store::{DEFAULT_CAPACITY, NotificationStore};

/// Title used when a server-originated event carries none.
pub const DEFAULT_ALERT_TITLE: &str = "System Alert";

/// Service construction parameters.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Store capacity; the oldest records are evicted beyond this.
    pub max_notifications: usize,
    /// Auto-dismiss duration applied to server events that carry none.
    pub server_event_duration: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_notifications: DEFAULT_CAPACITY,
            server_event_duration: Duration::from_millis(10_000),
        }
    }
}

impl ServiceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(mut self, max_notifications: usize) -> Self {
        self.max_notifications = max_notifications;
        self
    }

    pub fn with_server_event_duration(mut self, duration: Duration) -> Self {
        self.server_event_duration = duration;
        self
    }
}

/// Alert payload delivered from a server process.
///
/// `severity` is an open string on the wire; unmapped values classify as
/// `info` rather than being rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerEvent {
    pub severity: String,
    #[serde(default)]
    pub title: Option<String>,
    pub message: String,
    #[serde(default)]
    pub server: Option<String>,
    /// Auto-dismiss override in milliseconds.
    #[serde(default)]
    pub duration_ms: Option<u64>,
}

struct ServiceInner {
    store: Mutex<NotificationStore>,
    bus: NotificationBus,
    slot: Arc<dyn NotificationSlot>,
    config: ServiceConfig,
}

/// Cheaply cloneable handle to the process-wide notification state.
///
/// Construct exactly once and pass the handle to whatever composes the UI
/// and the delivery channel; there is no hidden global accessor.
#[derive(Clone)]
pub struct NotificationService {
    inner: Arc<ServiceInner>,
}

impl NotificationService {
    /// Build the service and hydrate it from the slot.
    ///
    /// Load failures are logged and yield an empty collection. Records whose
    /// expiry deadline already passed are dropped on the spot; future
    /// deadlines get their one-shot timers re-armed (when called inside a
    /// tokio runtime).
    pub fn new(config: ServiceConfig, slot: Arc<dyn NotificationSlot>) -> Self {
        let mut loaded = match slot.load() {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, "failed to load persisted notifications, starting empty");
                Vec::new()
            }
        };

        let now = Utc::now();
        let before = loaded.len();
        loaded.retain(|n| !n.is_expired(now));
        let dropped = before - loaded.len();
        if dropped > 0 {
            debug!(count = dropped, "dropped expired notifications at startup");
        }

        let pending: Vec<(String, DateTime<Utc>)> = loaded
            .iter()
            .filter_map(|n| n.expires_at.map(|at| (n.id.clone(), at)))
            .collect();

        let mut store = NotificationStore::new(config.max_notifications);
        store.replace(loaded);

        let service = Self {
            inner: Arc::new(ServiceInner {
                store: Mutex::new(store),
                bus: NotificationBus::new(),
                slot,
                config,
            }),
        };

        for (id, deadline) in pending {
            service.schedule_expiry(id, deadline);
        }

        service
    }

    /// The event bus panels subscribe to.
    pub fn bus(&self) -> &NotificationBus {
        &self.inner.bus
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.inner.config
    }

    /// Create a notification. Returns its id.
    ///
    /// Order of effects: store insert (with eviction), write-through to the
    /// slot when `options.persist` is set, `New` then `Updated` on the bus,
    /// and finally the expiry timer when a duration applies. Critical
    /// records are never auto-dismissed: their duration is ignored.
    pub fn add_notification(
        &self,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
        options: NotificationOptions,
    ) -> String {
        let mut notification = Notification::new(kind, title, message);
        notification.metadata = options.metadata;
        notification.action = options.action;

        let duration = match kind {
            NotificationKind::Critical => None,
            _ => options.duration,
        };
        if let Some(d) = duration {
            let delta = chrono::TimeDelta::from_std(d).unwrap_or_else(|_| chrono::TimeDelta::zero());
            notification.expires_at = Some(notification.timestamp + delta);
        }

        let record = notification.clone();
        let id = record.id.clone();
        let expires_at = record.expires_at;
        let snapshot = {
            let mut store = self.inner.store.lock();
            store.add(notification);
            store.list()
        };

        if options.persist {
            self.persist(&snapshot);
        }
        self.inner.bus.emit(&NotificationEvent::New(record));
        self.inner.bus.emit(&NotificationEvent::Updated(snapshot));

        if let Some(at) = expires_at {
            self.schedule_expiry(id.clone(), at);
        }

        id
    }

    /// Remove by id. Idempotent: an absent id still persists and publishes
    /// the (unchanged) snapshot, mirroring the filter-then-save behavior the
    /// panels rely on.
    pub fn remove_notification(&self, id: &str) {
        let snapshot = {
            let mut store = self.inner.store.lock();
            store.remove(id);
            store.list()
        };
        self.persist(&snapshot);
        self.inner.bus.emit(&NotificationEvent::Updated(snapshot));
    }

    /// Transition one record to read. Absent or already-read ids are a
    /// complete no-op: nothing is persisted and no event is emitted.
    pub fn mark_as_read(&self, id: &str) {
        let (record, snapshot) = {
            let mut store = self.inner.store.lock();
            match store.mark_read(id) {
                Some(record) => (record, store.list()),
                None => return,
            }
        };
        self.persist(&snapshot);
        self.inner.bus.emit(&NotificationEvent::Read(record));
        self.inner.bus.emit(&NotificationEvent::Updated(snapshot));
    }

    /// Mark every record read in one pass.
    pub fn mark_all_as_read(&self) {
        let snapshot = {
            let mut store = self.inner.store.lock();
            store.mark_all_read();
            store.list()
        };
        self.persist(&snapshot);
        self.inner.bus.emit(&NotificationEvent::Updated(snapshot));
    }

    /// Empty the collection unconditionally.
    pub fn clear_all(&self) {
        let snapshot = {
            let mut store = self.inner.store.lock();
            store.clear();
            store.list()
        };
        self.persist(&snapshot);
        self.inner.bus.emit(&NotificationEvent::Updated(snapshot));
    }

    pub fn get_unread_count(&self) -> usize {
        self.inner.store.lock().unread_count()
    }

    /// Ordered snapshot, newest first.
    pub fn get_notifications(&self) -> Vec<Notification> {
        self.inner.store.lock().list()
    }

    /// Normalize an externally delivered alert into a notification.
    ///
    /// Server-originated events always persist, and default to a 10 second
    /// auto-dismiss unless the payload overrides it.
    pub fn ingest_server_event(&self, event: &ServerEvent) -> String {
        let kind = NotificationKind::from_severity(&event.severity);
        let title = event
            .title
            .clone()
            .unwrap_or_else(|| DEFAULT_ALERT_TITLE.to_string());

        let duration = event
            .duration_ms
            .map(Duration::from_millis)
            .unwrap_or(self.inner.config.server_event_duration);

        let mut options = NotificationOptions::new()
            .with_duration(duration)
            .persisted();
        if let Some(server) = &event.server {
            let mut metadata = serde_json::Map::new();
            metadata.insert("server".into(), serde_json::Value::from(server.clone()));
            options = options.with_metadata(metadata);
        }

        self.add_notification(kind, title, event.message.clone(), options)
    }

    fn persist(&self, records: &[Notification]) {
        if let Err(e) = self.inner.slot.save(records) {
            warn!(error = %e, "failed to persist notifications");
        }
    }

    /// Arm a fire-and-forget removal timer.
    ///
    /// Removal is idempotent, so a record removed earlier through another
    /// path needs no timer cancellation bookkeeping.
    fn schedule_expiry(&self, id: String, deadline: DateTime<Utc>) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!(id, "no async runtime available, expiry timer not scheduled");
            return;
        };
        let service = self.clone();
        handle.spawn(async move {
            let wait = (deadline - Utc::now()).to_std().unwrap_or(Duration::ZERO);
            tokio::time::sleep(wait).await;
            debug!(id, "notification expired");
            service.remove_notification(&id);
        });
    }
}
