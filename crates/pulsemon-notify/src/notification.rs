//! Notification record and severity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Severity classification for a notification.
///
/// `Critical` is the highest severity and is never auto-dismissed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Success,
    Warning,
    Error,
    Critical,
}

impl NotificationKind {
    /// Map an externally supplied severity string.
    ///
    /// Unknown values fall back to [`NotificationKind::Info`], the lowest
    /// severity, rather than being rejected.
    pub fn from_severity(severity: &str) -> Self {
        match severity {
            "critical" => Self::Critical,
            "error" => Self::Error,
            "warning" => Self::Warning,
            "success" => Self::Success,
            _ => Self::Info,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An action the UI layer can attach to a notification.
///
/// The callback is owned by whichever panel registered it and is never
/// persisted; a record restored from the slot always has `action: None`.
#[derive(Clone)]
pub struct NotificationAction {
    pub label: String,
    pub on_invoke: Arc<dyn Fn() + Send + Sync>,
}

impl NotificationAction {
    pub fn new(label: impl Into<String>, on_invoke: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            label: label.into(),
            on_invoke: Arc::new(on_invoke),
        }
    }

    pub fn invoke(&self) {
        (self.on_invoke)();
    }
}

impl fmt::Debug for NotificationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationAction")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// A single user-facing notification record.
///
/// Instants serialize as RFC 3339 text so the persisted layout is one JSON
/// array of records with ISO-8601 timestamps.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub read: bool,
    #[serde(skip)]
    pub action: Option<NotificationAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Notification {
    /// Create an unread record with a fresh id.
    ///
    /// Ids are UUID v7: a millisecond timestamp prefix keeps them ordered by
    /// creation, the random tail makes collisions across the process
    /// lifetime practically impossible.
    pub fn new(
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            kind,
            title: title.into(),
            message: message.into(),
            timestamp: Utc::now(),
            read: false,
            action: None,
            metadata: None,
            expires_at: None,
        }
    }

    /// Whether the record's expiry deadline has passed as of `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Per-call options for `NotificationService::add_notification`.
#[derive(Debug, Clone, Default)]
pub struct NotificationOptions {
    /// Auto-dismiss the record after this long. Ignored for critical records.
    pub duration: Option<Duration>,
    /// Write the list through to the persistence slot immediately after add.
    pub persist: bool,
    /// Display priority hint (1-10). Carried for panels, not interpreted by
    /// the core.
    pub priority: Option<u8>,
    /// Open diagnostic payload, persisted with the record.
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
    /// UI callback, never persisted.
    pub action: Option<NotificationAction>,
}

impl NotificationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn persisted(mut self) -> Self {
        self.persist = true;
        self
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Map<String, serde_json::Value>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_action(mut self, action: NotificationAction) -> Self {
        self.action = Some(action);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_mapping() {
        assert_eq!(
            NotificationKind::from_severity("critical"),
            NotificationKind::Critical
        );
        assert_eq!(
            NotificationKind::from_severity("warning"),
            NotificationKind::Warning
        );
        assert_eq!(
            NotificationKind::from_severity("bogus"),
            NotificationKind::Info
        );
        assert_eq!(NotificationKind::from_severity(""), NotificationKind::Info);
    }

    #[test]
    fn test_ids_are_unique_and_ordered() {
        let a = Notification::new(NotificationKind::Info, "a", "first");
        // Cross a millisecond boundary so the timestamp prefix differs.
        std::thread::sleep(Duration::from_millis(2));
        let b = Notification::new(NotificationKind::Info, "b", "second");
        assert_ne!(a.id, b.id);
        // v7 ids sort by creation time.
        assert!(a.id < b.id);
    }

    #[test]
    fn test_new_record_is_unread() {
        let n = Notification::new(NotificationKind::Warning, "t", "m");
        assert!(!n.read);
        assert!(n.action.is_none());
        assert!(n.expires_at.is_none());
    }

    #[test]
    fn test_serialize_skips_action_and_uses_wire_names() {
        let mut n = Notification::new(NotificationKind::Error, "t", "m");
        n.action = Some(NotificationAction::new("retry", || {}));
        let json = serde_json::to_value(&n).unwrap();
        assert_eq!(json["type"], "error");
        assert!(json.get("action").is_none());
        assert!(json["timestamp"].as_str().unwrap().contains('T'));
    }

    #[test]
    fn test_expiry_check() {
        let mut n = Notification::new(NotificationKind::Info, "t", "m");
        let now = Utc::now();
        assert!(!n.is_expired(now));
        n.expires_at = Some(now - chrono::TimeDelta::seconds(1));
        assert!(n.is_expired(now));
        n.expires_at = Some(now + chrono::TimeDelta::seconds(1));
        assert!(!n.is_expired(now));
    }
}
