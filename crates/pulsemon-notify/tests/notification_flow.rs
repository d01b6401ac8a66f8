//! End-to-end behavior of the notification service: eviction, event
//! ordering, idempotence, persistence round-trips, and expiry timers.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use pulsemon_notify::{
    EventKind, FileSlot, MemorySlot, NotificationEvent, NotificationKind, NotificationOptions,
    NotificationService, ServerEvent, ServiceConfig,
};
use tempfile::TempDir;

fn memory_service() -> (NotificationService, Arc<MemorySlot>) {
    let slot = Arc::new(MemorySlot::new());
    let service = NotificationService::new(ServiceConfig::default(), slot.clone());
    (service, slot)
}

#[test]
fn eviction_keeps_the_newest_hundred() {
    let (service, _slot) = memory_service();
    for i in 0..105 {
        service.add_notification(
            NotificationKind::Info,
            format!("N{i}"),
            "msg",
            NotificationOptions::new(),
        );
    }

    let list = service.get_notifications();
    assert_eq!(list.len(), 100);
    assert_eq!(list[0].title, "N104");
    assert_eq!(list.last().unwrap().title, "N5");
}

#[test]
fn every_mutation_publishes_one_updated_snapshot() {
    let (service, _slot) = memory_service();
    let updates = Arc::new(AtomicUsize::new(0));
    let mismatches = Arc::new(AtomicUsize::new(0));

    let u = updates.clone();
    let m = mismatches.clone();
    let reader = service.clone();
    service.bus().subscribe(EventKind::Updated, move |event| {
        u.fetch_add(1, Ordering::SeqCst);
        // The published snapshot must already be visible through list().
        if let NotificationEvent::Updated(snapshot) = event {
            let current = reader.get_notifications();
            if snapshot.len() != current.len() {
                m.fetch_add(1, Ordering::SeqCst);
            }
        }
    });

    let id = service.add_notification(
        NotificationKind::Warning,
        "t",
        "m",
        NotificationOptions::new(),
    );
    service.mark_as_read(&id);
    service.mark_all_as_read();
    service.remove_notification(&id);
    service.clear_all();

    assert_eq!(updates.load(Ordering::SeqCst), 5);
    assert_eq!(mismatches.load(Ordering::SeqCst), 0);
}

#[test]
fn new_event_precedes_updated_event() {
    let (service, _slot) = memory_service();
    let order = Arc::new(Mutex::new(Vec::new()));

    let o = order.clone();
    service.bus().subscribe(EventKind::New, move |_| {
        o.lock().push("new");
    });
    let o = order.clone();
    service.bus().subscribe(EventKind::Updated, move |_| {
        o.lock().push("updated");
    });

    service.add_notification(NotificationKind::Info, "t", "m", NotificationOptions::new());
    assert_eq!(*order.lock(), vec!["new", "updated"]);
}

#[test]
fn mark_as_read_emits_read_only_once() {
    let (service, _slot) = memory_service();
    let reads = Arc::new(AtomicUsize::new(0));

    let r = reads.clone();
    service.bus().subscribe(EventKind::Read, move |_| {
        r.fetch_add(1, Ordering::SeqCst);
    });

    let id = service.add_notification(
        NotificationKind::Error,
        "t",
        "m",
        NotificationOptions::new(),
    );
    service.mark_as_read(&id);
    service.mark_as_read(&id);
    service.mark_as_read("no-such-id");

    assert_eq!(reads.load(Ordering::SeqCst), 1);
    assert_eq!(service.get_unread_count(), 0);
}

#[test]
fn remove_is_idempotent_and_order_independent() {
    let (service, _slot) = memory_service();
    let id = service.add_notification(
        NotificationKind::Info,
        "keep",
        "m",
        NotificationOptions::new(),
    );
    let other = service.add_notification(
        NotificationKind::Info,
        "gone",
        "m",
        NotificationOptions::new(),
    );

    service.remove_notification(&other);
    service.remove_notification(&other);
    service.remove_notification("never-existed");

    assert_eq!(service.get_notifications().len(), 1);
    assert_eq!(service.get_notifications()[0].id, id);
    assert_eq!(service.get_unread_count(), 1);
}

#[test]
fn persisted_state_survives_a_restart() {
    let dir = TempDir::new().unwrap();
    let slot = Arc::new(FileSlot::new(dir.path()).unwrap());

    let first = NotificationService::new(ServiceConfig::default(), slot.clone());
    let mut metadata = serde_json::Map::new();
    metadata.insert("server".into(), serde_json::Value::from("DB-01"));
    let id = first.add_notification(
        NotificationKind::Critical,
        "Disk Full",
        "DB-01 disk at 95%",
        NotificationOptions::new()
            .persisted()
            .with_metadata(metadata.clone()),
    );
    first.mark_as_read(&id);

    // A second service hydrating from the same slot sees the same records.
    let second = NotificationService::new(ServiceConfig::default(), slot);
    let restored = second.get_notifications();
    assert_eq!(restored.len(), 1);
    assert_eq!(restored[0].id, id);
    assert_eq!(restored[0].kind, NotificationKind::Critical);
    assert!(restored[0].read);
    assert_eq!(restored[0].metadata.as_ref(), Some(&metadata));
    assert!(restored[0].action.is_none());
}

#[test]
fn corrupt_slot_starts_empty() {
    let dir = TempDir::new().unwrap();
    let slot = Arc::new(FileSlot::new(dir.path()).unwrap());
    std::fs::write(slot.path(), b"{ not json").unwrap();

    let service = NotificationService::new(ServiceConfig::default(), slot);
    assert!(service.get_notifications().is_empty());

    // The service still works, and the next mutation repairs the slot.
    service.add_notification(
        NotificationKind::Info,
        "t",
        "m",
        NotificationOptions::new().persisted(),
    );
    assert_eq!(service.get_notifications().len(), 1);
}

#[test]
fn unread_lifecycle_scenario() {
    let (service, _slot) = memory_service();
    service.add_notification(
        NotificationKind::Critical,
        "Disk Full",
        "DB-01 disk at 95%",
        NotificationOptions::new().persisted(),
    );
    assert_eq!(service.get_unread_count(), 1);

    service.mark_all_as_read();
    assert_eq!(service.get_unread_count(), 0);

    service.clear_all();
    assert!(service.get_notifications().is_empty());
}

#[test]
fn unknown_severity_classifies_as_info() {
    let (service, _slot) = memory_service();
    service.ingest_server_event(&ServerEvent {
        severity: "bogus".into(),
        title: Some("X".into()),
        message: "Y".into(),
        server: None,
        duration_ms: None,
    });
    assert_eq!(service.get_notifications()[0].kind, NotificationKind::Info);
}

#[tokio::test(start_paused = true)]
async fn duration_expires_the_record() {
    let (service, _slot) = memory_service();
    service.add_notification(
        NotificationKind::Warning,
        "transient",
        "m",
        NotificationOptions::new().with_duration(Duration::from_millis(100)),
    );
    assert_eq!(service.get_notifications().len(), 1);

    tokio::time::sleep(Duration::from_millis(250)).await;
    assert!(service.get_notifications().is_empty());
}

#[tokio::test(start_paused = true)]
async fn critical_records_are_never_auto_dismissed() {
    let (service, _slot) = memory_service();
    service.add_notification(
        NotificationKind::Critical,
        "stuck",
        "m",
        NotificationOptions::new().with_duration(Duration::from_millis(100)),
    );

    tokio::time::sleep(Duration::from_millis(250)).await;
    let list = service.get_notifications();
    assert_eq!(list.len(), 1);
    assert!(list[0].expires_at.is_none());
}

#[tokio::test(start_paused = true)]
async fn expiry_fires_after_early_removal_without_effect() {
    let (service, _slot) = memory_service();
    let id = service.add_notification(
        NotificationKind::Info,
        "t",
        "m",
        NotificationOptions::new().with_duration(Duration::from_millis(100)),
    );
    service.remove_notification(&id);
    assert!(service.get_notifications().is_empty());

    // The pending timer fires against an absent id; removal is idempotent.
    tokio::time::sleep(Duration::from_millis(250)).await;
    assert!(service.get_notifications().is_empty());
}

#[tokio::test(start_paused = true)]
async fn rehydrated_records_expire_on_schedule() {
    let slot = Arc::new(MemorySlot::new());
    {
        let writer = NotificationService::new(ServiceConfig::default(), slot.clone());
        writer.add_notification(
            NotificationKind::Info,
            "short-lived",
            "m",
            NotificationOptions::new()
                .with_duration(Duration::from_millis(100))
                .persisted(),
        );
    }

    let service = NotificationService::new(ServiceConfig::default(), slot);
    assert_eq!(service.get_notifications().len(), 1);

    tokio::time::sleep(Duration::from_millis(250)).await;
    assert!(service.get_notifications().is_empty());
}

#[tokio::test]
async fn server_events_persist_and_default_duration() {
    let slot = Arc::new(MemorySlot::new());
    let service = NotificationService::new(ServiceConfig::default(), slot.clone());

    service.ingest_server_event(&ServerEvent {
        severity: "warning".into(),
        title: None,
        message: "High CPU utilization detected".into(),
        server: Some("Web-01".into()),
        duration_ms: None,
    });

    assert_eq!(slot.save_count(), 1);
    let list = service.get_notifications();
    assert_eq!(list[0].title, "System Alert");
    // The default 10 s auto-dismiss is attached as an expiry deadline.
    assert!(list[0].expires_at.is_some());
}
