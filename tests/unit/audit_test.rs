//! Tests for audit sink

use std::sync::Arc;

use parking_lot::Mutex;
use slot_pools::core::{build_audit_event, AuditSink, InMemoryAuditSink};

#[test]
fn test_in_memory_audit_sink() {
    let mut sink = InMemoryAuditSink::new(10);

    sink.record(build_audit_event("42", "pool1", "admit", Some("payload".to_string())));
    assert_eq!(sink.events().len(), 1);

    let events = sink.events();
    assert_eq!(events[0].task_id, "42");
    assert_eq!(events[0].pool, "pool1");
    assert_eq!(events[0].action, "admit");
}

#[test]
fn test_audit_sink_overflow() {
    let mut sink = InMemoryAuditSink::new(2);

    sink.record(build_audit_event("1", "pool1", "admit", None));
    sink.record(build_audit_event("2", "pool1", "queue", None));
    sink.record(build_audit_event("3", "pool1", "wake", None));

    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].task_id, "2"); // First one popped
    assert_eq!(events[1].task_id, "3");
    assert_eq!(sink.events_for("wake").len(), 1);
}

#[test]
fn test_zero_capacity_sink_drops_events() {
    let mut sink = InMemoryAuditSink::new(0);
    sink.record(build_audit_event("1", "pool1", "admit", None));
    assert!(sink.events().is_empty());
}

#[test]
fn test_build_audit_event() {
    let a = build_audit_event("1", "pool1", "release", Some("Success".to_string()));
    let b = build_audit_event("1", "pool1", "release", None);

    assert_ne!(a.event_id, b.event_id);
    assert!(a.created_at_ms > 0);
    assert_eq!(a.payload.as_deref(), Some("Success"));
}

#[test]
fn test_shared_sink_keeps_handle() {
    let shared = Arc::new(Mutex::new(InMemoryAuditSink::new(8)));
    let mut boxed: Box<dyn AuditSink> = Box::new(Arc::clone(&shared));

    boxed.record(build_audit_event("7", "pool1", "admit", None));
    assert_eq!(shared.lock().events().len(), 1);
}

#[test]
fn test_controller_records_to_private_sink() {
    use slot_pools::core::{AdmissionController, PoolStore, TaskInstance};
    use slot_pools::infra::InMemoryPoolStore;

    let store = Arc::new(InMemoryPoolStore::new());
    store
        .insert_pool(slot_pools::core::Pool::new("db", 1, false, None).unwrap())
        .unwrap();
    let shared = Arc::new(Mutex::new(InMemoryAuditSink::new(8)));
    let controller =
        AdmissionController::new(Arc::clone(&store)).with_audit(Box::new(Arc::clone(&shared)));

    controller.try_admit(TaskInstance::new(1, "db"), "db").unwrap();
    controller.try_admit(TaskInstance::new(2, "db"), "db").unwrap();

    let actions: Vec<_> = shared.lock().events().into_iter().map(|e| e.action).collect();
    assert_eq!(actions, vec!["admit", "queue"]);
}
