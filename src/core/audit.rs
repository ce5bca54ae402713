//! Audit sink implementations for admission decisions.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::util::clock::now_ms;

/// Audit event structure.
#[derive(Debug, Clone)]
pub struct AuditEvent {
    /// Event identifier.
    pub event_id: String,
    /// Related task instance identifier.
    pub task_id: String,
    /// Pool name.
    pub pool: String,
    /// Action taken (admit, queue, wake, evict, transition, release).
    pub action: String,
    /// Timestamp milliseconds.
    pub created_at_ms: u128,
    /// Additional context.
    pub payload: Option<String>,
}

/// Audit sink abstraction.
pub trait AuditSink: Send {
    /// Record an audit event.
    fn record(&mut self, event: AuditEvent);
}

/// Audit sink shared between the components of one scheduler.
pub type SharedAuditSink = Arc<Mutex<Box<dyn AuditSink>>>;

/// Wrap a sink for sharing.
pub fn share_audit_sink(sink: Box<dyn AuditSink>) -> SharedAuditSink {
    Arc::new(Mutex::new(sink))
}

/// Record one event on an optional shared sink.
pub(crate) fn record_to(
    sink: Option<&SharedAuditSink>,
    task_id: impl Into<String>,
    pool: &str,
    action: &str,
    payload: Option<String>,
) {
    if let Some(sink) = sink {
        sink.lock()
            .record(build_audit_event(task_id, pool, action, payload));
    }
}

/// Shared sinks let the caller keep a handle for inspection.
impl<T: AuditSink + ?Sized> AuditSink for Arc<Mutex<T>> {
    fn record(&mut self, event: AuditEvent) {
        self.lock().record(event);
    }
}

/// In-memory audit sink for testing and dev.
pub struct InMemoryAuditSink {
    events: VecDeque<AuditEvent>,
    max_events: usize,
}

impl InMemoryAuditSink {
    /// Create a new in-memory sink with a bounded buffer.
    pub fn new(max_events: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(max_events),
            max_events,
        }
    }

    /// Retrieve a snapshot of stored events.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.iter().cloned().collect()
    }

    /// Stored events for one action, oldest first.
    pub fn events_for(&self, action: &str) -> Vec<AuditEvent> {
        self.events
            .iter()
            .filter(|e| e.action == action)
            .cloned()
            .collect()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&mut self, event: AuditEvent) {
        if self.max_events == 0 {
            return;
        }
        if self.events.len() >= self.max_events {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }
}

/// Helper to build an audit event with a fresh id and the current time.
pub fn build_audit_event(
    task_id: impl Into<String>,
    pool: impl Into<String>,
    action: impl Into<String>,
    payload: Option<String>,
) -> AuditEvent {
    AuditEvent {
        event_id: uuid::Uuid::new_v4().to_string(),
        task_id: task_id.into(),
        pool: pool.into(),
        action: action.into(),
        created_at_ms: now_ms(),
        payload,
    }
}
