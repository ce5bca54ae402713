//! Pool entities, slot accounting and admission control.

pub mod admission;
pub mod audit;
pub mod classifier;
pub mod collection;
pub mod error;
pub mod pool;
pub mod registry;
pub mod store;
pub mod task;
pub mod wait_queue;

pub use admission::{Admission, AdmissionController, TransitionOutcome};
pub use audit::{
    build_audit_event, share_audit_sink, AuditEvent, AuditSink, InMemoryAuditSink, SharedAuditSink,
};
pub use classifier::{classify, OpenSlots, SlotStats};
pub use collection::{CollectionView, PoolCollection, PoolEntry};
pub use error::{AppResult, PoolError};
pub use pool::{Pool, PoolUpdate, DEFAULT_POOL_NAME, DEFAULT_POOL_SLOTS, UNBOUNDED_SLOTS};
pub use registry::PoolRegistry;
pub use store::{DeletePolicy, PoolShard, PoolStore, TaskIndex};
pub use task::{TaskInstance, TaskInstanceId, TaskState};
pub use wait_queue::{WaitEntry, WaitQueue};
