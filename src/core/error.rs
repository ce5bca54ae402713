//! Error types for pool registry and admission operations.

use thiserror::Error;

use crate::core::TaskInstanceId;

/// Errors produced by pool accounting components.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    /// A pool with this name already exists.
    #[error("pool `{0}` already exists")]
    DuplicateName(String),
    /// Pool names must be non-empty.
    #[error("invalid pool name: {0:?}")]
    InvalidName(String),
    /// Slot count below the unbounded sentinel.
    #[error("invalid slot count {0}: must be >= -1")]
    InvalidSlots(i64),
    /// No pool with this name exists.
    #[error("pool `{0}` not found")]
    NotFound(String),
    /// The pool still has live task instances associated with it.
    #[error("pool `{pool}` is in use by {tasks} task instance(s)")]
    InUse {
        /// Pool name.
        pool: String,
        /// Number of live task instances still associated.
        tasks: usize,
    },
    /// The default pool cannot be deleted or renamed.
    #[error("default pool `{0}` cannot be deleted or renamed")]
    DefaultPoolProtected(String),
    /// Occupancy exceeds capacity outside of a drain window.
    #[error("over-admission in pool `{pool}`: {occupied} occupied of {slots} slots")]
    OverAdmission {
        /// Pool name.
        pool: String,
        /// Occupied slots at detection time.
        occupied: u64,
        /// Configured slots.
        slots: i64,
    },
    /// No task instance with this id is associated with any pool.
    #[error("task instance {0} not found")]
    TaskNotFound(TaskInstanceId),
    /// Task instances must occupy at least one slot.
    #[error("task instance {0} must occupy at least one slot")]
    InvalidTaskSlots(TaskInstanceId),
    /// Task needs more slots than the pool can ever provide.
    #[error("capacity exceeded: task needs {requested} slot(s), pool `{pool}` has {slots}")]
    CapacityExceeded {
        /// Pool name.
        pool: String,
        /// Slots requested by the task instance.
        requested: u32,
        /// Total slots of the pool.
        slots: i64,
    },
    /// The requested state change is not allowed.
    #[error("invalid transition for task instance {id}: {reason}")]
    InvalidTransition {
        /// Task instance id.
        id: TaskInstanceId,
        /// Why the transition was refused.
        reason: String,
    },
    /// The task instance is already associated with another pool.
    #[error("task instance {id} is already associated with pool `{pool}`")]
    AlreadyAssociated {
        /// Task instance id.
        id: TaskInstanceId,
        /// Pool currently holding the association.
        pool: String,
    },
    /// Configuration failed to load or validate.
    #[error("config error: {0}")]
    Config(String),
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
