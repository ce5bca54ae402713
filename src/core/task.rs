//! Task-instance view consumed from the execution layer.

use serde::{Deserialize, Serialize};

/// Identifier of a task instance.
pub type TaskInstanceId = u64;

/// Lifecycle state of a task instance as seen by pool accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// Known to the pool and parked on its wait list. Never occupies a slot.
    Pending,
    /// Scheduled for execution.
    Scheduled,
    /// Handed to an executor.
    Queued,
    /// Executing.
    Running,
    /// Suspended waiting on a trigger.
    Deferred,
    /// Finished successfully.
    Success,
    /// Finished with a failure.
    Failed,
    /// Failed and waiting to be retried.
    UpForRetry,
    /// Skipped without running.
    Skipped,
    /// Cancelled externally.
    Cancelled,
}

impl TaskState {
    /// Whether the state holds a slot under the given deferred policy.
    pub const fn occupies(self, include_deferred: bool) -> bool {
        match self {
            Self::Scheduled | Self::Queued | Self::Running => true,
            Self::Deferred => include_deferred,
            _ => false,
        }
    }

    /// Whether the instance is still of interest to its pool (parked or in
    /// one of the slot-claiming states).
    pub const fn is_live(self) -> bool {
        matches!(
            self,
            Self::Pending | Self::Scheduled | Self::Queued | Self::Running | Self::Deferred
        )
    }
}

/// A task instance claiming a pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskInstance {
    /// Task instance id.
    pub id: TaskInstanceId,
    /// Name of the pool the instance claims.
    pub pool: String,
    /// Number of slots the instance occupies while holding its pool.
    pub pool_slots: u32,
    /// Wait-list ordering weight; higher is admitted first.
    pub priority_weight: i32,
    /// Current state.
    pub state: TaskState,
}

impl TaskInstance {
    /// A single-slot instance in the `Pending` state.
    pub fn new(id: TaskInstanceId, pool: impl Into<String>) -> Self {
        Self {
            id,
            pool: pool.into(),
            pool_slots: 1,
            priority_weight: 1,
            state: TaskState::Pending,
        }
    }

    /// Set the slot weight.
    #[must_use]
    pub const fn with_pool_slots(mut self, pool_slots: u32) -> Self {
        self.pool_slots = pool_slots;
        self
    }

    /// Set the wait-list priority.
    #[must_use]
    pub const fn with_priority(mut self, priority_weight: i32) -> Self {
        self.priority_weight = priority_weight;
        self
    }

    /// Set the current state.
    #[must_use]
    pub const fn with_state(mut self, state: TaskState) -> Self {
        self.state = state;
        self
    }
}
