//! Admission control: grants pool slots to task instances.
//!
//! Every decision re-classifies the pool inside the store's per-pool critical
//! section, so two callers racing for the last open slot cannot both win.
//! Instances refused a slot are parked on the pool's wait list in the
//! `Pending` state and are woken, highest priority first, as slots free up.
//! A newcomer never overtakes a parked instance of equal or higher priority.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::audit::record_to;
use crate::core::{
    share_audit_sink, AuditSink, PoolError, PoolShard, PoolStore, SharedAuditSink, SlotStats,
    TaskInstance, TaskInstanceId, TaskState,
};

/// Result of asking for a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Admission {
    /// The requested state was entered.
    Admitted,
    /// No slot was open; the instance waits on the pool's wait list.
    Queued,
}

/// Result of a state transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionOutcome {
    /// Pool the instance is associated with.
    pub pool: String,
    /// Whether the new state was entered or the instance was parked.
    pub admission: Admission,
    /// Parked instances that received a slot as a consequence.
    pub woken: Vec<TaskInstanceId>,
    /// Parked instances failed because they no longer fit the pool at all.
    pub evicted: Vec<TaskInstanceId>,
}

/// Parked instances affected by one pass over a wait list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Drained {
    pub woken: Vec<TaskInstanceId>,
    pub evicted: Vec<TaskInstanceId>,
}

impl Drained {
    /// Log and audit the outcome of a drain in `pool`.
    pub(crate) fn report(&self, pool: &str, audit: Option<&SharedAuditSink>) {
        for id in &self.woken {
            tracing::info!("woke task {} in pool {}", id, pool);
            record_to(audit, id.to_string(), pool, "wake", None);
        }
        for id in &self.evicted {
            tracing::warn!("task {} no longer fits pool {}, failed", id, pool);
            record_to(
                audit,
                id.to_string(),
                pool,
                "evict",
                Some("capacity exceeded".into()),
            );
        }
    }
}

/// Grants and releases pool slots on behalf of scheduler workers.
pub struct AdmissionController<S> {
    store: Arc<S>,
    default_pool: Option<String>,
    audit: Option<SharedAuditSink>,
}

impl<S> Clone for AdmissionController<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            default_pool: self.default_pool.clone(),
            audit: self.audit.clone(),
        }
    }
}

impl<S: PoolStore> AdmissionController<S> {
    /// Create a controller over a shared store.
    pub const fn new(store: Arc<S>) -> Self {
        Self {
            store,
            default_pool: None,
            audit: None,
        }
    }

    /// Pool used by [`Self::try_admit_or_default`] when the requested pool
    /// does not exist.
    #[must_use]
    pub fn with_default_pool(mut self, name: impl Into<String>) -> Self {
        self.default_pool = Some(name.into());
        self
    }

    /// Attach an audit sink.
    #[must_use]
    pub fn with_audit(self, audit: Box<dyn AuditSink>) -> Self {
        self.with_shared_audit(share_audit_sink(audit))
    }

    /// Attach an audit sink shared with other components.
    #[must_use]
    pub fn with_shared_audit(mut self, audit: SharedAuditSink) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Configured fallback pool.
    pub fn default_pool(&self) -> Option<&str> {
        self.default_pool.as_deref()
    }

    /// Ask for a slot in `pool` and, if granted, move the instance to
    /// `Running`.
    pub fn try_admit(&self, task: TaskInstance, pool: &str) -> Result<Admission, PoolError> {
        self.try_claim(task, pool, TaskState::Running)
    }

    /// Ask for a slot in `pool` and, if granted, move the instance to
    /// `target`, which must be one of the slot-holding states.
    ///
    /// An instance already associated with the pool is transitioned in place;
    /// one associated with another pool is refused with `AlreadyAssociated`.
    pub fn try_claim(
        &self,
        task: TaskInstance,
        pool: &str,
        target: TaskState,
    ) -> Result<Admission, PoolError> {
        if !matches!(
            target,
            TaskState::Scheduled | TaskState::Queued | TaskState::Running
        ) {
            return Err(PoolError::InvalidTransition {
                id: task.id,
                reason: format!("{target:?} is not a slot-claiming state"),
            });
        }
        let id = task.id;
        let (admission, drained) = self
            .store
            .with_pool(pool, |shard| claim(shard, task, target))??;
        self.record_admission(id, pool, admission);
        drained.report(pool, self.audit.as_ref());
        Ok(admission)
    }

    /// Like [`Self::try_admit`], but a missing pool resolves to the default
    /// pool. Returns the pool actually used.
    pub fn try_admit_or_default(
        &self,
        task: TaskInstance,
        pool: &str,
    ) -> Result<(String, Admission), PoolError> {
        let resolved = match self.default_pool.as_deref() {
            Some(default) if !self.store.contains_pool(pool) => {
                tracing::warn!(
                    "pool {} not found for task {}, falling back to {}",
                    pool,
                    task.id,
                    default
                );
                default.to_string()
            }
            _ => pool.to_string(),
        };
        let admission = self.try_admit(task, &resolved)?;
        Ok((resolved, admission))
    }

    /// Move an associated instance to `to`.
    ///
    /// Entering a slot-holding state from one that holds none is an admission
    /// and may park the instance. Leaving a slot wakes parked instances.
    pub fn transition(
        &self,
        id: TaskInstanceId,
        to: TaskState,
    ) -> Result<TransitionOutcome, PoolError> {
        let pool = self
            .store
            .locate_task(id)
            .ok_or(PoolError::TaskNotFound(id))?;
        let (admission, drained) = self.store.with_pool(&pool, |shard| enter(shard, id, to))??;
        if admission == Admission::Queued {
            self.record_admission(id, &pool, admission);
        } else if to.is_live() {
            tracing::info!("task {} entered {:?} in pool {}", id, to, pool);
            self.record(id, &pool, "transition", Some(format!("{to:?}")));
        } else {
            self.record(id, &pool, "release", Some(format!("{to:?}")));
            tracing::debug!("task {} released from pool {} as {:?}", id, pool, to);
        }
        drained.report(&pool, self.audit.as_ref());
        Ok(TransitionOutcome {
            pool,
            admission,
            woken: drained.woken,
            evicted: drained.evicted,
        })
    }

    /// Finish an instance in a terminal state, freeing its slot.
    pub fn release(
        &self,
        id: TaskInstanceId,
        outcome: TaskState,
    ) -> Result<Vec<TaskInstanceId>, PoolError> {
        if outcome.is_live() {
            return Err(PoolError::InvalidTransition {
                id,
                reason: format!("{outcome:?} is not a terminal state"),
            });
        }
        Ok(self.transition(id, outcome)?.woken)
    }

    /// Cancel an instance, parked or not. It stops counting immediately.
    pub fn cancel(&self, id: TaskInstanceId) -> Result<Vec<TaskInstanceId>, PoolError> {
        self.release(id, TaskState::Cancelled)
    }

    /// Suspend an instance on a trigger.
    pub fn defer(&self, id: TaskInstanceId) -> Result<Vec<TaskInstanceId>, PoolError> {
        Ok(self.transition(id, TaskState::Deferred)?.woken)
    }

    /// Bring a deferred instance back to `Running`. When the pool does not
    /// count deferred instances this needs a fresh slot.
    pub fn resume(&self, id: TaskInstanceId) -> Result<Admission, PoolError> {
        Ok(self.transition(id, TaskState::Running)?.admission)
    }

    /// Drop a finished instance's association.
    pub fn forget(&self, id: TaskInstanceId) -> Result<TaskInstance, PoolError> {
        let pool = self
            .store
            .locate_task(id)
            .ok_or(PoolError::TaskNotFound(id))?;
        self.store.with_pool(&pool, |shard| {
            match shard.task(id).map(|t| t.state) {
                None => Err(PoolError::TaskNotFound(id)),
                Some(state) if state.is_live() => Err(PoolError::InvalidTransition {
                    id,
                    reason: format!("cannot forget a task in state {state:?}"),
                }),
                Some(_) => shard.remove_task(id).ok_or(PoolError::TaskNotFound(id)),
            }
        })?
    }

    /// Run the over-admission check for one pool.
    pub fn verify(&self, pool: &str) -> Result<SlotStats, PoolError> {
        self.store.with_pool(pool, |shard| shard.check())?
    }

    fn record_admission(&self, id: TaskInstanceId, pool: &str, admission: Admission) {
        match admission {
            Admission::Admitted => {
                tracing::info!("task {} admitted to pool {}", id, pool);
                self.record(id, pool, "admit", None);
            }
            Admission::Queued => {
                tracing::debug!("task {} queued for pool {}", id, pool);
                self.record(id, pool, "queue", None);
            }
        }
    }

    fn record(&self, id: TaskInstanceId, pool: &str, action: &str, payload: Option<String>) {
        record_to(self.audit.as_ref(), id.to_string(), pool, action, payload);
    }
}

fn claim(
    shard: &mut PoolShard,
    mut task: TaskInstance,
    target: TaskState,
) -> Result<(Admission, Drained), PoolError> {
    let id = task.id;
    let inserted = shard.task(id).is_none();
    if inserted {
        if task.pool_slots == 0 {
            return Err(PoolError::InvalidTaskSlots(id));
        }
        ensure_fits_capacity(shard, task.pool_slots)?;
        // The controller, not the caller, decides whether a slot is held.
        task.state = TaskState::Pending;
        shard.try_insert_task(task)?;
    }
    let outcome = enter(shard, id, target);
    if outcome.is_err() && inserted {
        shard.remove_task(id);
    }
    outcome
}

fn fits_capacity(shard: &PoolShard, pool_slots: u32) -> bool {
    shard
        .pool()
        .capacity()
        .is_none_or(|capacity| u64::from(pool_slots) <= capacity)
}

fn ensure_fits_capacity(shard: &PoolShard, pool_slots: u32) -> Result<(), PoolError> {
    if fits_capacity(shard, pool_slots) {
        return Ok(());
    }
    let pool = shard.pool();
    Err(PoolError::CapacityExceeded {
        pool: pool.name.clone(),
        requested: pool_slots,
        slots: pool.slots,
    })
}

/// Apply a state change inside the pool's critical section.
fn enter(
    shard: &mut PoolShard,
    id: TaskInstanceId,
    to: TaskState,
) -> Result<(Admission, Drained), PoolError> {
    if to == TaskState::Pending {
        return Err(PoolError::InvalidTransition {
            id,
            reason: "Pending is entered only by a refused admission".into(),
        });
    }
    let include_deferred = shard.pool().include_deferred;
    let (from, pool_slots, priority_weight) = shard
        .task(id)
        .map(|t| (t.state, t.pool_slots, t.priority_weight))
        .ok_or(PoolError::TaskNotFound(id))?;
    let held = from.occupies(include_deferred);
    let wants = to.occupies(include_deferred);

    if wants && !held {
        let stats = shard.check().inspect_err(|e| tracing::error!("{}", e))?;
        ensure_fits_capacity(shard, pool_slots)?;
        let behind_head = shard
            .waiting()
            .peek()
            .is_some_and(|head| head.id != id && head.priority_weight >= priority_weight);
        if !behind_head && stats.open.fits(u64::from(pool_slots)) {
            set_state(shard, id, to);
            shard.waiting_mut().remove(id);
            return Ok((Admission::Admitted, Drained::default()));
        }
        set_state(shard, id, TaskState::Pending);
        shard.waiting_mut().push(id, priority_weight, to);
        return Ok((Admission::Queued, Drained::default()));
    }

    set_state(shard, id, to);
    let was_parked = shard.waiting_mut().remove(id).is_some();
    // A parked head leaving may unblock the instances behind it.
    let drained = if (held && !wants) || was_parked {
        drain_wait_queue(shard)
    } else {
        Drained::default()
    };
    shard.settle();
    Ok((Admission::Admitted, drained))
}

/// Grant slots to parked instances, highest priority first, until the head
/// of the wait list no longer fits. Parked instances wider than the whole
/// pool are failed instead of blocking the rest.
pub(crate) fn drain_wait_queue(shard: &mut PoolShard) -> Drained {
    let mut drained = Drained::default();
    while let Some(entry) = shard.waiting().peek().cloned() {
        let parked = shard
            .task(entry.id)
            .filter(|t| t.state == TaskState::Pending)
            .map(|t| t.pool_slots);
        let Some(pool_slots) = parked else {
            shard.waiting_mut().pop();
            continue;
        };
        if !fits_capacity(shard, pool_slots) {
            shard.waiting_mut().pop();
            set_state(shard, entry.id, TaskState::Failed);
            drained.evicted.push(entry.id);
            continue;
        }
        let Ok(stats) = shard.check() else {
            break;
        };
        if !stats.open.fits(u64::from(pool_slots)) {
            break;
        }
        shard.waiting_mut().pop();
        set_state(shard, entry.id, entry.target);
        drained.woken.push(entry.id);
    }
    shard.settle();
    drained
}

fn set_state(shard: &mut PoolShard, id: TaskInstanceId, state: TaskState) {
    if let Some(task) = shard.task_mut(id) {
        task.state = state;
    }
}
