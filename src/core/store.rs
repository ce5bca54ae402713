//! Persistence seam for pools and their task-instance associations.
//!
//! Each pool is its own lock domain: a [`PoolShard`] holds the pool record,
//! the task instances claiming it and its wait list, and every read-modify-
//! write of admission runs inside one [`PoolStore::with_pool`] call.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::core::{
    classify, Pool, PoolError, SlotStats, TaskInstance, TaskInstanceId, WaitEntry, WaitQueue,
};

/// What to do with live task instances when their pool is deleted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DeletePolicy {
    /// Refuse to delete while any live instance is associated.
    #[default]
    Reject,
    /// Move every live instance, parked ones included, to the named pool.
    Reassign(String),
}

/// Task instance to pool index shared by every shard of one store.
///
/// Shards update it while holding their own lock; readers never take a
/// shard lock to resolve a task.
#[derive(Debug, Clone, Default)]
pub struct TaskIndex {
    inner: Arc<RwLock<HashMap<TaskInstanceId, String>>>,
}

impl TaskIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pool the task instance is associated with.
    pub fn locate(&self, id: TaskInstanceId) -> Option<String> {
        self.inner.read().get(&id).cloned()
    }

    /// Number of indexed task instances.
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Whether nothing is indexed.
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    fn bind(&self, id: TaskInstanceId, pool: &str) {
        self.inner.write().insert(id, pool.to_string());
    }

    /// Bind `id` to `pool` unless another pool owns it; returns the owner.
    fn reserve(&self, id: TaskInstanceId, pool: &str) -> Result<(), String> {
        let mut index = self.inner.write();
        match index.get(&id) {
            Some(owner) if owner != pool => Err(owner.clone()),
            _ => {
                index.insert(id, pool.to_string());
                Ok(())
            }
        }
    }

    fn unbind(&self, id: TaskInstanceId, pool: &str) {
        let mut index = self.inner.write();
        if index.get(&id).is_some_and(|owner| owner == pool) {
            index.remove(&id);
        }
    }
}

/// A pool record together with everything that claims it.
#[derive(Debug)]
pub struct PoolShard {
    pool: Pool,
    tasks: BTreeMap<TaskInstanceId, TaskInstance>,
    waiting: WaitQueue,
    drain_ceiling: Option<u64>,
    index: TaskIndex,
}

impl PoolShard {
    /// Create an empty shard for `pool` with a private task index.
    pub fn new(pool: Pool) -> Self {
        Self::with_index(pool, TaskIndex::new())
    }

    /// Create an empty shard for `pool` registering its tasks in `index`.
    pub fn with_index(pool: Pool, index: TaskIndex) -> Self {
        Self {
            pool,
            tasks: BTreeMap::new(),
            waiting: WaitQueue::new(),
            drain_ceiling: None,
            index,
        }
    }

    /// The pool record.
    pub const fn pool(&self) -> &Pool {
        &self.pool
    }

    pub(crate) fn pool_mut(&mut self) -> &mut Pool {
        &mut self.pool
    }

    /// Task instances associated with the pool, ordered by id.
    pub fn tasks(&self) -> impl Iterator<Item = &TaskInstance> {
        self.tasks.values()
    }

    /// Look up one associated task instance.
    pub fn task(&self, id: TaskInstanceId) -> Option<&TaskInstance> {
        self.tasks.get(&id)
    }

    pub(crate) fn task_mut(&mut self, id: TaskInstanceId) -> Option<&mut TaskInstance> {
        self.tasks.get_mut(&id)
    }

    /// Record an association written by the task-instance layer.
    ///
    /// This bypasses admission; occupancy it adds beyond capacity is exactly
    /// what [`PoolShard::check`] reports as over-admission.
    pub fn insert_task(&mut self, mut task: TaskInstance) -> Option<TaskInstance> {
        task.pool.clone_from(&self.pool.name);
        self.index.bind(task.id, &self.pool.name);
        self.tasks.insert(task.id, task)
    }

    /// Associate a new task instance, failing with `AlreadyAssociated` when
    /// another pool already holds it.
    pub fn try_insert_task(&mut self, mut task: TaskInstance) -> Result<(), PoolError> {
        self.index
            .reserve(task.id, &self.pool.name)
            .map_err(|pool| PoolError::AlreadyAssociated { id: task.id, pool })?;
        task.pool.clone_from(&self.pool.name);
        self.tasks.insert(task.id, task);
        Ok(())
    }

    /// Drop an association, unparking the instance if it was waiting.
    pub fn remove_task(&mut self, id: TaskInstanceId) -> Option<TaskInstance> {
        self.waiting.remove(id);
        let removed = self.tasks.remove(&id);
        if removed.is_some() {
            self.index.unbind(id, &self.pool.name);
        }
        self.settle();
        removed
    }

    /// Parked task instances.
    pub const fn waiting(&self) -> &WaitQueue {
        &self.waiting
    }

    pub(crate) fn waiting_mut(&mut self) -> &mut WaitQueue {
        &mut self.waiting
    }

    /// Number of associated instances that are parked or hold a slot state.
    pub fn live_tasks(&self) -> usize {
        self.tasks.values().filter(|t| t.state.is_live()).count()
    }

    /// Derived counts under the pool's current policy.
    pub fn stats(&self) -> SlotStats {
        classify(&self.pool, self.tasks.values())
    }

    /// Occupancy tolerated above capacity while the pool drains, if any.
    pub const fn drain_ceiling(&self) -> Option<u64> {
        self.drain_ceiling
    }

    /// Derived counts, or `OverAdmission` when occupancy exceeds both the
    /// capacity and the drain ceiling.
    pub fn check(&self) -> Result<SlotStats, PoolError> {
        let stats = self.stats();
        if stats.is_over_capacity(&self.pool) {
            let tolerated = self.drain_ceiling.unwrap_or(0);
            if stats.occupied > tolerated {
                return Err(PoolError::OverAdmission {
                    pool: self.pool.name.clone(),
                    occupied: stats.occupied,
                    slots: self.pool.slots,
                });
            }
        }
        Ok(stats)
    }

    /// Accept the current occupancy as a drain ceiling. Used after changes
    /// that legitimately shrink capacity below what is already held.
    pub(crate) fn open_drain_window(&mut self) {
        let stats = self.stats();
        if stats.is_over_capacity(&self.pool) {
            let ceiling = self.drain_ceiling.map_or(stats.occupied, |c| c.max(stats.occupied));
            tracing::warn!(
                "pool {} draining: {} occupied of {} slots",
                self.pool.name,
                stats.occupied,
                self.pool.slots
            );
            self.drain_ceiling = Some(ceiling);
        } else {
            self.drain_ceiling = None;
        }
    }

    /// Lower the drain ceiling as instances leave; clear it once back
    /// within capacity.
    pub(crate) fn settle(&mut self) {
        let Some(ceiling) = self.drain_ceiling else {
            return;
        };
        let stats = self.stats();
        if stats.is_over_capacity(&self.pool) {
            self.drain_ceiling = Some(ceiling.min(stats.occupied));
        } else {
            tracing::debug!("pool {} drained back within capacity", self.pool.name);
            self.drain_ceiling = None;
        }
    }

    pub(crate) fn rename(&mut self, name: &str) {
        self.pool.name = name.to_string();
        for task in self.tasks.values_mut() {
            task.pool = name.to_string();
            self.index.bind(task.id, name);
        }
    }

    /// Drop every remaining association of a pool being removed.
    pub(crate) fn discard(&mut self) {
        self.waiting.drain_ordered();
        for id in self.tasks.keys() {
            self.index.unbind(*id, &self.pool.name);
        }
        self.tasks.clear();
    }

    /// Split off every live instance and the wait list, in admission order.
    pub(crate) fn take_live(&mut self) -> (Vec<TaskInstance>, Vec<WaitEntry>) {
        let parked = self.waiting.drain_ordered();
        let ids: Vec<_> = self
            .tasks
            .values()
            .filter(|t| t.state.is_live())
            .map(|t| t.id)
            .collect();
        let live = ids
            .iter()
            .filter_map(|id| {
                self.index.unbind(*id, &self.pool.name);
                self.tasks.remove(id)
            })
            .collect();
        (live, parked)
    }

    /// Adopt instances moved from a deleted pool.
    pub(crate) fn adopt(&mut self, tasks: Vec<TaskInstance>, parked: Vec<WaitEntry>) {
        for task in tasks {
            self.insert_task(task);
        }
        for entry in parked {
            self.waiting.push(entry.id, entry.priority_weight, entry.target);
        }
        self.open_drain_window();
    }
}

/// Storage backend for pools and task-instance associations.
///
/// Implementations must serialize all `with_pool` calls for the same pool and
/// must not hold any other pool's lock while `f` runs.
pub trait PoolStore: Send + Sync {
    /// Insert a new pool; fails with `DuplicateName` if the name is taken.
    fn insert_pool(&self, pool: Pool) -> Result<(), PoolError>;

    /// Whether a pool with this name exists.
    fn contains_pool(&self, name: &str) -> bool;

    /// Names of all pools in lexicographic order.
    fn pool_names(&self) -> Vec<String>;

    /// Run `f` inside the critical section of pool `name`.
    fn with_pool<R, F>(&self, name: &str, f: F) -> Result<R, PoolError>
    where
        F: FnOnce(&mut PoolShard) -> R;

    /// Rename a pool, carrying its task associations along.
    fn rename_pool(&self, from: &str, to: &str) -> Result<(), PoolError>;

    /// Optionally rename pool `name` to `rename`, then run `f` on it, as one
    /// step that no other pool-set change can interleave with.
    fn update_pool<R, F>(&self, name: &str, rename: Option<&str>, f: F) -> Result<R, PoolError>
    where
        F: FnOnce(&mut PoolShard) -> R;

    /// Remove a pool according to `policy`, returning the removed record.
    fn remove_pool(&self, name: &str, policy: &DeletePolicy) -> Result<Pool, PoolError>;

    /// Name of the pool a task instance is associated with. Must not take
    /// any pool's lock.
    fn locate_task(&self, id: TaskInstanceId) -> Option<String>;
}
