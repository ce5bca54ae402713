//! In-memory pool store with one mutex per pool.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::core::{DeletePolicy, Pool, PoolError, PoolShard, PoolStore, TaskIndex, TaskInstanceId};

/// Pool store keeping every shard in memory.
///
/// The outer `RwLock` guards the set of pools and is only write-locked to
/// insert, rename or remove one. Each shard has its own `Mutex`, so
/// admissions against unrelated pools never contend. Task lookups go through
/// a shared [`TaskIndex`] and take no shard lock.
#[derive(Default)]
pub struct InMemoryPoolStore {
    shards: RwLock<BTreeMap<String, Arc<Mutex<PoolShard>>>>,
    index: TaskIndex,
}

impl InMemoryPoolStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl PoolStore for InMemoryPoolStore {
    fn insert_pool(&self, pool: Pool) -> Result<(), PoolError> {
        let mut shards = self.shards.write();
        if shards.contains_key(&pool.name) {
            return Err(PoolError::DuplicateName(pool.name));
        }
        let shard = PoolShard::with_index(pool, self.index.clone());
        shards.insert(shard.pool().name.clone(), Arc::new(Mutex::new(shard)));
        Ok(())
    }

    fn contains_pool(&self, name: &str) -> bool {
        self.shards.read().contains_key(name)
    }

    fn pool_names(&self) -> Vec<String> {
        self.shards.read().keys().cloned().collect()
    }

    fn with_pool<R, F>(&self, name: &str, f: F) -> Result<R, PoolError>
    where
        F: FnOnce(&mut PoolShard) -> R,
    {
        // The read guard stays held so the pool cannot be removed or renamed
        // underneath an in-flight critical section.
        let shards = self.shards.read();
        let shard = shards
            .get(name)
            .ok_or_else(|| PoolError::NotFound(name.to_string()))?;
        let mut guard = shard.lock();
        Ok(f(&mut *guard))
    }

    fn rename_pool(&self, from: &str, to: &str) -> Result<(), PoolError> {
        self.update_pool(from, Some(to), |_| ())
    }

    fn update_pool<R, F>(&self, name: &str, rename: Option<&str>, f: F) -> Result<R, PoolError>
    where
        F: FnOnce(&mut PoolShard) -> R,
    {
        let mut shards = self.shards.write();
        let shard = shards
            .get(name)
            .cloned()
            .ok_or_else(|| PoolError::NotFound(name.to_string()))?;
        if let Some(to) = rename.filter(|to| *to != name) {
            if shards.contains_key(to) {
                return Err(PoolError::DuplicateName(to.to_string()));
            }
            shards.remove(name);
            shard.lock().rename(to);
            shards.insert(to.to_string(), Arc::clone(&shard));
        }
        let mut guard = shard.lock();
        Ok(f(&mut *guard))
    }

    fn remove_pool(&self, name: &str, policy: &DeletePolicy) -> Result<Pool, PoolError> {
        let mut shards = self.shards.write();
        let shard = shards
            .get(name)
            .cloned()
            .ok_or_else(|| PoolError::NotFound(name.to_string()))?;
        let mut source = shard.lock();

        match policy {
            DeletePolicy::Reject => {
                let live = source.live_tasks();
                if live > 0 {
                    return Err(PoolError::InUse {
                        pool: name.to_string(),
                        tasks: live,
                    });
                }
            }
            DeletePolicy::Reassign(target) => {
                if target == name {
                    return Err(PoolError::NotFound(target.clone()));
                }
                let target_shard = shards
                    .get(target)
                    .ok_or_else(|| PoolError::NotFound(target.clone()))?;
                let (live, parked) = source.take_live();
                tracing::info!(
                    "reassigning {} task instance(s) from pool {} to {}",
                    live.len(),
                    name,
                    target
                );
                target_shard.lock().adopt(live, parked);
            }
        }

        let removed = source.pool().clone();
        source.discard();
        drop(source);
        shards.remove(name);
        Ok(removed)
    }

    fn locate_task(&self, id: TaskInstanceId) -> Option<String> {
        self.index.locate(id)
    }
}
