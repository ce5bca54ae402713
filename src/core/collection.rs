//! Collection view: every pool with its derived counts.

use std::sync::Arc;

use crate::core::{classify, Pool, PoolError, PoolStore, SlotStats, TaskInstance};

/// One pool and its derived counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolEntry {
    /// Pool record.
    pub pool: Pool,
    /// Derived counts at snapshot time.
    pub stats: SlotStats,
}

/// All pools with their counts, in name order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolCollection {
    /// Entries in name order.
    pub pools: Vec<PoolEntry>,
    /// Number of entries.
    pub total_entries: usize,
}

impl PoolCollection {
    /// Build a collection from an injected snapshot of pools and task
    /// instances, without any store.
    pub fn from_pools<I>(pools: I, tasks: &[TaskInstance]) -> Self
    where
        I: IntoIterator<Item = Pool>,
    {
        let mut pools: Vec<Pool> = pools.into_iter().collect();
        pools.sort_by(|a, b| a.name.cmp(&b.name));
        Self::from_entries(
            pools
                .into_iter()
                .map(|pool| {
                    let stats = classify(&pool, tasks);
                    PoolEntry { pool, stats }
                })
                .collect(),
        )
    }

    fn from_entries(pools: Vec<PoolEntry>) -> Self {
        let total_entries = pools.len();
        Self {
            pools,
            total_entries,
        }
    }

    /// Entry for one pool.
    pub fn get(&self, name: &str) -> Option<&PoolEntry> {
        self.pools.iter().find(|e| e.pool.name == name)
    }
}

/// Read-only view over a store, sharing the admission counting rule.
pub struct CollectionView<S> {
    store: Arc<S>,
}

impl<S> Clone for CollectionView<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: PoolStore> CollectionView<S> {
    /// Create a view over a shared store.
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Snapshot every pool. Each pool is read inside its own critical
    /// section; pools deleted mid-snapshot are left out.
    pub fn snapshot(&self) -> PoolCollection {
        let entries = self
            .store
            .pool_names()
            .iter()
            .filter_map(|name| {
                self.store
                    .with_pool(name, |shard| PoolEntry {
                        pool: shard.pool().clone(),
                        stats: shard.stats(),
                    })
                    .ok()
            })
            .collect();
        PoolCollection::from_entries(entries)
    }

    /// Snapshot one pool.
    pub fn entry(&self, name: &str) -> Result<PoolEntry, PoolError> {
        self.store.with_pool(name, |shard| PoolEntry {
            pool: shard.pool().clone(),
            stats: shard.stats(),
        })
    }

    /// Run the over-admission check on every pool and return the failures.
    pub fn check_invariants(&self) -> Vec<PoolError> {
        self.store
            .pool_names()
            .iter()
            .filter_map(|name| match self.store.with_pool(name, |shard| shard.check()) {
                Ok(Err(violation)) => Some(violation),
                _ => None,
            })
            .collect()
    }
}
