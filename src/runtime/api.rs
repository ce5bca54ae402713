//! API-facing request/response models and their mapping to core types.
//!
//! Mapping is explicit and pure: nothing here reads or writes a store.

use serde::{Deserialize, Serialize};

use crate::core::{OpenSlots, Pool, PoolCollection, PoolEntry, PoolError, PoolUpdate};

/// Read model of one pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolView {
    /// Pool name.
    pub name: String,
    /// Capacity; `-1` is unbounded.
    pub slots: i64,
    /// Slots counted against capacity.
    pub occupied_slots: u64,
    /// Slots held by running instances.
    pub running_slots: u64,
    /// Slots held by queued instances.
    pub queued_slots: u64,
    /// Slots held by scheduled instances.
    pub scheduled_slots: u64,
    /// Slots of deferred instances.
    pub deferred_slots: u64,
    /// Capacity still available, or `"unbounded"`.
    pub open_slots: OpenSlots,
    /// Free-text description.
    pub description: Option<String>,
    /// Whether deferred instances occupy slots.
    pub include_deferred: bool,
}

/// Read model of all pools.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolCollectionView {
    /// Pools in name order.
    pub pools: Vec<PoolView>,
    /// Number of pools.
    pub total_entries: usize,
}

/// Pool creation body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolBody {
    /// Pool name.
    pub name: String,
    /// Capacity; `-1` is unbounded.
    pub slots: i64,
    /// Free-text description.
    #[serde(default)]
    pub description: Option<String>,
    /// Whether deferred instances occupy slots.
    #[serde(default)]
    pub include_deferred: bool,
}

impl PoolBody {
    /// Validate into a plain pool record. Nothing is persisted.
    pub fn into_pool(self) -> Result<Pool, PoolError> {
        Pool::new(self.name, self.slots, self.include_deferred, self.description)
    }
}

/// Partial update body. Absent fields are left unchanged; an explicit
/// `"description": null` clears the description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolPatch {
    /// New name.
    #[serde(default)]
    pub name: Option<String>,
    /// New capacity.
    #[serde(default)]
    pub slots: Option<i64>,
    /// New description.
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    /// New deferred accounting policy.
    #[serde(default)]
    pub include_deferred: Option<bool>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

impl PoolPatch {
    /// Validate into a registry update.
    pub fn into_update(self) -> Result<PoolUpdate, PoolError> {
        let update = PoolUpdate {
            name: self.name,
            slots: self.slots,
            include_deferred: self.include_deferred,
            description: self.description,
        };
        update.validate()?;
        Ok(update)
    }
}

/// Map a snapshot entry to its read model.
pub fn pool_view(entry: &PoolEntry) -> PoolView {
    PoolView {
        name: entry.pool.name.clone(),
        slots: entry.pool.slots,
        occupied_slots: entry.stats.occupied,
        running_slots: entry.stats.running,
        queued_slots: entry.stats.queued,
        scheduled_slots: entry.stats.scheduled,
        deferred_slots: entry.stats.deferred,
        open_slots: entry.stats.open,
        description: entry.pool.description.clone(),
        include_deferred: entry.pool.include_deferred,
    }
}

/// Map a snapshot to its read model.
pub fn collection_view(collection: &PoolCollection) -> PoolCollectionView {
    PoolCollectionView {
        pools: collection.pools.iter().map(pool_view).collect(),
        total_entries: collection.total_entries,
    }
}
