//! Slot classification: derives per-state counts for a pool.
//!
//! `classify` is the single counting rule shared by admission and reporting.
//! It is a pure function over a snapshot of task instances, so repeated calls
//! over the same snapshot always agree.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::core::{Pool, TaskInstance, TaskState};

/// Open capacity of a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpenSlots {
    /// Remaining slots of a bounded pool, clamped at zero.
    Finite(u64),
    /// The pool has no capacity limit.
    Unbounded,
}

impl OpenSlots {
    /// Whether `slots` more slots can be taken.
    pub const fn fits(self, slots: u64) -> bool {
        match self {
            Self::Finite(open) => slots <= open,
            Self::Unbounded => true,
        }
    }

    /// Finite count, `None` when unbounded.
    pub const fn finite(self) -> Option<u64> {
        match self {
            Self::Finite(open) => Some(open),
            Self::Unbounded => None,
        }
    }
}

impl fmt::Display for OpenSlots {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Finite(open) => write!(f, "{open}"),
            Self::Unbounded => f.write_str("unbounded"),
        }
    }
}

impl Serialize for OpenSlots {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Finite(open) => serializer.serialize_u64(*open),
            Self::Unbounded => serializer.serialize_str("unbounded"),
        }
    }
}

impl<'de> Deserialize<'de> for OpenSlots {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Count(u64),
            Marker(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Count(open) => Ok(Self::Finite(open)),
            Raw::Marker(marker) if marker == "unbounded" => Ok(Self::Unbounded),
            Raw::Marker(other) => Err(serde::de::Error::custom(format!(
                "expected slot count or \"unbounded\", got {other:?}"
            ))),
        }
    }
}

/// Derived slot counts of one pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotStats {
    /// Slots held by running instances.
    pub running: u64,
    /// Slots held by queued instances.
    pub queued: u64,
    /// Slots held by scheduled instances.
    pub scheduled: u64,
    /// Slots of deferred instances, whether or not they count as occupied.
    pub deferred: u64,
    /// Slots counted against capacity.
    pub occupied: u64,
    /// Capacity still available.
    pub open: OpenSlots,
}

impl SlotStats {
    /// Whether occupancy is above the pool's capacity.
    pub const fn is_over_capacity(&self, pool: &Pool) -> bool {
        pool.slots >= 0 && self.occupied > pool.slots.unsigned_abs()
    }
}

/// Classify the task instances claiming `pool` into slot counts.
///
/// Instances whose `pool` field names a different pool are ignored. Each
/// instance contributes its `pool_slots` weight to exactly one state bucket.
pub fn classify<'a, I>(pool: &Pool, tasks: I) -> SlotStats
where
    I: IntoIterator<Item = &'a TaskInstance>,
{
    let mut running = 0u64;
    let mut queued = 0u64;
    let mut scheduled = 0u64;
    let mut deferred = 0u64;

    for task in tasks.into_iter().filter(|t| t.pool == pool.name) {
        let weight = u64::from(task.pool_slots);
        match task.state {
            TaskState::Running => running += weight,
            TaskState::Queued => queued += weight,
            TaskState::Scheduled => scheduled += weight,
            TaskState::Deferred => deferred += weight,
            _ => {}
        }
    }

    let occupied = running + queued + scheduled + if pool.include_deferred { deferred } else { 0 };
    let open = pool
        .capacity()
        .map_or(OpenSlots::Unbounded, |slots| {
            OpenSlots::Finite(slots.saturating_sub(occupied))
        });

    SlotStats {
        running,
        queued,
        scheduled,
        deferred,
        occupied,
        open,
    }
}
