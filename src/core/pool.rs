//! Pool entity: a named capacity unit.

use serde::{Deserialize, Serialize};

use crate::core::PoolError;

/// Slot count sentinel for a pool without a capacity limit.
pub const UNBOUNDED_SLOTS: i64 = -1;

/// Name of the pool used when none is configured explicitly.
pub const DEFAULT_POOL_NAME: &str = "default_pool";

/// Slot count of the bootstrap default pool.
pub const DEFAULT_POOL_SLOTS: i64 = 128;

/// A named pool of execution slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    /// Unique pool name.
    pub name: String,
    /// Capacity in slots; `-1` is unbounded.
    pub slots: i64,
    /// Whether deferred task instances occupy slots.
    pub include_deferred: bool,
    /// Free-text description.
    pub description: Option<String>,
}

impl Pool {
    /// Build a pool after validating its name and slot count.
    pub fn new(
        name: impl Into<String>,
        slots: i64,
        include_deferred: bool,
        description: Option<String>,
    ) -> Result<Self, PoolError> {
        let pool = Self {
            name: name.into(),
            slots,
            include_deferred,
            description,
        };
        pool.validate()?;
        Ok(pool)
    }

    /// Check the name and slot count invariants.
    pub fn validate(&self) -> Result<(), PoolError> {
        validate_name(&self.name)?;
        validate_slots(self.slots)
    }

    /// Whether the pool has no capacity limit.
    pub const fn is_unbounded(&self) -> bool {
        self.slots == UNBOUNDED_SLOTS
    }

    /// Capacity as an unsigned count, `None` when unbounded.
    pub fn capacity(&self) -> Option<u64> {
        u64::try_from(self.slots).ok()
    }
}

/// Partial update applied by the registry. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolUpdate {
    /// New name; renames preserve task associations.
    pub name: Option<String>,
    /// New slot count.
    pub slots: Option<i64>,
    /// New deferred accounting policy.
    pub include_deferred: Option<bool>,
    /// New description; `Some(None)` clears it.
    pub description: Option<Option<String>>,
}

impl PoolUpdate {
    /// Update that only changes the slot count.
    pub fn slots(slots: i64) -> Self {
        Self {
            slots: Some(slots),
            ..Self::default()
        }
    }

    /// Update that only changes the deferred accounting policy.
    pub fn include_deferred(include_deferred: bool) -> Self {
        Self {
            include_deferred: Some(include_deferred),
            ..Self::default()
        }
    }

    /// Update that only renames the pool.
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Validate the fields that are set.
    pub fn validate(&self) -> Result<(), PoolError> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(slots) = self.slots {
            validate_slots(slots)?;
        }
        Ok(())
    }

    /// Apply the non-name fields to a pool record.
    pub(crate) fn apply_fields(&self, pool: &mut Pool) {
        if let Some(slots) = self.slots {
            pool.slots = slots;
        }
        if let Some(include_deferred) = self.include_deferred {
            pool.include_deferred = include_deferred;
        }
        if let Some(description) = &self.description {
            pool.description.clone_from(description);
        }
    }
}

fn validate_name(name: &str) -> Result<(), PoolError> {
    if name.trim().is_empty() {
        return Err(PoolError::InvalidName(name.to_string()));
    }
    Ok(())
}

fn validate_slots(slots: i64) -> Result<(), PoolError> {
    if slots < UNBOUNDED_SLOTS {
        return Err(PoolError::InvalidSlots(slots));
    }
    Ok(())
}
