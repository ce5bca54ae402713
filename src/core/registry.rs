//! Pool registry: create, read, update and delete named pools.

use std::sync::Arc;

use crate::core::admission::drain_wait_queue;
use crate::core::{
    DeletePolicy, Pool, PoolError, PoolStore, PoolUpdate, SharedAuditSink, DEFAULT_POOL_NAME,
};

/// CRUD surface over the pools of a store.
///
/// Names are unique and pools are listed in name order. The default pool can
/// be resized but never renamed or deleted.
pub struct PoolRegistry<S> {
    store: Arc<S>,
    default_pool: String,
    audit: Option<SharedAuditSink>,
}

impl<S> Clone for PoolRegistry<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            default_pool: self.default_pool.clone(),
            audit: self.audit.clone(),
        }
    }
}

impl<S: PoolStore> PoolRegistry<S> {
    /// Create a registry protecting [`DEFAULT_POOL_NAME`].
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            default_pool: DEFAULT_POOL_NAME.to_string(),
            audit: None,
        }
    }

    /// Protect a differently named default pool.
    #[must_use]
    pub fn with_default_pool(mut self, name: impl Into<String>) -> Self {
        self.default_pool = name.into();
        self
    }

    /// Record instances woken or evicted by pool changes on `audit`.
    #[must_use]
    pub fn with_audit(mut self, audit: SharedAuditSink) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Name of the protected default pool.
    pub fn default_pool(&self) -> &str {
        &self.default_pool
    }

    /// Underlying store.
    pub const fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Create a pool.
    pub fn create(
        &self,
        name: impl Into<String>,
        slots: i64,
        include_deferred: bool,
        description: Option<String>,
    ) -> Result<Pool, PoolError> {
        self.create_pool(Pool::new(name, slots, include_deferred, description)?)
    }

    /// Create a pool from an already built record.
    pub fn create_pool(&self, pool: Pool) -> Result<Pool, PoolError> {
        pool.validate()?;
        self.store.insert_pool(pool.clone())?;
        tracing::info!("created pool {} with {} slots", pool.name, pool.slots);
        Ok(pool)
    }

    /// Create `pool` unless a pool with its name exists; returns the stored
    /// record either way.
    pub fn ensure(&self, pool: Pool) -> Result<Pool, PoolError> {
        match self.create_pool(pool.clone()) {
            Err(PoolError::DuplicateName(_)) => self.get(&pool.name),
            other => other,
        }
    }

    /// Fetch a pool by name.
    pub fn get(&self, name: &str) -> Result<Pool, PoolError> {
        self.store.with_pool(name, |shard| shard.pool().clone())
    }

    /// Apply a partial update. A rename and the field changes land together
    /// or not at all. Capacity freed by the update is granted to parked task
    /// instances straight away.
    pub fn update(&self, name: &str, update: &PoolUpdate) -> Result<Pool, PoolError> {
        update.validate()?;
        let rename = update.name.as_deref().filter(|n| *n != name);
        if rename.is_some() && name == self.default_pool {
            return Err(PoolError::DefaultPoolProtected(name.to_string()));
        }

        let (pool, drained) = self.store.update_pool(name, rename, |shard| {
            update.apply_fields(shard.pool_mut());
            shard.open_drain_window();
            let drained = drain_wait_queue(shard);
            (shard.pool().clone(), drained)
        })?;
        if let Some(new_name) = rename {
            tracing::info!("renamed pool {} to {}", name, new_name);
        }
        drained.report(&pool.name, self.audit.as_ref());
        Ok(pool)
    }

    /// Delete a pool. With [`DeletePolicy::Reject`] this fails with `InUse`
    /// while live task instances reference the pool; with
    /// [`DeletePolicy::Reassign`] they move to the target pool.
    pub fn delete(&self, name: &str, policy: &DeletePolicy) -> Result<Pool, PoolError> {
        if name == self.default_pool {
            return Err(PoolError::DefaultPoolProtected(name.to_string()));
        }
        let removed = self.store.remove_pool(name, policy)?;
        tracing::info!("deleted pool {}", name);

        if let DeletePolicy::Reassign(target) = policy {
            let drained = self.store.with_pool(target, drain_wait_queue)?;
            drained.report(target, self.audit.as_ref());
        }
        Ok(removed)
    }

    /// All pools in name order.
    pub fn list(&self) -> Vec<Pool> {
        self.store
            .pool_names()
            .iter()
            // A pool deleted between listing and reading is skipped.
            .filter_map(|name| self.get(name).ok())
            .collect()
    }
}
