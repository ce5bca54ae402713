//! Wire registry, admission controller and collection view over one store.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use parking_lot::Mutex;

use crate::config::SchedulerConfig;
use crate::core::{
    share_audit_sink, AdmissionController, AppResult, CollectionView, InMemoryAuditSink, PoolError,
    PoolRegistry, PoolStore,
};
use crate::infra::InMemoryPoolStore;

/// Scheduler-facing components sharing one store.
pub struct PoolScheduler<S> {
    /// Pool CRUD.
    pub registry: PoolRegistry<S>,
    /// Slot admission.
    pub controller: AdmissionController<S>,
    /// Reporting view.
    pub view: CollectionView<S>,
    /// Audit trail of the controller, when enabled.
    pub audit: Option<Arc<Mutex<InMemoryAuditSink>>>,
    report_interval: Option<Duration>,
}

impl<S: PoolStore + 'static> PoolScheduler<S> {
    /// Configured reporter interval.
    pub const fn report_interval(&self) -> Option<Duration> {
        self.report_interval
    }

    /// Snapshot reporter over this scheduler's view, if an interval is
    /// configured.
    #[cfg(feature = "tokio-runtime")]
    pub fn reporter(&self) -> Option<crate::runtime::SnapshotReporter<S>> {
        self.report_interval
            .map(|interval| crate::runtime::SnapshotReporter::new(self.view.clone(), interval))
    }
}

/// Load configuration from the environment and build over a fresh store.
pub fn build_from_env() -> AppResult<PoolScheduler<InMemoryPoolStore>> {
    let cfg = SchedulerConfig::from_env()
        .map_err(anyhow::Error::msg)
        .context("failed to load scheduler config")?;
    build_scheduler(&cfg).context("failed to bootstrap pools")
}

/// Build components over a fresh in-memory store.
pub fn build_scheduler(cfg: &SchedulerConfig) -> Result<PoolScheduler<InMemoryPoolStore>, PoolError> {
    build_with_store(cfg, Arc::new(InMemoryPoolStore::new()))
}

/// Build components over `store`, creating the default pool and every
/// configured pool that does not exist yet.
pub fn build_with_store<S: PoolStore>(
    cfg: &SchedulerConfig,
    store: Arc<S>,
) -> Result<PoolScheduler<S>, PoolError> {
    cfg.validate()
        .map_err(|e| PoolError::Config(format!("config invalid: {e}")))?;

    let audit = (cfg.audit_capacity > 0)
        .then(|| Arc::new(Mutex::new(InMemoryAuditSink::new(cfg.audit_capacity))));
    let shared_audit = audit
        .as_ref()
        .map(|sink| share_audit_sink(Box::new(Arc::clone(sink))));

    let default_name = cfg.default_pool.name.clone();
    let mut registry =
        PoolRegistry::new(Arc::clone(&store)).with_default_pool(default_name.clone());
    if let Some(sink) = &shared_audit {
        registry = registry.with_audit(Arc::clone(sink));
    }
    registry.ensure(cfg.default_pool.to_pool()?)?;
    for spec in &cfg.pools {
        registry.ensure(spec.to_pool()?)?;
    }

    let mut controller = AdmissionController::new(Arc::clone(&store));
    if cfg.fallback_to_default_pool {
        controller = controller.with_default_pool(default_name);
    }
    if let Some(sink) = shared_audit {
        controller = controller.with_shared_audit(sink);
    }

    tracing::info!(
        "pool scheduler ready with {} pool(s)",
        store.pool_names().len()
    );
    Ok(PoolScheduler {
        registry,
        controller,
        view: CollectionView::new(store),
        audit,
        report_interval: cfg.report_interval_ms.map(Duration::from_millis),
    })
}
