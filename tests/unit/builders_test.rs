//! Tests for builder modules

use std::sync::Arc;

use slot_pools::builders::{build_scheduler, build_with_store};
use slot_pools::config::{PoolSpec, SchedulerConfig};
use slot_pools::core::{Admission, PoolError, PoolStore, TaskInstance, DEFAULT_POOL_NAME};
use slot_pools::infra::InMemoryPoolStore;

fn config_with(pools: Vec<PoolSpec>) -> SchedulerConfig {
    SchedulerConfig {
        pools,
        ..SchedulerConfig::default()
    }
}

fn spec(name: &str, slots: i64) -> PoolSpec {
    PoolSpec {
        name: name.to_string(),
        slots,
        include_deferred: false,
        description: None,
    }
}

#[test]
fn test_build_bootstraps_pools() {
    let scheduler = build_scheduler(&config_with(vec![spec("db", 2), spec("api", 5)])).unwrap();
    let names: Vec<_> = scheduler
        .registry
        .list()
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(names, vec!["api", "db", DEFAULT_POOL_NAME]);
    assert_eq!(scheduler.controller.default_pool(), Some(DEFAULT_POOL_NAME));
    assert_eq!(scheduler.registry.default_pool(), DEFAULT_POOL_NAME);
}

#[test]
fn test_build_rejects_invalid_config() {
    let result = build_scheduler(&config_with(vec![spec("db", -4)]));
    assert!(matches!(result, Err(PoolError::Config(_))));
}

#[test]
fn test_build_keeps_existing_pools() {
    let store = Arc::new(InMemoryPoolStore::new());
    build_with_store(&config_with(vec![spec("db", 2)]), Arc::clone(&store)).unwrap();

    // Second bootstrap over the same store must not fail or reset pools.
    let scheduler = build_with_store(&config_with(vec![spec("db", 9)]), Arc::clone(&store)).unwrap();
    assert_eq!(scheduler.registry.get("db").unwrap().slots, 2);
    assert_eq!(store.pool_names().len(), 2);
}

#[test]
fn test_build_without_fallback_or_audit() {
    let cfg = SchedulerConfig {
        fallback_to_default_pool: false,
        audit_capacity: 0,
        ..SchedulerConfig::default()
    };
    let scheduler = build_scheduler(&cfg).unwrap();
    assert!(scheduler.audit.is_none());
    assert_eq!(scheduler.controller.default_pool(), None);
    assert!(matches!(
        scheduler
            .controller
            .try_admit_or_default(TaskInstance::new(1, "nope"), "nope"),
        Err(PoolError::NotFound(_))
    ));
}

#[test]
fn test_build_wires_audit() {
    let scheduler = build_scheduler(&config_with(vec![spec("db", 1)])).unwrap();
    let admission = scheduler
        .controller
        .try_admit(TaskInstance::new(1, "db"), "db")
        .unwrap();
    assert_eq!(admission, Admission::Admitted);

    let audit = scheduler.audit.unwrap();
    let events = audit.lock().events_for("admit");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].pool, "db");
    assert_eq!(events[0].task_id, "1");
}

#[test]
fn test_report_interval_is_wired() {
    let scheduler = build_scheduler(&SchedulerConfig::default()).unwrap();
    assert_eq!(scheduler.report_interval(), None);
    assert!(scheduler.reporter().is_none());

    let cfg = SchedulerConfig {
        report_interval_ms: Some(250),
        ..SchedulerConfig::default()
    };
    let scheduler = build_scheduler(&cfg).unwrap();
    assert_eq!(
        scheduler.report_interval(),
        Some(std::time::Duration::from_millis(250))
    );
    let reporter = scheduler.reporter().unwrap();
    assert_eq!(reporter.report_once().total_entries, 1);
}
