//! Tests for configuration validation

use std::collections::HashMap;

use slot_pools::config::{PoolSpec, SchedulerConfig, CONFIG_PATH_ENV, DEFAULT_SLOTS_ENV};
use slot_pools::core::{DEFAULT_POOL_NAME, DEFAULT_POOL_SLOTS};

fn spec(name: &str, slots: i64) -> PoolSpec {
    PoolSpec {
        name: name.to_string(),
        slots,
        include_deferred: false,
        description: None,
    }
}

#[test]
fn test_default_config_is_valid() {
    let config = SchedulerConfig::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.default_pool.name, DEFAULT_POOL_NAME);
    assert_eq!(config.default_pool.slots, DEFAULT_POOL_SLOTS);
    assert!(config.fallback_to_default_pool);
}

#[test]
fn test_pool_spec_validation() {
    assert!(spec("pool1", 10).validate().is_ok());
    assert!(spec("pool1", -1).validate().is_ok());
    assert!(spec("pool1", -2).validate().is_err());
    assert!(spec("", 10).validate().is_err());
}

#[test]
fn test_scheduler_config_duplicate_pools() {
    let config = SchedulerConfig {
        pools: vec![spec("a", 1), spec("a", 2)],
        ..SchedulerConfig::default()
    };
    assert!(config.validate().is_err());

    let config = SchedulerConfig {
        pools: vec![spec(DEFAULT_POOL_NAME, 4)],
        ..SchedulerConfig::default()
    };
    assert!(config.validate().is_err());
}

#[test]
fn test_scheduler_config_zero_report_interval() {
    let config = SchedulerConfig {
        report_interval_ms: Some(0),
        ..SchedulerConfig::default()
    };
    assert!(config.validate().is_err());
}

#[test]
fn test_scheduler_config_from_json() {
    let json = r#"{
        "default_pool": { "name": "default_pool", "slots": 16 },
        "pools": [
            { "name": "db", "slots": 3, "include_deferred": true, "description": "Postgres" },
            { "name": "api", "slots": -1 }
        ],
        "audit_capacity": 0
    }"#;

    let config = SchedulerConfig::from_json_str(json).unwrap();
    assert_eq!(config.default_pool.slots, 16);
    assert_eq!(config.pools.len(), 2);
    assert!(config.pools[0].include_deferred);
    assert_eq!(config.pools[1].description, None);
    assert_eq!(config.audit_capacity, 0);
    assert!(config.fallback_to_default_pool);
}

#[test]
fn test_scheduler_config_from_json_rejects_invalid() {
    assert!(SchedulerConfig::from_json_str("{ not json").is_err());
    assert!(SchedulerConfig::from_json_str(r#"{ "pools": [ { "name": "x", "slots": -3 } ] }"#).is_err());
}

#[test]
fn test_from_lookup_defaults_and_override() {
    let config = SchedulerConfig::from_lookup(|_| None).unwrap();
    assert_eq!(config, SchedulerConfig::default());

    let vars = HashMap::from([(DEFAULT_SLOTS_ENV, " 32 ")]);
    let config = SchedulerConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();
    assert_eq!(config.default_pool.slots, 32);

    let vars = HashMap::from([(DEFAULT_SLOTS_ENV, "many")]);
    assert!(SchedulerConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string())).is_err());
}

#[test]
fn test_from_lookup_reads_config_file() {
    let dir = std::env::temp_dir().join(format!("slot_pools_cfg_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("pools.json");
    std::fs::write(&path, r#"{ "pools": [ { "name": "db", "slots": 2 } ] }"#).unwrap();

    let path_str = path.to_string_lossy().to_string();
    let config = SchedulerConfig::from_lookup(|k| {
        (k == CONFIG_PATH_ENV).then(|| path_str.clone())
    })
    .unwrap();
    assert_eq!(config.pools, vec![spec("db", 2)]);

    let missing = SchedulerConfig::from_lookup(|k| {
        (k == CONFIG_PATH_ENV).then(|| dir.join("absent.json").to_string_lossy().to_string())
    });
    assert!(missing.is_err());

    std::fs::remove_dir_all(&dir).unwrap();
}
