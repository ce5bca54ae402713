//! Pool and scheduler configuration structures.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::{Pool, PoolError, DEFAULT_POOL_NAME, DEFAULT_POOL_SLOTS, UNBOUNDED_SLOTS};

/// Environment variable naming a JSON configuration file.
pub const CONFIG_PATH_ENV: &str = "SLOT_POOLS_CONFIG";

/// Environment variable overriding the default pool's slot count.
pub const DEFAULT_SLOTS_ENV: &str = "SLOT_POOLS_DEFAULT_SLOTS";

/// Declarative description of one pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSpec {
    /// Unique pool name.
    pub name: String,
    /// Capacity in slots; `-1` is unbounded.
    pub slots: i64,
    /// Whether deferred task instances occupy slots.
    #[serde(default)]
    pub include_deferred: bool,
    /// Free-text description.
    #[serde(default)]
    pub description: Option<String>,
}

impl Default for PoolSpec {
    fn default() -> Self {
        Self {
            name: DEFAULT_POOL_NAME.to_string(),
            slots: DEFAULT_POOL_SLOTS,
            include_deferred: false,
            description: Some("Default pool".to_string()),
        }
    }
}

impl PoolSpec {
    /// Validate name and slot count.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("pool name must not be empty".into());
        }
        if self.slots < UNBOUNDED_SLOTS {
            return Err(format!("slots must be >= -1, got {}", self.slots));
        }
        Ok(())
    }

    /// Build the pool record.
    pub fn to_pool(&self) -> Result<Pool, PoolError> {
        Pool::new(
            self.name.clone(),
            self.slots,
            self.include_deferred,
            self.description.clone(),
        )
    }
}

/// Root scheduler configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Pool bootstrapped at startup and used as the admission fallback.
    #[serde(default)]
    pub default_pool: PoolSpec,
    /// Additional pools created at startup.
    #[serde(default)]
    pub pools: Vec<PoolSpec>,
    /// Whether admissions naming a missing pool fall back to the default pool.
    #[serde(default = "default_fallback")]
    pub fallback_to_default_pool: bool,
    /// Events kept by the in-memory audit sink; 0 disables auditing.
    #[serde(default = "default_audit_capacity")]
    pub audit_capacity: usize,
    /// Interval of the snapshot reporter in milliseconds, if enabled.
    #[serde(default)]
    pub report_interval_ms: Option<u64>,
}

const fn default_fallback() -> bool {
    true
}

const fn default_audit_capacity() -> usize {
    1024
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            default_pool: PoolSpec::default(),
            pools: Vec::new(),
            fallback_to_default_pool: default_fallback(),
            audit_capacity: default_audit_capacity(),
            report_interval_ms: None,
        }
    }
}

impl SchedulerConfig {
    /// Validate every pool, name uniqueness and the reporter interval.
    pub fn validate(&self) -> Result<(), String> {
        self.default_pool
            .validate()
            .map_err(|e| format!("default pool invalid: {e}"))?;

        let mut seen = HashSet::new();
        seen.insert(self.default_pool.name.as_str());
        for pool in &self.pools {
            pool.validate()
                .map_err(|e| format!("pool `{}` invalid: {e}", pool.name))?;
            if !seen.insert(pool.name.as_str()) {
                return Err(format!("pool `{}` defined more than once", pool.name));
            }
        }

        if self.report_interval_ms == Some(0) {
            return Err("report_interval_ms must be greater than 0".into());
        }
        Ok(())
    }

    /// Parse scheduler configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read and parse a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, String> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
        Self::from_json_str(&input)
    }

    /// Load configuration from the process environment, after reading a
    /// `.env` file if one exists.
    pub fn from_env() -> Result<Self, String> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!("loaded environment from {}", path.display());
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// [`CONFIG_PATH_ENV`] selects a JSON file (defaults apply otherwise) and
    /// [`DEFAULT_SLOTS_ENV`] overrides the default pool's slots.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = match lookup(CONFIG_PATH_ENV) {
            Some(path) => Self::from_json_file(path)?,
            None => Self::default(),
        };
        if let Some(raw) = lookup(DEFAULT_SLOTS_ENV) {
            cfg.default_pool.slots = raw
                .trim()
                .parse()
                .map_err(|e| format!("{DEFAULT_SLOTS_ENV}={raw:?}: {e}"))?;
        }
        cfg.validate()?;
        Ok(cfg)
    }
}
