//! Configuration models for pools and the scheduler.

pub mod pool;

pub use pool::{PoolSpec, SchedulerConfig, CONFIG_PATH_ENV, DEFAULT_SLOTS_ENV};
