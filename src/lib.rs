//! # Slot Pools
//!
//! Resource pool admission control for workflow schedulers.
//!
//! A pool is a named set of execution slots bounding how many task instances
//! may run against a shared resource at once: a database connection limit,
//! an external API quota, a worker class. Every task instance claiming a pool
//! is classified as running, queued, scheduled or deferred, and the pool's
//! open slots are derived from those counts on every read.
//!
//! ## Components
//!
//! - **Classifier** (`core::classifier`): the one counting rule, a pure
//!   function over a snapshot of task instances
//! - **Admission controller** (`core::admission`): grants a slot inside the
//!   pool's critical section or parks the instance on the pool's wait list
//! - **Registry** (`core::registry`): create, rename, resize and delete pools
//! - **Collection view** (`core::collection`): snapshot of all pools for
//!   reporting, using the same classifier as admission
//! - **Store** (`core::store`, `infra::store`): per-pool lock domains
//!
//! ## Example
//!
//! ```rust
//! use slot_pools::builders::build_scheduler;
//! use slot_pools::config::SchedulerConfig;
//! use slot_pools::core::{Admission, TaskInstance, TaskState};
//!
//! let scheduler = build_scheduler(&SchedulerConfig::default()).unwrap();
//! scheduler.registry.create("db", 1, false, None).unwrap();
//!
//! let first = scheduler.controller.try_admit(TaskInstance::new(1, "db"), "db").unwrap();
//! let second = scheduler.controller.try_admit(TaskInstance::new(2, "db"), "db").unwrap();
//! assert_eq!(first, Admission::Admitted);
//! assert_eq!(second, Admission::Queued);
//!
//! // Finishing the first instance hands its slot to the parked one.
//! let woken = scheduler.controller.release(1, TaskState::Success).unwrap();
//! assert_eq!(woken, vec![2]);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Pool entities, slot accounting and admission control.
pub mod core;
/// Configuration models for pools and the scheduler.
pub mod config;
/// Builders to construct scheduler components from configuration.
pub mod builders;
/// Infrastructure adapters for pool storage.
pub mod infra;
/// API surface and runtime adapters.
pub mod runtime;
/// Shared utilities.
pub mod util;
