//! Infrastructure adapters for pool storage backends.

pub mod store;

pub use store::InMemoryPoolStore;
