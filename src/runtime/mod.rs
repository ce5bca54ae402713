//! API surface and runtime adapters.

pub mod api;
#[cfg(feature = "tokio-runtime")]
pub mod reporter;

pub use api::{collection_view, pool_view, PoolBody, PoolCollectionView, PoolPatch, PoolView};
#[cfg(feature = "tokio-runtime")]
pub use reporter::{ReporterHandle, SnapshotReporter, MIN_REPORT_INTERVAL};
