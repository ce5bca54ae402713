//! Periodic snapshot reporter on a tokio runtime.

use std::time::Duration;

use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;

use crate::core::{CollectionView, PoolCollection, PoolStore};

/// Shortest interval the reporter ticks at.
pub const MIN_REPORT_INTERVAL: Duration = Duration::from_millis(1);

/// Takes a snapshot of every pool on a fixed interval, logs it, and publishes
/// the latest one to subscribers.
pub struct SnapshotReporter<S> {
    view: CollectionView<S>,
    interval: Duration,
}

/// Handle to a running reporter.
pub struct ReporterHandle {
    latest: watch::Receiver<PoolCollection>,
    stop: Option<oneshot::Sender<()>>,
    join: JoinHandle<()>,
}

impl ReporterHandle {
    /// Receiver of the most recent snapshot.
    pub fn subscribe(&self) -> watch::Receiver<PoolCollection> {
        self.latest.clone()
    }

    /// Most recent snapshot.
    pub fn latest(&self) -> PoolCollection {
        self.latest.borrow().clone()
    }

    /// Stop the reporter and wait for it to exit.
    pub async fn stop(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Err(e) = self.join.await {
            tracing::error!("snapshot reporter task failed: {}", e);
        }
    }
}

impl<S: PoolStore + 'static> SnapshotReporter<S> {
    /// Create a reporter. Intervals below [`MIN_REPORT_INTERVAL`] are
    /// raised to it.
    pub fn new(view: CollectionView<S>, interval: Duration) -> Self {
        if interval < MIN_REPORT_INTERVAL {
            tracing::warn!(
                "report interval {:?} too short, using {:?}",
                interval,
                MIN_REPORT_INTERVAL
            );
        }
        Self {
            view,
            interval: interval.max(MIN_REPORT_INTERVAL),
        }
    }

    /// Tick interval.
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Take, log and check one snapshot.
    pub fn report_once(&self) -> PoolCollection {
        let snapshot = self.view.snapshot();
        for entry in &snapshot.pools {
            tracing::info!(
                "pool {}: slots={} occupied={} running={} queued={} scheduled={} deferred={} open={}",
                entry.pool.name,
                entry.pool.slots,
                entry.stats.occupied,
                entry.stats.running,
                entry.stats.queued,
                entry.stats.scheduled,
                entry.stats.deferred,
                entry.stats.open
            );
        }
        for violation in self.view.check_invariants() {
            tracing::error!("{}", violation);
        }
        snapshot
    }

    /// Run the reporter on `handle` until stopped.
    pub fn spawn(self, handle: &tokio::runtime::Handle) -> ReporterHandle {
        let (tx, latest) = watch::channel(PoolCollection::default());
        let (stop, mut stopped) = oneshot::channel();

        let join = handle.spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        tx.send_replace(self.report_once());
                    }
                    _ = &mut stopped => {
                        tracing::debug!("snapshot reporter stopping");
                        break;
                    }
                }
            }
        });

        ReporterHandle {
            latest,
            stop: Some(stop),
            join,
        }
    }
}
