//! Refresh Scheduler Background Task
//!
//! Periodically re-issues a replace fetch for the active section through the
//! same orchestrator path as a manual change, so the epoch guard applies to
//! timer ticks as well.
//!
//! The task holds only a weak reference to its target and stops on its own
//! once the target is dropped. Dropping the [`RefreshScheduler`] handle also
//! stops it, because the shutdown channel closes; [`RefreshScheduler::stop`]
//! additionally waits for a tick that is already running to finish.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Something the scheduler can refresh.
#[async_trait]
pub trait RefreshTarget: Send + Sync + 'static {
    /// Perform one refresh. Returns false if the tick was skipped.
    async fn refresh_tick(&self) -> bool;
}

/// Counters for the refresh task.
#[derive(Debug, Default)]
pub struct RefreshMetrics {
    /// Number of timer ticks observed
    pub ticks: AtomicU64,
    /// Number of ticks that issued a refresh
    pub refreshes: AtomicU64,
    /// Number of ticks skipped because a fetch was in flight
    pub skipped: AtomicU64,
}

impl RefreshMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> RefreshMetricsSnapshot {
        RefreshMetricsSnapshot {
            ticks: self.ticks.load(Ordering::Relaxed),
            refreshes: self.refreshes.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshMetricsSnapshot {
    pub ticks: u64,
    pub refreshes: u64,
    pub skipped: u64,
}

/// Handle to a running refresh task.
pub struct RefreshScheduler {
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
    metrics: Arc<RefreshMetrics>,
}

impl RefreshScheduler {
    /// Spawn the refresh loop on the current tokio runtime.
    ///
    /// The first refresh fires one full `period` after spawning.
    pub fn spawn<T: RefreshTarget>(target: Weak<T>, period: Duration) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let metrics = Arc::new(RefreshMetrics::new());
        let handle = tokio::spawn(refresh_loop(
            target,
            period,
            shutdown_rx,
            Arc::clone(&metrics),
        ));
        Self {
            shutdown_tx,
            handle,
            metrics,
        }
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    pub fn metrics(&self) -> RefreshMetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Signal shutdown and wait for the task to exit.
    pub async fn stop(self) -> RefreshMetricsSnapshot {
        let _ = self.shutdown_tx.send(true);
        if let Err(err) = self.handle.await {
            tracing::error!(error = %err, "Refresh task ended abnormally");
        }
        self.metrics.snapshot()
    }
}

async fn refresh_loop<T: RefreshTarget>(
    target: Weak<T>,
    period: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
    metrics: Arc<RefreshMetrics>,
) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let period_ms = u64::try_from(period.as_millis()).unwrap_or(u64::MAX);
    tracing::info!(period_ms, "Refresh scheduler started");

    loop {
        tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    tracing::info!("Refresh scheduler shutting down");
                    break;
                }
            }

            _ = ticker.tick() => {
                let Some(target) = target.upgrade() else {
                    tracing::debug!("Refresh target dropped; stopping scheduler");
                    break;
                };
                metrics.ticks.fetch_add(1, Ordering::Relaxed);
                if target.refresh_tick().await {
                    metrics.refreshes.fetch_add(1, Ordering::Relaxed);
                } else {
                    metrics.skipped.fetch_add(1, Ordering::Relaxed);
                }
            }
        }
    }

    let snapshot = metrics.snapshot();
    tracing::info!(
        ticks = snapshot.ticks,
        refreshes = snapshot.refreshes,
        skipped = snapshot.skipped,
        "Refresh scheduler stopped"
    );
}
