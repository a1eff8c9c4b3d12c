//! Periodic health monitor task.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::{HealthRegistry, HealthStatus};

/// Handle to a running monitor started by [`HealthRegistry::spawn_monitor`].
#[derive(Debug)]
pub struct MonitorHandle {
    shutdown: watch::Sender<bool>,
    latest: watch::Receiver<Option<HealthStatus>>,
    join_handle: JoinHandle<()>,
}

impl MonitorHandle {
    /// Ask the monitor to stop after its current round.
    pub fn stop(&self) {
        let _ = self.shutdown.send(true);
    }

    /// Stop the monitor and wait for the task to exit.
    pub async fn shutdown(self) {
        self.stop();
        let _ = self.join_handle.await;
    }

    /// Status from the most recent completed round, if any.
    #[must_use]
    pub fn latest(&self) -> Option<HealthStatus> {
        self.latest.borrow().clone()
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.join_handle.is_finished()
    }
}

impl HealthRegistry {
    /// Poll [`HealthRegistry::status`] every configured interval on a background task.
    ///
    /// The first round runs one full interval after the call. Each handle is
    /// independent; dropping the handle also stops its monitor.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    #[must_use]
    pub fn spawn_monitor(self: &Arc<Self>) -> MonitorHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (latest_tx, latest_rx) = watch::channel(None);
        let registry = Arc::clone(self);
        let join_handle = tokio::spawn(run_monitor(registry, shutdown_rx, latest_tx));
        MonitorHandle {
            shutdown: shutdown_tx,
            latest: latest_rx,
            join_handle,
        }
    }
}

async fn run_monitor(
    registry: Arc<HealthRegistry>,
    mut shutdown: watch::Receiver<bool>,
    latest: watch::Sender<Option<HealthStatus>>,
) {
    let period = registry.config().interval();
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!(interval_ms = registry.config().interval_ms, "Health monitor started");

    loop {
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
            _ = ticker.tick() => {
                let status = registry.status().await;
                report(&status);
                let _ = latest.send(Some(status));
            }
        }
    }

    info!("Health monitor stopped");
}

fn report(status: &HealthStatus) {
    if status.healthy {
        debug!(checks = status.checks.len(), "Health check passed");
    } else {
        warn!(
            failed = ?status.failed_checks(),
            checks = status.checks.len(),
            "Health check failed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HealthConfig;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn monitor_polls_each_interval_until_stopped() {
        let registry = Arc::new(HealthRegistry::new(
            HealthConfig::default().with_interval_ms(1_000),
        )
        .unwrap());
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        registry.register_fn("ticker", move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                true
            }
        });

        let monitor = registry.spawn_monitor();
        tokio::time::sleep(Duration::from_millis(3_500)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(monitor.latest().is_some_and(|status| status.healthy));

        monitor.stop();
        tokio::time::sleep(Duration::from_millis(5_000)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(monitor.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_handle_stops_monitor() {
        let registry = Arc::new(HealthRegistry::new(
            HealthConfig::default().with_interval_ms(1_000),
        )
        .unwrap());
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        registry.register_fn("ticker", move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                true
            }
        });

        drop(registry.spawn_monitor());
        tokio::time::sleep(Duration::from_millis(5_000)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
