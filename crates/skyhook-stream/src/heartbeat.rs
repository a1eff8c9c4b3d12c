//! Keepalive ticker for an open connection.

use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;

use crate::timer::EpochTimer;

/// Emits a tick every `interval` while started. The first tick lands one full
/// interval after [`HeartbeatTimer::start`].
#[derive(Debug)]
pub struct HeartbeatTimer {
    interval: Duration,
    timer: EpochTimer,
}

impl HeartbeatTimer {
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            timer: EpochTimer::default(),
        }
    }

    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Start ticking, replacing any running ticker.
    ///
    /// `on_tick` receives the epoch of this run and returns `false` to stop
    /// the ticker (for example when its receiver is gone).
    pub fn start<F>(&mut self, mut on_tick: F) -> u64
    where
        F: FnMut(u64) -> bool + Send + 'static,
    {
        let interval = self.interval;
        self.timer.arm(move |epoch| async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if !on_tick(epoch) {
                    debug!(epoch, "Heartbeat receiver gone; ticker exiting");
                    break;
                }
            }
        })
    }

    /// Stop ticking. Ticks already queued carry a stale epoch afterwards.
    pub fn stop(&mut self) -> bool {
        self.timer.cancel()
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.timer.is_armed()
    }

    /// Whether a tick with `epoch` belongs to the running ticker.
    #[must_use]
    pub fn accepts(&self, epoch: u64) -> bool {
        self.timer.is_current(epoch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test(start_paused = true)]
    async fn first_tick_after_one_interval() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut heartbeat = HeartbeatTimer::new(Duration::from_secs(10));
        let epoch = heartbeat.start(move |epoch| tx.send(epoch).is_ok());
        assert!(heartbeat.is_active());

        tokio::time::sleep(Duration::from_millis(9_999)).await;
        assert!(rx.try_recv().is_err());

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(rx.try_recv().ok(), Some(epoch));
        assert!(heartbeat.accepts(epoch));

        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(rx.try_recv().ok(), Some(epoch));
        assert_eq!(rx.try_recv().ok(), Some(epoch));
    }

    #[tokio::test(start_paused = true)]
    async fn stop_halts_ticks_and_rejects_old_epoch() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut heartbeat = HeartbeatTimer::new(Duration::from_secs(1));
        let epoch = heartbeat.start(move |epoch| tx.send(epoch).is_ok());

        assert!(heartbeat.stop());
        assert!(!heartbeat.is_active());
        assert!(!heartbeat.accepts(epoch));
        assert!(!heartbeat.stop());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn restart_uses_fresh_epoch() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut heartbeat = HeartbeatTimer::new(Duration::from_secs(1));
        let first_tx = tx.clone();
        let first = heartbeat.start(move |epoch| first_tx.send(epoch).is_ok());
        let second = heartbeat.start(move |epoch| tx.send(epoch).is_ok());
        assert_ne!(first, second);
        assert!(!heartbeat.accepts(first));

        tokio::time::sleep(Duration::from_millis(1_500)).await;
        assert_eq!(rx.try_recv().ok(), Some(second));
        assert!(rx.try_recv().is_err());
    }
}
