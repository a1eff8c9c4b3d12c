//! Cancellable background timers tagged with an epoch.
//!
//! A timer task cannot be recalled once it has queued its message, so every
//! message carries the epoch the timer was armed with. The owner compares it
//! against [`EpochTimer::is_current`] and drops anything stale.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;

#[derive(Debug, Default)]
pub(crate) struct EpochTimer {
    epoch: u64,
    task: Option<JoinHandle<()>>,
}

impl EpochTimer {
    /// Spawn the task built by `make`, cancelling whatever was armed before.
    pub(crate) fn arm<F, Fut>(&mut self, make: F) -> u64
    where
        F: FnOnce(u64) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        let epoch = self.epoch;
        self.task = Some(tokio::spawn(make(epoch)));
        epoch
    }

    /// Arm a one-shot timer that runs `fire` after `delay`.
    pub(crate) fn arm_once<F>(&mut self, delay: Duration, fire: F) -> u64
    where
        F: FnOnce(u64) + Send + 'static,
    {
        self.arm(move |epoch| async move {
            tokio::time::sleep(delay).await;
            fire(epoch);
        })
    }

    /// Abort the armed task, if any, and invalidate its epoch.
    pub(crate) fn cancel(&mut self) -> bool {
        self.epoch = self.epoch.wrapping_add(1);
        self.task.take().is_some_and(|task| {
            task.abort();
            true
        })
    }

    pub(crate) const fn is_armed(&self) -> bool {
        self.task.is_some()
    }

    pub(crate) fn is_current(&self, epoch: u64) -> bool {
        self.task.is_some() && self.epoch == epoch
    }

    /// Consume a one-shot firing. Returns `false` for stale epochs.
    pub(crate) fn take_if_current(&mut self, epoch: u64) -> bool {
        if !self.is_current(epoch) {
            return false;
        }
        self.task = None;
        self.epoch = self.epoch.wrapping_add(1);
        true
    }
}

impl Drop for EpochTimer {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
