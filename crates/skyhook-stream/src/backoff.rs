//! Reconnect backoff and failover decisions.
//!
//! [`ReconnectPolicy`] is a plain value: given the attempt counter and the
//! endpoint rotator it decides whether to retry the same endpoint after a
//! delay, rotate to the next endpoint right away, or give up for good.

use std::time::Duration;

use crate::rotator::EndpointRotator;

/// What to do after a connection ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectDecision {
    /// Reconnect to the same endpoint after `delay`.
    Retry { attempt: u32, delay: Duration },
    /// Per-endpoint budget spent; connect to endpoint `to` immediately.
    Rotate { from: usize, to: usize, cycle: u32 },
    /// Cycle budget spent; the client must not reconnect again.
    GiveUp { cycles: u32 },
}

/// Exponential backoff with per-endpoint retry budget and bounded failover cycles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReconnectPolicy {
    base: Duration,
    factor: f64,
    max_delay: Duration,
    max_attempts: u32,
    max_cycles: u32,
}

impl ReconnectPolicy {
    #[must_use]
    pub const fn new(
        base: Duration,
        factor: f64,
        max_delay: Duration,
        max_attempts: u32,
        max_cycles: u32,
    ) -> Self {
        Self {
            base,
            factor,
            max_delay,
            max_attempts,
            max_cycles,
        }
    }

    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    #[must_use]
    pub const fn max_cycles(&self) -> u32 {
        self.max_cycles
    }

    /// Delay before the `attempt`-th retry (1-based): `min(base * factor^(attempt-1), max_delay)`.
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exp = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
        let raw = self.base.as_nanos() as f64 * self.factor.powi(exp);
        let cap = self.max_delay.as_nanos() as f64;
        if !raw.is_finite() || raw >= cap {
            return self.max_delay;
        }
        Duration::from_nanos(raw.round() as u64)
    }

    /// Account for one lost connection and decide what happens next.
    ///
    /// Increments `attempts`. While it stays below the per-endpoint budget the
    /// same endpoint is retried with backoff. Once the budget is spent the
    /// rotator advances and `attempts` resets, unless the rotator has already
    /// wrapped `max_cycles` times, in which case the answer is
    /// [`ReconnectDecision::GiveUp`].
    pub fn on_disconnect(
        &self,
        attempts: &mut u32,
        rotator: &mut EndpointRotator,
    ) -> ReconnectDecision {
        *attempts = attempts.saturating_add(1);
        if *attempts < self.max_attempts {
            return ReconnectDecision::Retry {
                attempt: *attempts,
                delay: self.delay_for_attempt(*attempts),
            };
        }

        if rotator.cycles() < self.max_cycles {
            let rotation = rotator.advance();
            *attempts = 0;
            return ReconnectDecision::Rotate {
                from: rotation.from,
                to: rotation.to,
                cycle: rotator.cycles(),
            };
        }

        ReconnectDecision::GiveUp {
            cycles: rotator.cycles(),
        }
    }
}
