//! Stream configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::backoff::ReconnectPolicy;
use crate::{StreamError, StreamResult};

/// Configuration for a [`crate::ConnectionSupervisor`].
///
/// Every field except `endpoints` has a default, so a TOML file only needs to
/// list the endpoints:
///
/// ```toml
/// endpoints = ["wss://jetstream1.us-east.bsky.network/subscribe"]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Ordered connection targets. Failover walks this list front to back.
    pub endpoints: Vec<String>,
    /// Base backoff interval in milliseconds.
    pub reconnect_interval_ms: u64,
    /// Heartbeat period in milliseconds.
    pub ping_interval_ms: u64,
    /// Retry budget per endpoint before rotating.
    pub max_reconnect_attempts: u32,
    /// Backoff cap in milliseconds.
    pub max_reconnect_delay_ms: u64,
    /// Exponential multiplier applied per attempt.
    pub backoff_factor: f64,
    /// Full passes over the endpoint list before giving up.
    pub max_service_cycles: u32,
    /// Bound on a single connection attempt in milliseconds.
    pub connect_timeout_ms: u64,
    /// Per-connection outbound frame queue capacity.
    pub outbound_queue: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            endpoints: Vec::new(),
            reconnect_interval_ms: 5_000,
            ping_interval_ms: 10_000,
            max_reconnect_attempts: 3,
            max_reconnect_delay_ms: 30_000,
            backoff_factor: 1.5,
            max_service_cycles: 2,
            connect_timeout_ms: 30_000,
            outbound_queue: 256,
        }
    }
}

impl StreamConfig {
    /// Default configuration for the given endpoints.
    #[must_use]
    pub fn new<I, S>(endpoints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            endpoints: endpoints.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_reconnect_interval_ms(mut self, ms: u64) -> Self {
        self.reconnect_interval_ms = ms;
        self
    }

    #[must_use]
    pub const fn with_ping_interval_ms(mut self, ms: u64) -> Self {
        self.ping_interval_ms = ms;
        self
    }

    #[must_use]
    pub const fn with_max_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.max_reconnect_attempts = attempts;
        self
    }

    #[must_use]
    pub const fn with_max_reconnect_delay_ms(mut self, ms: u64) -> Self {
        self.max_reconnect_delay_ms = ms;
        self
    }

    #[must_use]
    pub const fn with_backoff_factor(mut self, factor: f64) -> Self {
        self.backoff_factor = factor;
        self
    }

    #[must_use]
    pub const fn with_max_service_cycles(mut self, cycles: u32) -> Self {
        self.max_service_cycles = cycles;
        self
    }

    #[must_use]
    pub const fn with_connect_timeout_ms(mut self, ms: u64) -> Self {
        self.connect_timeout_ms = ms;
        self
    }

    #[must_use]
    pub const fn with_outbound_queue(mut self, capacity: usize) -> Self {
        self.outbound_queue = capacity;
        self
    }

    #[must_use]
    pub const fn ping_interval(&self) -> Duration {
        Duration::from_millis(self.ping_interval_ms)
    }

    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Backoff and failover policy described by this configuration.
    #[must_use]
    pub const fn reconnect_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy::new(
            Duration::from_millis(self.reconnect_interval_ms),
            self.backoff_factor,
            Duration::from_millis(self.max_reconnect_delay_ms),
            self.max_reconnect_attempts,
            self.max_service_cycles,
        )
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::InvalidConfig`] listing every violated rule.
    pub fn validate(&self) -> StreamResult<()> {
        let mut errors = Vec::new();

        if self.endpoints.is_empty() {
            errors.push("endpoints must not be empty".to_string());
        }
        for endpoint in &self.endpoints {
            if let Err(err) = check_endpoint(endpoint) {
                errors.push(err.to_string());
            }
        }
        if self.reconnect_interval_ms == 0 {
            errors.push("reconnect_interval_ms must be > 0".to_string());
        }
        if self.ping_interval_ms == 0 {
            errors.push("ping_interval_ms must be > 0".to_string());
        }
        if self.max_reconnect_attempts == 0 {
            errors.push("max_reconnect_attempts must be > 0".to_string());
        }
        if self.max_reconnect_delay_ms < self.reconnect_interval_ms {
            errors.push("max_reconnect_delay_ms must be >= reconnect_interval_ms".to_string());
        }
        if !self.backoff_factor.is_finite() || self.backoff_factor < 1.0 {
            errors.push("backoff_factor must be a finite number >= 1.0".to_string());
        }
        if self.connect_timeout_ms == 0 {
            errors.push("connect_timeout_ms must be > 0".to_string());
        }
        if self.outbound_queue == 0 {
            errors.push("outbound_queue must be > 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(StreamError::InvalidConfig(errors))
        }
    }
}

/// Check that an endpoint is an absolute `ws://` or `wss://` URL.
///
/// # Errors
///
/// Returns [`StreamError::InvalidEndpoint`] otherwise.
pub fn check_endpoint(endpoint: &str) -> StreamResult<Url> {
    let url = Url::parse(endpoint).map_err(|e| StreamError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        reason: e.to_string(),
    })?;
    match url.scheme() {
        "ws" | "wss" => Ok(url),
        other => Err(StreamError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason: format!("unsupported scheme {other:?}"),
        }),
    }
}
