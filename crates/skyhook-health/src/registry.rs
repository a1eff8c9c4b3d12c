//! Probe and metric registry.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use futures_util::future::{BoxFuture, FutureExt, join_all};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{HealthError, HealthResult};

/// Asynchronous liveness check. Resolves to `true` while the component is healthy.
pub type Probe = Arc<dyn Fn() -> BoxFuture<'static, bool> + Send + Sync>;

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Health registry configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    /// Period of the background monitor in milliseconds.
    pub interval_ms: u64,
    /// Bound on a single probe attempt in milliseconds.
    pub probe_timeout_ms: u64,
    /// Extra attempts after a failed or timed-out probe.
    pub retries: u32,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            interval_ms: 30_000,
            probe_timeout_ms: 5_000,
            retries: 2,
        }
    }
}

impl HealthConfig {
    /// Set the monitor interval.
    #[must_use]
    pub const fn with_interval_ms(mut self, interval_ms: u64) -> Self {
        self.interval_ms = interval_ms;
        self
    }

    /// Set the per-attempt probe timeout.
    #[must_use]
    pub const fn with_probe_timeout_ms(mut self, probe_timeout_ms: u64) -> Self {
        self.probe_timeout_ms = probe_timeout_ms;
        self
    }

    /// Set the number of retries after a failed probe attempt.
    #[must_use]
    pub const fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    #[must_use]
    pub const fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns [`HealthError::InvalidConfig`] listing every rejected field.
    pub fn validate(&self) -> HealthResult<()> {
        let mut errors = Vec::new();
        if self.interval_ms == 0 {
            errors.push("interval_ms must be > 0".to_string());
        }
        if self.probe_timeout_ms == 0 {
            errors.push("probe_timeout_ms must be > 0".to_string());
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(HealthError::InvalidConfig(errors))
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Status report
// ─────────────────────────────────────────────────────────────────────────────

/// Aggregated result of one round of probes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    /// `true` when every probe passed (or none are registered).
    pub healthy: bool,
    pub timestamp: DateTime<Utc>,
    pub checks: BTreeMap<String, bool>,
    pub metrics: BTreeMap<String, f64>,
    /// `<probe>_last_failure` timestamps for failed probes.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub details: BTreeMap<String, serde_json::Value>,
}

impl HealthStatus {
    /// Names of the probes that failed in this round.
    #[must_use]
    pub fn failed_checks(&self) -> Vec<&str> {
        self.checks
            .iter()
            .filter(|(_, ok)| !**ok)
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Registry
// ─────────────────────────────────────────────────────────────────────────────

/// Process-wide registry of named probes and metrics.
///
/// Shared as `Arc<HealthRegistry>`. All methods take `&self` and are safe to call
/// from any task; locks are never held across an `.await`.
pub struct HealthRegistry {
    config: HealthConfig,
    probes: RwLock<HashMap<String, Probe>>,
    metrics: RwLock<BTreeMap<String, f64>>,
    last_results: RwLock<BTreeMap<String, bool>>,
}

impl Default for HealthRegistry {
    fn default() -> Self {
        Self::from_valid(HealthConfig::default())
    }
}

impl fmt::Debug for HealthRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HealthRegistry")
            .field("config", &self.config)
            .field("probes", &self.probe_names())
            .field("metrics", &*self.metrics.read())
            .finish_non_exhaustive()
    }
}

impl HealthRegistry {
    /// Build a registry after validating `config`.
    ///
    /// # Errors
    ///
    /// Returns [`HealthError::InvalidConfig`] if the interval or probe timeout is zero.
    pub fn new(config: HealthConfig) -> HealthResult<Self> {
        config.validate()?;
        Ok(Self::from_valid(config))
    }

    fn from_valid(config: HealthConfig) -> Self {
        Self {
            config,
            probes: RwLock::new(HashMap::new()),
            metrics: RwLock::new(BTreeMap::new()),
            last_results: RwLock::new(BTreeMap::new()),
        }
    }

    #[must_use]
    pub const fn config(&self) -> &HealthConfig {
        &self.config
    }

    /// Register a probe under `name`, replacing any probe already registered there.
    pub fn register(&self, name: impl Into<String>, probe: Probe) {
        let name = name.into();
        debug!(probe = %name, "Registering health probe");
        if self.probes.write().insert(name.clone(), probe).is_some() {
            warn!(probe = %name, "Replaced existing health probe");
        }
    }

    /// Register an async closure as a probe.
    pub fn register_fn<F, Fut>(&self, name: impl Into<String>, check: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        self.register(name, Arc::new(move || check().boxed()));
    }

    /// Remove a probe and its last observed result.
    ///
    /// Returns `true` if a probe with that name existed.
    pub fn unregister(&self, name: &str) -> bool {
        let existed = self.probes.write().remove(name).is_some();
        self.last_results.write().remove(name);
        if existed {
            debug!(probe = %name, "Unregistered health probe");
        }
        existed
    }

    #[must_use]
    pub fn is_registered(&self, name: &str) -> bool {
        self.probes.read().contains_key(name)
    }

    /// Registered probe names in sorted order.
    #[must_use]
    pub fn probe_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.probes.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn set_metric(&self, name: impl Into<String>, value: f64) {
        self.metrics.write().insert(name.into(), value);
    }

    /// Increment a metric by one, creating it at zero first if needed.
    pub fn increment_metric(&self, name: &str) {
        self.add_metric(name, 1.0);
    }

    pub fn add_metric(&self, name: &str, delta: f64) {
        let mut metrics = self.metrics.write();
        match metrics.get_mut(name) {
            Some(value) => *value += delta,
            None => {
                metrics.insert(name.to_string(), delta);
            }
        }
    }

    /// Drop a metric, returning its last value.
    pub fn remove_metric(&self, name: &str) -> Option<f64> {
        self.metrics.write().remove(name)
    }

    /// Current value of a metric; `0.0` if it was never set.
    #[must_use]
    pub fn metric(&self, name: &str) -> f64 {
        self.metrics.read().get(name).copied().unwrap_or(0.0)
    }

    #[must_use]
    pub fn metrics(&self) -> BTreeMap<String, f64> {
        self.metrics.read().clone()
    }

    /// Result of the most recent probe round, per probe.
    #[must_use]
    pub fn last_check_summary(&self) -> BTreeMap<String, bool> {
        self.last_results.read().clone()
    }

    /// Run every registered probe concurrently and aggregate the results.
    pub async fn status(&self) -> HealthStatus {
        let probes: Vec<(String, Probe)> = self
            .probes
            .read()
            .iter()
            .map(|(name, probe)| (name.clone(), Arc::clone(probe)))
            .collect();

        let timeout = self.config.probe_timeout();
        let retries = self.config.retries;
        let results = join_all(probes.into_iter().map(|(name, probe)| async move {
            let ok = run_probe(&name, &probe, timeout, retries).await;
            (name, ok)
        }))
        .await;

        let timestamp = Utc::now();
        let mut checks = BTreeMap::new();
        let mut details = BTreeMap::new();
        {
            let probes = self.probes.read();
            let mut last_results = self.last_results.write();
            for (name, ok) in results {
                // A probe unregistered mid-round must not reappear in the summary.
                if probes.contains_key(&name) {
                    last_results.insert(name.clone(), ok);
                }
                if !ok {
                    details.insert(
                        format!("{name}_last_failure"),
                        serde_json::Value::String(
                            timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
                        ),
                    );
                }
                checks.insert(name, ok);
            }
        }

        HealthStatus {
            healthy: checks.values().all(|ok| *ok),
            timestamp,
            checks,
            metrics: self.metrics(),
            details,
        }
    }
}

async fn run_probe(name: &str, probe: &Probe, timeout: Duration, retries: u32) -> bool {
    for attempt in 0..=retries {
        match tokio::time::timeout(timeout, probe()).await {
            Ok(true) => return true,
            Ok(false) => {
                debug!(probe = %name, attempt, "Health probe reported unhealthy");
            }
            Err(_) => {
                warn!(
                    probe = %name,
                    attempt,
                    timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                    "Health probe timed out"
                );
            }
        }
    }
    false
}
