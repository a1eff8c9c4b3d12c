//! `skyhook-tail` configuration: TOML file, then environment, then flags.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use skyhook_health::HealthConfig;
use skyhook_stream::StreamConfig;

/// Comma-separated endpoint list that replaces the file's `stream.endpoints`.
pub const ENDPOINTS_ENV: &str = "SKYHOOK_ENDPOINTS";

/// Top-level config file layout.
///
/// ```toml
/// [stream]
/// endpoints = ["wss://jetstream1.example/subscribe"]
/// ping_interval_ms = 10000
///
/// [health]
/// interval_ms = 30000
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TailConfig {
    pub stream: StreamConfig,
    pub health: HealthConfig,
}

impl TailConfig {
    /// Read `path`, or start from defaults when no file is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_toml(&raw).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Apply environment overrides. `lookup` is `std::env::var` in the binary.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENDPOINTS_ENV) {
            let endpoints = split_endpoints(&raw);
            if !endpoints.is_empty() {
                self.stream.endpoints = endpoints;
            }
        }
    }

    /// `--endpoint` flags win over both the file and the environment.
    pub fn apply_endpoints(&mut self, endpoints: &[String]) {
        if !endpoints.is_empty() {
            self.stream.endpoints = endpoints.to_vec();
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.stream
            .validate()
            .context("invalid [stream] configuration")?;
        self.health
            .validate()
            .context("invalid [health] configuration")?;
        Ok(())
    }
}

fn split_endpoints(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|endpoint| !endpoint.is_empty())
        .map(ToString::to_string)
        .collect()
}
