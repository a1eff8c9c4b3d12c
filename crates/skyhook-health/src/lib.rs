//! Health registry for skyhook clients.
//!
//! A [`HealthRegistry`] holds named asynchronous liveness probes and numeric
//! metrics. Streaming clients register one probe and a couple of counters when
//! they are built and remove them when they shut down; the surrounding process
//! polls [`HealthRegistry::status`] directly or through a periodic monitor
//! started with [`HealthRegistry::spawn_monitor`].

#![forbid(unsafe_code)]

mod error;
mod monitor;
mod registry;

pub use error::{HealthError, HealthResult};
pub use monitor::MonitorHandle;
pub use registry::{HealthConfig, HealthRegistry, HealthStatus, Probe};
