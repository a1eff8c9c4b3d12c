//! Resilient streaming client for skyhook agents.
//!
//! A [`ConnectionSupervisor`] keeps one logical connection open across network
//! flaps, server restarts and endpoint outages:
//!
//! - a keepalive ping every `ping_interval_ms` while connected ([`HeartbeatTimer`]);
//! - exponential backoff between retries of the same endpoint ([`ReconnectPolicy`]);
//! - failover across an ordered endpoint list for a bounded number of passes
//!   ([`EndpointRotator`]), after which the supervisor enters the terminal
//!   `Failed` state;
//! - a liveness probe and two counters in a shared
//!   [`skyhook_health::HealthRegistry`].
//!
//! Frames are delivered to [`StreamHooks`] in receive order. Payloads are never
//! inspected.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use skyhook_health::HealthRegistry;
//! use skyhook_stream::{Frame, JetstreamSubscription, StreamConfig};
//!
//! # async fn run() -> skyhook_stream::StreamResult<()> {
//! let registry = Arc::new(HealthRegistry::default());
//! let config = StreamConfig::new(["wss://jetstream1.us-east.bsky.network/subscribe"]);
//! let subscription = JetstreamSubscription::connect(
//!     &config,
//!     registry,
//!     Some(Box::new(|frame: &Frame| println!("{} bytes", frame.len()))),
//! )?;
//! subscription.wait_until_stopped().await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

mod backoff;
mod config;
mod error;
mod frame;
mod heartbeat;
mod hooks;
mod jetstream;
mod rotator;
mod supervisor;
mod timer;
mod transport;

pub use backoff::{ReconnectDecision, ReconnectPolicy};
pub use config::{StreamConfig, check_endpoint};
pub use error::{StreamError, StreamResult};
pub use frame::{CloseReason, Frame};
pub use heartbeat::HeartbeatTimer;
pub use hooks::{HookError, HookResult, NoopHooks, StreamHooks};
pub use jetstream::{FrameCallback, JetstreamHooks, JetstreamSubscription};
pub use rotator::{EndpointRotator, Rotation};
pub use supervisor::{ConnectionState, ConnectionSupervisor, SupervisorStatus};
pub use transport::{Outbound, Transport, TransportEvent, TransportLink, WebSocketTransport};
