//! Jetstream firehose subscription.

use std::fmt;
use std::sync::Arc;

use skyhook_health::HealthRegistry;
use tracing::{error, info};

use crate::config::StreamConfig;
use crate::frame::{CloseReason, Frame};
use crate::hooks::{HookResult, StreamHooks};
use crate::supervisor::ConnectionSupervisor;
use crate::transport::{Transport, WebSocketTransport};
use crate::{StreamError, StreamResult};

/// Callback receiving every inbound frame.
pub type FrameCallback = Box<dyn FnMut(&Frame) + Send>;

/// Hooks that log the connection lifecycle and hand frames to a callback.
pub struct JetstreamHooks {
    callback: Option<FrameCallback>,
}

impl JetstreamHooks {
    #[must_use]
    pub fn new(callback: Option<FrameCallback>) -> Self {
        Self { callback }
    }
}

impl fmt::Debug for JetstreamHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JetstreamHooks")
            .field("callback", &self.callback.is_some())
            .finish()
    }
}

impl StreamHooks for JetstreamHooks {
    fn on_open(&mut self, endpoint: &str) -> HookResult {
        info!(endpoint = %endpoint, "Connected to Jetstream server");
        Ok(())
    }

    fn on_message(&mut self, frame: &Frame) -> HookResult {
        if let Some(callback) = self.callback.as_mut() {
            callback(frame);
        }
        Ok(())
    }

    fn on_error(&mut self, error: &StreamError) -> HookResult {
        error!(error = %error, "Jetstream connection error");
        Ok(())
    }

    fn on_close(&mut self, reason: &CloseReason) -> HookResult {
        info!(code = ?reason.code, reason = %reason.reason, "Jetstream connection closed");
        Ok(())
    }
}

/// A running subscription to one or more Jetstream endpoints.
///
/// Connecting starts as soon as the subscription is built.
#[derive(Debug)]
pub struct JetstreamSubscription {
    supervisor: ConnectionSupervisor,
}

impl JetstreamSubscription {
    /// Subscribe over WebSocket, forwarding frames to `callback`.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::InvalidConfig`] if `config` fails validation.
    pub fn connect(
        config: &StreamConfig,
        registry: Arc<HealthRegistry>,
        callback: Option<FrameCallback>,
    ) -> StreamResult<Self> {
        Self::with_transport(config, WebSocketTransport::new(config), registry, callback)
    }

    /// Subscribe over a caller-supplied transport.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::InvalidConfig`] if `config` fails validation.
    pub fn with_transport<T: Transport>(
        config: &StreamConfig,
        transport: T,
        registry: Arc<HealthRegistry>,
        callback: Option<FrameCallback>,
    ) -> StreamResult<Self> {
        let supervisor =
            ConnectionSupervisor::new(config, transport, JetstreamHooks::new(callback), registry)?;
        supervisor.start();
        Ok(Self { supervisor })
    }

    #[must_use]
    pub const fn supervisor(&self) -> &ConnectionSupervisor {
        &self.supervisor
    }

    pub async fn close(&self) {
        self.supervisor.close().await;
    }
}

impl std::ops::Deref for JetstreamSubscription {
    type Target = ConnectionSupervisor;

    fn deref(&self) -> &Self::Target {
        &self.supervisor
    }
}
