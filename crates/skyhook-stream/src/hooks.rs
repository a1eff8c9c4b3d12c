//! Lifecycle callbacks invoked by the supervisor.
//!
//! Hooks run on the supervisor's event loop, one at a time and in event order.
//! A hook that returns an error or panics is logged and otherwise ignored: the
//! connection keeps going and the next event is delivered as usual.

use std::panic::{self, AssertUnwindSafe};

use tracing::error;

use crate::StreamError;
use crate::frame::{CloseReason, Frame};

/// Error type hooks may return.
pub type HookError = Box<dyn std::error::Error + Send + Sync>;

/// Result type for hooks.
pub type HookResult = Result<(), HookError>;

/// Connection lifecycle callbacks. Every method defaults to a no-op.
pub trait StreamHooks: Send + 'static {
    /// The transport finished its handshake.
    fn on_open(&mut self, endpoint: &str) -> HookResult {
        let _ = endpoint;
        Ok(())
    }

    /// An inbound data frame arrived.
    fn on_message(&mut self, frame: &Frame) -> HookResult {
        let _ = frame;
        Ok(())
    }

    /// The transport reported an error. A close event follows.
    fn on_error(&mut self, error: &StreamError) -> HookResult {
        let _ = error;
        Ok(())
    }

    /// The connection ended.
    fn on_close(&mut self, reason: &CloseReason) -> HookResult {
        let _ = reason;
        Ok(())
    }
}

/// Hooks that do nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHooks;

impl StreamHooks for NoopHooks {}

/// Run one hook, logging (and swallowing) errors and panics.
///
/// Returns `true` if the hook completed successfully.
pub(crate) fn guarded<F>(hook: &'static str, probe: &str, call: F) -> bool
where
    F: FnOnce() -> HookResult,
{
    match panic::catch_unwind(AssertUnwindSafe(call)) {
        Ok(Ok(())) => true,
        Ok(Err(err)) => {
            error!(hook, probe = %probe, error = %err, "Stream hook failed");
            false
        }
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic payload".to_string());
            error!(hook, probe = %probe, panic = %message, "Stream hook panicked");
            false
        }
    }
}
