//! Streaming error types.

use std::time::Duration;

/// Streaming errors.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// Connection attempt failed (refused, DNS, handshake).
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Connection closed unexpectedly.
    #[error("Connection closed: {reason}")]
    ConnectionClosed {
        /// Close reason.
        reason: String,
        /// WebSocket close code, when the peer sent one.
        code: Option<u16>,
    },

    /// Connection attempt did not finish in time.
    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    /// Endpoint is not a usable `ws://` or `wss://` URL.
    #[error("Invalid endpoint {endpoint}: {reason}")]
    InvalidEndpoint {
        /// Offending endpoint.
        endpoint: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Configuration rejected by validation.
    #[error("Invalid stream configuration: {}", .0.join("; "))]
    InvalidConfig(Vec<String>),

    /// Every endpoint was retried for the full cycle budget.
    #[error("All {endpoints} endpoints exhausted after {cycles} service cycles")]
    EndpointsExhausted {
        /// Size of the endpoint set.
        endpoints: usize,
        /// Completed passes over the endpoint set.
        cycles: u32,
    },

    /// WebSocket protocol or socket error.
    #[error("WebSocket error: {0}")]
    WebSocketError(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for streaming operations.
pub type StreamResult<T> = Result<T, StreamError>;
