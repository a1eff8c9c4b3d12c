//! Transport abstraction and the WebSocket implementation.
//!
//! A [`Transport`] turns an endpoint string into a [`TransportLink`]: a pair of
//! channels backed by a socket task. The supervisor never touches the socket
//! directly; it reads [`TransportEvent`]s and writes [`Outbound`] commands.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, warn};

use crate::config::{StreamConfig, check_endpoint};
use crate::frame::{CloseReason, Frame};
use crate::{StreamError, StreamResult};

const EVENT_QUEUE: usize = 256;

/// Something the socket task observed.
#[derive(Debug)]
pub enum TransportEvent {
    Frame(Frame),
    /// Reply to a keepalive ping.
    Pong,
    /// Socket-level failure. Always followed by [`TransportEvent::Closed`].
    Error(StreamError),
    /// The connection is gone; no further events follow.
    Closed(CloseReason),
}

/// Command for the socket task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Frame(Frame),
    Ping,
    Close,
}

/// Live connection handed back by [`Transport::connect`].
#[derive(Debug)]
pub struct TransportLink {
    pub events: mpsc::Receiver<TransportEvent>,
    pub outbound: mpsc::Sender<Outbound>,
    pub join_handle: JoinHandle<()>,
}

/// Opens connections to endpoints.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Connect to `endpoint`, returning once the handshake has completed.
    async fn connect(&self, endpoint: &str) -> StreamResult<TransportLink>;
}

// ─────────────────────────────────────────────────────────────────────────────
// WebSocket transport
// ─────────────────────────────────────────────────────────────────────────────

/// `tokio-tungstenite` backed transport for `ws://` and `wss://` endpoints.
#[derive(Debug, Clone)]
pub struct WebSocketTransport {
    connect_timeout: Duration,
    outbound_queue: usize,
}

impl Default for WebSocketTransport {
    fn default() -> Self {
        Self::new(&StreamConfig::default())
    }
}

impl WebSocketTransport {
    #[must_use]
    pub const fn new(config: &StreamConfig) -> Self {
        Self {
            connect_timeout: config.connect_timeout(),
            outbound_queue: config.outbound_queue,
        }
    }

    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn connect(&self, endpoint: &str) -> StreamResult<TransportLink> {
        let url = check_endpoint(endpoint)?;

        let connect_result =
            tokio::time::timeout(self.connect_timeout, connect_async(url.as_str())).await;
        let Ok(ws_result) = connect_result else {
            return Err(StreamError::Timeout(self.connect_timeout));
        };
        let (ws_stream, response) = ws_result.map_err(map_ws_error)?;
        debug!(
            endpoint = %endpoint,
            status = response.status().as_u16(),
            "WebSocket handshake complete"
        );

        let (event_tx, event_rx) = mpsc::channel(EVENT_QUEUE);
        let (outbound_tx, outbound_rx) = mpsc::channel(self.outbound_queue.max(1));
        let join_handle = tokio::spawn(run_socket(ws_stream, event_tx, outbound_rx));

        Ok(TransportLink {
            events: event_rx,
            outbound: outbound_tx,
            join_handle,
        })
    }
}

fn map_ws_error(err: tokio_tungstenite::tungstenite::Error) -> StreamError {
    use tokio_tungstenite::tungstenite::Error;
    match err {
        Error::Io(io) => StreamError::IoError(io),
        Error::ConnectionClosed | Error::AlreadyClosed => StreamError::ConnectionClosed {
            reason: err.to_string(),
            code: None,
        },
        Error::Http(response) => StreamError::ConnectionFailed(format!(
            "handshake rejected with HTTP {}",
            response.status()
        )),
        other => StreamError::WebSocketError(other.to_string()),
    }
}

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Pump one socket until it closes, the peer goes away, or the supervisor
/// drops its end of the event channel.
async fn run_socket(
    socket: Socket,
    events: mpsc::Sender<TransportEvent>,
    mut outbound: mpsc::Receiver<Outbound>,
) {
    let (mut write, mut read) = socket.split();

    let reason = loop {
        tokio::select! {
            inbound = read.next() => match inbound {
                Some(Ok(Message::Text(text))) => {
                    let frame = Frame::Text(text.to_string());
                    if events.send(TransportEvent::Frame(frame)).await.is_err() {
                        let _ = write.close().await;
                        return;
                    }
                }
                Some(Ok(Message::Binary(data))) => {
                    let frame = Frame::Binary(data.to_vec());
                    if events.send(TransportEvent::Frame(frame)).await.is_err() {
                        let _ = write.close().await;
                        return;
                    }
                }
                Some(Ok(Message::Pong(_))) => {
                    let _ = events.send(TransportEvent::Pong).await;
                }
                // tungstenite answers pings itself.
                Some(Ok(Message::Ping(_) | Message::Frame(_))) => {}
                Some(Ok(Message::Close(frame))) => break CloseReason::from(frame),
                Some(Err(err)) => {
                    let reason = CloseReason::abnormal(err.to_string());
                    let _ = events.send(TransportEvent::Error(map_ws_error(err))).await;
                    break reason;
                }
                None => break CloseReason::abnormal("stream ended"),
            },
            command = outbound.recv() => match command {
                Some(Outbound::Frame(frame)) => {
                    if let Err(err) = write.send(frame.into()).await {
                        let reason = CloseReason::abnormal(err.to_string());
                        let _ = events.send(TransportEvent::Error(map_ws_error(err))).await;
                        break reason;
                    }
                }
                Some(Outbound::Ping) => {
                    if let Err(err) = write.send(Message::Ping(Vec::new().into())).await {
                        debug!(error = %err, "Keepalive ping failed");
                    }
                }
                Some(Outbound::Close) | None => {
                    if let Err(err) = write.close().await {
                        warn!(error = %err, "Failed to send close frame");
                    }
                    break CloseReason::local();
                }
            },
        }
    };

    let _ = events.send(TransportEvent::Closed(reason)).await;
}
