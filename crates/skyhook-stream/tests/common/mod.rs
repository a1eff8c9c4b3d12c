//! Scripted in-memory transport and recording hooks for supervisor tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use skyhook_stream::{
    CloseReason, Frame, HookResult, Outbound, StreamError, StreamHooks, StreamResult, Transport,
    TransportEvent, TransportLink,
};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing_subscriber::EnvFilter;

/// Route supervisor logs to the test harness. `RUST_LOG` picks the level.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// What the next connection attempt does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Refuse,
    Accept,
    /// Complete the handshake only after this long.
    AcceptAfter(Duration),
}

/// Server side of an accepted connection.
pub struct RemoteEnd {
    pub endpoint: String,
    pub events: mpsc::Sender<TransportEvent>,
    pub outbound: mpsc::Receiver<Outbound>,
}

impl RemoteEnd {
    pub async fn push_text(&self, text: &str) {
        self.events
            .send(TransportEvent::Frame(Frame::text(text)))
            .await
            .unwrap();
    }

    /// Report a socket error without closing.
    pub async fn error(&self, message: &str) {
        let _ = self
            .events
            .send(TransportEvent::Error(StreamError::WebSocketError(
                message.to_string(),
            )))
            .await;
    }

    pub async fn fail(&self, message: &str) {
        self.error(message).await;
        self.close(1006, message).await;
    }

    pub async fn close(&self, code: u16, reason: &str) {
        let _ = self
            .events
            .send(TransportEvent::Closed(CloseReason::new(Some(code), reason)))
            .await;
    }

    /// Everything the client has written so far.
    pub fn drain(&mut self) -> Vec<Outbound> {
        let mut out = Vec::new();
        while let Ok(item) = self.outbound.try_recv() {
            out.push(item);
        }
        out
    }
}

#[derive(Default)]
struct ScriptState {
    script: VecDeque<Outcome>,
    fallback: Option<Outcome>,
    attempts: Vec<(String, Instant)>,
    accepted: Option<mpsc::UnboundedSender<RemoteEnd>>,
    outbound_queue: usize,
}

/// Transport whose connection attempts follow a script.
///
/// When the script runs dry the fallback outcome applies (refuse by default).
#[derive(Clone)]
pub struct ScriptedTransport {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedTransport {
    pub fn new(
        script: impl IntoIterator<Item = Outcome>,
    ) -> (Self, mpsc::UnboundedReceiver<RemoteEnd>) {
        init_tracing();
        let (tx, rx) = mpsc::unbounded_channel();
        let state = ScriptState {
            script: script.into_iter().collect(),
            fallback: Some(Outcome::Refuse),
            accepted: Some(tx),
            outbound_queue: 16,
            ..ScriptState::default()
        };
        (
            Self {
                state: Arc::new(Mutex::new(state)),
            },
            rx,
        )
    }

    pub fn refusing() -> (Self, mpsc::UnboundedReceiver<RemoteEnd>) {
        Self::new([])
    }

    pub fn with_outbound_queue(self, capacity: usize) -> Self {
        self.lock().outbound_queue = capacity;
        self
    }

    pub fn set_fallback(&self, outcome: Outcome) {
        self.lock().fallback = Some(outcome);
    }

    pub fn push(&self, outcome: Outcome) {
        self.lock().script.push_back(outcome);
    }

    /// Endpoints in the order they were dialled.
    pub fn dialled(&self) -> Vec<String> {
        self.lock()
            .attempts
            .iter()
            .map(|(endpoint, _)| endpoint.clone())
            .collect()
    }

    pub fn attempt_count(&self) -> usize {
        self.lock().attempts.len()
    }

    pub fn last_attempt_at(&self) -> Option<Instant> {
        self.lock().attempts.last().map(|(_, at)| *at)
    }

    /// Time between consecutive connection attempts.
    pub fn gaps(&self) -> Vec<Duration> {
        let state = self.lock();
        state
            .attempts
            .windows(2)
            .map(|pair| pair[1].1 - pair[0].1)
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ScriptState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn connect(&self, endpoint: &str) -> StreamResult<TransportLink> {
        let outcome = {
            let mut state = self.lock();
            state.attempts.push((endpoint.to_string(), Instant::now()));
            state
                .script
                .pop_front()
                .or(state.fallback)
                .unwrap_or(Outcome::Refuse)
        };
        if let Outcome::AcceptAfter(delay) = outcome {
            tokio::time::sleep(delay).await;
        }

        match outcome {
            Outcome::Refuse => Err(StreamError::ConnectionFailed(format!(
                "{endpoint}: connection refused"
            ))),
            Outcome::Accept | Outcome::AcceptAfter(_) => {
                let state = self.lock();
                let (event_tx, event_rx) = mpsc::channel(64);
                let (outbound_tx, outbound_rx) = mpsc::channel(state.outbound_queue);
                if let Some(accepted) = &state.accepted {
                    let _ = accepted.send(RemoteEnd {
                        endpoint: endpoint.to_string(),
                        events: event_tx,
                        outbound: outbound_rx,
                    });
                }
                Ok(TransportLink {
                    events: event_rx,
                    outbound: outbound_tx,
                    join_handle: tokio::spawn(async {}),
                })
            }
        }
    }
}

/// Hooks that append one line per callback to a shared log.
#[derive(Clone, Default)]
pub struct RecordingHooks {
    log: Arc<Mutex<Vec<String>>>,
    fail_on: Option<String>,
    panic_on: Option<String>,
}

impl RecordingHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return an error from `on_message` for this payload.
    pub fn failing_on(mut self, payload: &str) -> Self {
        self.fail_on = Some(payload.to_string());
        self
    }

    /// Panic inside `on_message` for this payload.
    pub fn panicking_on(mut self, payload: &str) -> Self {
        self.panic_on = Some(payload.to_string());
        self
    }

    pub fn entries(&self) -> Vec<String> {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, entry: String) {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
    }
}

impl StreamHooks for RecordingHooks {
    fn on_open(&mut self, endpoint: &str) -> HookResult {
        self.record(format!("open {endpoint}"));
        Ok(())
    }

    fn on_message(&mut self, frame: &Frame) -> HookResult {
        let text = frame.as_text().unwrap_or("<binary>").to_string();
        self.record(format!("message {text}"));
        if self.panic_on.as_deref() == Some(text.as_str()) {
            panic!("hook panic on {text}");
        }
        if self.fail_on.as_deref() == Some(text.as_str()) {
            return Err(format!("hook rejected {text}").into());
        }
        Ok(())
    }

    fn on_error(&mut self, error: &StreamError) -> HookResult {
        self.record(format!("error {error}"));
        Ok(())
    }

    fn on_close(&mut self, reason: &CloseReason) -> HookResult {
        self.record(format!("close {}", reason.code.unwrap_or_default()));
        Ok(())
    }
}

/// Let every runnable task make progress. Advances paused time by 1ms.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}
