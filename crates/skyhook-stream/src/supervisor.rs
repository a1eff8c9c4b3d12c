//! Connection supervisor.
//!
//! [`ConnectionSupervisor`] is a cheap handle onto an event loop task that owns
//! one logical connection. Public calls, transport events and timer ticks are
//! all funnelled into that task through channels, so lifecycle transitions run
//! strictly one after another:
//!
//! ```text
//! Disconnected --start()--> Connecting --open--> Connected
//!      ^                        |                   |
//!      |                   connect error        close/error
//!      +---- retry timer <------+-------------------+
//!                               |
//!                        budget exhausted --> Failed
//! close() from any state --> Closing
//! ```
//!
//! The loop publishes a [`SupervisorStatus`] snapshot through a `watch` channel
//! after every transition; the query methods on the handle read that snapshot.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use skyhook_health::HealthRegistry;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::backoff::{ReconnectDecision, ReconnectPolicy};
use crate::config::StreamConfig;
use crate::frame::{CloseReason, Frame};
use crate::heartbeat::HeartbeatTimer;
use crate::hooks::{self, StreamHooks};
use crate::rotator::EndpointRotator;
use crate::timer::EpochTimer;
use crate::transport::{Outbound, Transport, TransportEvent, TransportLink, WebSocketTransport};
use crate::{StreamError, StreamResult};

// ─────────────────────────────────────────────────────────────────────────────
// State and status snapshot
// ─────────────────────────────────────────────────────────────────────────────

/// Lifecycle state of a supervised connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    /// `close()` was called. Terminal.
    Closing,
    /// Every endpoint was retried for the full cycle budget. Terminal.
    Failed,
}

impl ConnectionState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "DISCONNECTED",
            Self::Connecting => "CONNECTING",
            Self::Connected => "CONNECTED",
            Self::Closing => "CLOSING",
            Self::Failed => "FAILED",
        }
    }

    /// No further connection attempts happen from this state.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Closing | Self::Failed)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time view of a supervisor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SupervisorStatus {
    pub state: ConnectionState,
    /// Index of the endpoint currently targeted.
    pub endpoint_index: usize,
    pub reconnect_attempts: u32,
    pub service_cycles: u32,
    pub messages_received: u64,
    pub last_message_at: Option<DateTime<Utc>>,
    pub pings_sent: u64,
}

// ─────────────────────────────────────────────────────────────────────────────
// Handle
// ─────────────────────────────────────────────────────────────────────────────

enum Command {
    Start,
    Close(oneshot::Sender<()>),
}

/// Handle to a supervised, self-healing connection.
///
/// Dropping the handle without calling [`ConnectionSupervisor::close`] runs
/// the same shutdown sequence in the background.
pub struct ConnectionSupervisor {
    commands: mpsc::UnboundedSender<Command>,
    status: watch::Receiver<SupervisorStatus>,
    outbound: watch::Receiver<Option<mpsc::Sender<Outbound>>>,
    endpoints: Arc<[String]>,
    probe_name: String,
    shutdown: Arc<AtomicBool>,
}

impl fmt::Debug for ConnectionSupervisor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionSupervisor")
            .field("probe_name", &self.probe_name)
            .field("endpoints", &self.endpoints)
            .field("status", &*self.status.borrow())
            .finish_non_exhaustive()
    }
}

impl ConnectionSupervisor {
    /// Build a supervisor over `transport` and register its health probe.
    ///
    /// The supervisor stays `Disconnected` until [`ConnectionSupervisor::start`].
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::InvalidConfig`] if `config` fails validation.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    pub fn new<T, H>(
        config: &StreamConfig,
        transport: T,
        hooks: H,
        registry: Arc<HealthRegistry>,
    ) -> StreamResult<Self>
    where
        T: Transport,
        H: StreamHooks,
    {
        config.validate()?;
        let rotator = EndpointRotator::new(config.endpoints.clone())?;
        let endpoints = rotator.endpoints();
        let probe_name = unique_probe_name(&registry);
        let metrics = ProbeMetrics::new(&probe_name);

        let (status_tx, status_rx) = watch::channel(SupervisorStatus::default());
        let (outbound_tx, outbound_rx) = watch::channel(None);
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let shutdown = Arc::new(AtomicBool::new(false));

        let probe_status = status_rx.clone();
        registry.register_fn(probe_name.clone(), move || {
            let connected = probe_status.borrow().state == ConnectionState::Connected;
            async move { connected }
        });
        registry.set_metric(metrics.messages_received.clone(), 0.0);
        registry.set_metric(metrics.reconnect_attempts.clone(), 0.0);

        info!(
            probe = %probe_name,
            endpoints = endpoints.len(),
            ping_interval_ms = config.ping_interval_ms,
            "Stream supervisor created"
        );

        let event_loop = SupervisorLoop {
            transport: Arc::new(transport),
            hooks,
            policy: config.reconnect_policy(),
            rotator,
            registry,
            probe_name: probe_name.clone(),
            metrics,
            shutdown: Arc::clone(&shutdown),
            state: ConnectionState::Disconnected,
            reconnect_attempts: 0,
            messages_received: 0,
            last_message_at: None,
            pings_sent: 0,
            generation: 0,
            link: None,
            connect_task: None,
            heartbeat: HeartbeatTimer::new(config.ping_interval()),
            reconnect: EpochTimer::default(),
            events: event_tx,
            status: status_tx,
            outbound: outbound_tx,
        };
        tokio::spawn(event_loop.run(command_rx, event_rx));

        Ok(Self {
            commands: command_tx,
            status: status_rx,
            outbound: outbound_rx,
            endpoints,
            probe_name,
            shutdown,
        })
    }

    /// Build a supervisor over the WebSocket transport.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::InvalidConfig`] if `config` fails validation.
    pub fn websocket<H: StreamHooks>(
        config: &StreamConfig,
        hooks: H,
        registry: Arc<HealthRegistry>,
    ) -> StreamResult<Self> {
        Self::new(config, WebSocketTransport::new(config), hooks, registry)
    }

    /// Begin connecting to the current endpoint. Returns immediately.
    ///
    /// Ignored while connecting or connected, and after the supervisor has
    /// closed or failed. A pending reconnect is replaced by an immediate attempt.
    pub fn start(&self) {
        if self.commands.send(Command::Start).is_err() {
            debug!(probe = %self.probe_name, "start() after shutdown ignored");
        }
    }

    /// Queue a frame on the open connection without blocking.
    ///
    /// Returns `false` when not connected or when the outbound queue is full.
    pub fn send(&self, payload: impl Into<Frame>) -> bool {
        if self.state() != ConnectionState::Connected {
            debug!(probe = %self.probe_name, state = %self.state(), "send() while not connected");
            return false;
        }
        let Some(outbound) = self.outbound.borrow().clone() else {
            return false;
        };
        match outbound.try_send(Outbound::Frame(payload.into())) {
            Ok(()) => true,
            Err(err) => {
                warn!(probe = %self.probe_name, error = %err, "Outbound frame rejected");
                false
            }
        }
    }

    /// Shut down permanently: no further reconnects, heartbeat stopped, pending
    /// retry cancelled, transport closed and health probe removed.
    ///
    /// Idempotent. Resolves once the event loop has finished the shutdown.
    pub async fn close(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.commands.send(Command::Close(ack_tx)).is_ok() {
            let _ = ack_rx.await;
        }
    }

    /// Resolve when the supervisor reaches a terminal state.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::EndpointsExhausted`] if it ended in `Failed`.
    pub async fn wait_until_stopped(&self) -> StreamResult<()> {
        let mut status = self.status.clone();
        loop {
            {
                let snapshot = status.borrow_and_update();
                if snapshot.state.is_terminal() {
                    return self.terminal_result(&snapshot);
                }
            }
            if status.changed().await.is_err() {
                let snapshot = status.borrow();
                return self.terminal_result(&snapshot);
            }
        }
    }

    fn terminal_result(&self, status: &SupervisorStatus) -> StreamResult<()> {
        if status.state == ConnectionState::Failed {
            Err(StreamError::EndpointsExhausted {
                endpoints: self.endpoints.len(),
                cycles: status.service_cycles,
            })
        } else {
            Ok(())
        }
    }

    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.status.borrow().state
    }

    #[must_use]
    pub fn status(&self) -> SupervisorStatus {
        self.status.borrow().clone()
    }

    /// Watch every status change, including the terminal `Failed` state.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SupervisorStatus> {
        self.status.clone()
    }

    #[must_use]
    pub fn endpoint_index(&self) -> usize {
        self.status.borrow().endpoint_index
    }

    #[must_use]
    pub fn current_endpoint(&self) -> &str {
        &self.endpoints[self.endpoint_index()]
    }

    #[must_use]
    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    #[must_use]
    pub fn reconnect_attempts(&self) -> u32 {
        self.status.borrow().reconnect_attempts
    }

    #[must_use]
    pub fn service_cycles(&self) -> u32 {
        self.status.borrow().service_cycles
    }

    #[must_use]
    pub fn message_count(&self) -> u64 {
        self.status.borrow().messages_received
    }

    #[must_use]
    pub fn last_message_time(&self) -> Option<DateTime<Utc>> {
        self.status.borrow().last_message_at
    }

    /// Name of the health probe registered for this supervisor.
    #[must_use]
    pub fn probe_name(&self) -> &str {
        &self.probe_name
    }

    /// Metric keys registered next to the probe.
    #[must_use]
    pub fn metric_names(&self) -> (String, String) {
        let metrics = ProbeMetrics::new(&self.probe_name);
        (metrics.messages_received, metrics.reconnect_attempts)
    }
}

impl Drop for ConnectionSupervisor {
    fn drop(&mut self) {
        // The loop sees the closed command channel and shuts down.
        self.shutdown.store(true, Ordering::SeqCst);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Event loop
// ─────────────────────────────────────────────────────────────────────────────

enum Event {
    Connected {
        generation: u64,
        result: StreamResult<TransportLink>,
    },
    ReconnectDue {
        epoch: u64,
    },
    HeartbeatTick {
        epoch: u64,
    },
}

struct ProbeMetrics {
    messages_received: String,
    reconnect_attempts: String,
}

impl ProbeMetrics {
    fn new(probe: &str) -> Self {
        Self {
            messages_received: format!("{probe}_messages_received"),
            reconnect_attempts: format!("{probe}_reconnect_attempts"),
        }
    }
}

/// The open connection. Its event receiver is polled directly by the loop, so
/// a slow hook leaves frames in the transport's bounded queue and the socket
/// reader waits.
struct ActiveLink {
    events: mpsc::Receiver<TransportEvent>,
    outbound: mpsc::Sender<Outbound>,
    socket: JoinHandle<()>,
}

struct SupervisorLoop<T, H> {
    transport: Arc<T>,
    hooks: H,
    policy: ReconnectPolicy,
    rotator: EndpointRotator,
    registry: Arc<HealthRegistry>,
    probe_name: String,
    metrics: ProbeMetrics,
    shutdown: Arc<AtomicBool>,

    state: ConnectionState,
    reconnect_attempts: u32,
    messages_received: u64,
    last_message_at: Option<DateTime<Utc>>,
    pings_sent: u64,

    /// Bumped per connection attempt; events from older attempts are dropped.
    generation: u64,
    link: Option<ActiveLink>,
    connect_task: Option<JoinHandle<()>>,
    heartbeat: HeartbeatTimer,
    reconnect: EpochTimer,

    events: mpsc::UnboundedSender<Event>,
    status: watch::Sender<SupervisorStatus>,
    outbound: watch::Sender<Option<mpsc::Sender<Outbound>>>,
}

impl<T: Transport, H: StreamHooks> SupervisorLoop<T, H> {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut events: mpsc::UnboundedReceiver<Event>,
    ) {
        loop {
            tokio::select! {
                biased;

                command = commands.recv() => match command {
                    Some(Command::Start) => self.handle_start(),
                    Some(Command::Close(ack)) => {
                        self.shutdown("close requested");
                        let _ = ack.send(());
                        break;
                    }
                    None => {
                        self.shutdown("handle dropped");
                        break;
                    }
                },
                Some(event) = events.recv() => self.handle_event(event),
                event = next_link_event(&mut self.link) => self.handle_transport(event),
            }
        }
    }

    fn handle_start(&mut self) {
        match self.state {
            ConnectionState::Connecting | ConnectionState::Connected => {
                debug!(probe = %self.probe_name, state = %self.state, "start() ignored; already active");
            }
            ConnectionState::Closing | ConnectionState::Failed => {
                warn!(probe = %self.probe_name, state = %self.state, "start() ignored; supervisor is terminal");
            }
            ConnectionState::Disconnected => {
                if self.reconnect.cancel() {
                    debug!(probe = %self.probe_name, "Pending reconnect replaced by start()");
                }
                self.connect();
            }
        }
    }

    fn handle_event(&mut self, event: Event) {
        if self.shutdown.load(Ordering::SeqCst) {
            return;
        }

        match event {
            Event::Connected { generation, result } => self.handle_connected(generation, result),
            Event::ReconnectDue { epoch } => {
                if !self.reconnect.take_if_current(epoch) {
                    debug!(probe = %self.probe_name, epoch, "Ignoring stale reconnect timer");
                    return;
                }
                if self.state == ConnectionState::Disconnected {
                    self.connect();
                }
            }
            Event::HeartbeatTick { epoch } => self.handle_heartbeat(epoch),
        }
    }

    fn handle_transport(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Frame(frame) => self.handle_frame(&frame),
            TransportEvent::Pong => {
                debug!(probe = %self.probe_name, "Heartbeat acknowledged");
            }
            TransportEvent::Error(err) => self.handle_error(&err),
            TransportEvent::Closed(reason) => self.handle_close(&reason),
        }
    }

    // ── Connection attempts ──────────────────────────────────────────────────

    fn connect(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        let generation = self.generation;
        let endpoint = self.rotator.current().to_string();
        self.set_state(ConnectionState::Connecting);

        info!(
            probe = %self.probe_name,
            endpoint = %endpoint,
            endpoint_index = self.rotator.index(),
            attempt = self.reconnect_attempts,
            cycle = self.rotator.cycles(),
            "Connecting to stream endpoint"
        );

        let transport = Arc::clone(&self.transport);
        let events = self.events.clone();
        let task = tokio::spawn(async move {
            let result = transport.connect(&endpoint).await;
            let _ = events.send(Event::Connected { generation, result });
        });
        if let Some(previous) = self.connect_task.replace(task) {
            previous.abort();
        }
    }

    fn handle_connected(&mut self, generation: u64, result: StreamResult<TransportLink>) {
        if generation != self.generation || self.state != ConnectionState::Connecting {
            // Dropping a stale link closes its socket.
            debug!(probe = %self.probe_name, generation, "Discarding stale connection result");
            return;
        }
        self.connect_task = None;

        match result {
            Ok(link) => self.handle_open(link),
            Err(err) => {
                warn!(
                    probe = %self.probe_name,
                    endpoint = %self.rotator.current(),
                    error = %err,
                    "Connection attempt failed"
                );
                self.handle_error(&err);
                self.handle_close(&CloseReason::abnormal(err.to_string()));
            }
        }
    }

    fn handle_open(&mut self, link: TransportLink) {
        let TransportLink {
            events,
            outbound,
            join_handle,
        } = link;
        self.outbound.send_replace(Some(outbound.clone()));
        self.link = Some(ActiveLink {
            events,
            outbound,
            socket: join_handle,
        });

        self.reconnect_attempts = 0;
        self.rotator.reset_cycles();
        let events = self.events.clone();
        self.heartbeat
            .start(move |epoch| events.send(Event::HeartbeatTick { epoch }).is_ok());
        self.set_state(ConnectionState::Connected);

        let endpoint = self.rotator.current().to_string();
        info!(probe = %self.probe_name, endpoint = %endpoint, "Stream connected");
        hooks::guarded("on_open", &self.probe_name, || self.hooks.on_open(&endpoint));
        self.registry
            .set_metric(self.metrics.reconnect_attempts.as_str(), 0.0);
    }

    // ── Connection events ────────────────────────────────────────────────────

    fn handle_frame(&mut self, frame: &Frame) {
        self.messages_received = self.messages_received.saturating_add(1);
        self.last_message_at = Some(Utc::now());
        self.registry
            .increment_metric(&self.metrics.messages_received);
        hooks::guarded("on_message", &self.probe_name, || self.hooks.on_message(frame));
        self.publish();
    }

    fn handle_error(&mut self, err: &StreamError) {
        if self.heartbeat.stop() {
            debug!(probe = %self.probe_name, "Heartbeat stopped after transport error");
        }
        warn!(
            probe = %self.probe_name,
            endpoint = %self.rotator.current(),
            error = %err,
            "Stream transport error"
        );
        hooks::guarded("on_error", &self.probe_name, || self.hooks.on_error(err));
    }

    fn handle_close(&mut self, reason: &CloseReason) {
        self.heartbeat.stop();
        self.link = None;
        self.outbound.send_replace(None);
        self.set_state(ConnectionState::Disconnected);

        info!(
            probe = %self.probe_name,
            endpoint = %self.rotator.current(),
            code = ?reason.code,
            reason = %reason.reason,
            "Stream disconnected"
        );
        hooks::guarded("on_close", &self.probe_name, || self.hooks.on_close(reason));

        if self.shutdown.load(Ordering::SeqCst) {
            return;
        }
        self.schedule_reconnect();
    }

    fn handle_heartbeat(&mut self, epoch: u64) {
        if !self.heartbeat.accepts(epoch) || self.state != ConnectionState::Connected {
            return;
        }
        let Some(link) = &self.link else {
            return;
        };
        match link.outbound.try_send(Outbound::Ping) {
            Ok(()) => {
                self.pings_sent = self.pings_sent.saturating_add(1);
                debug!(probe = %self.probe_name, pings_sent = self.pings_sent, "Heartbeat ping queued");
                self.publish();
            }
            Err(err) => {
                debug!(probe = %self.probe_name, error = %err, "Heartbeat skipped");
            }
        }
    }

    // ── Reconnect policy ─────────────────────────────────────────────────────

    fn schedule_reconnect(&mut self) {
        let decision = self
            .policy
            .on_disconnect(&mut self.reconnect_attempts, &mut self.rotator);

        let attempts_metric = match decision {
            ReconnectDecision::Retry { attempt, .. } => attempt,
            ReconnectDecision::Rotate { .. } => self.policy.max_attempts(),
            ReconnectDecision::GiveUp { .. } => self.reconnect_attempts,
        };
        self.registry.set_metric(
            self.metrics.reconnect_attempts.as_str(),
            f64::from(attempts_metric),
        );

        match decision {
            ReconnectDecision::Retry { attempt, delay } => {
                info!(
                    probe = %self.probe_name,
                    endpoint = %self.rotator.current(),
                    attempt,
                    max_attempts = self.policy.max_attempts(),
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "Scheduling reconnect"
                );
                let events = self.events.clone();
                let shutdown = Arc::clone(&self.shutdown);
                self.reconnect.arm_once(delay, move |epoch| {
                    if !shutdown.load(Ordering::SeqCst) {
                        let _ = events.send(Event::ReconnectDue { epoch });
                    }
                });
                self.publish();
            }
            ReconnectDecision::Rotate { from, to, cycle } => {
                info!(
                    probe = %self.probe_name,
                    from = %self.endpoint_at(from),
                    to = %self.endpoint_at(to),
                    cycle,
                    max_cycles = self.policy.max_cycles(),
                    "Endpoint retry budget spent; switching endpoint"
                );
                self.reconnect.cancel();
                self.connect();
            }
            ReconnectDecision::GiveUp { cycles } => {
                self.reconnect.cancel();
                let err = StreamError::EndpointsExhausted {
                    endpoints: self.rotator.len(),
                    cycles,
                };
                error!(
                    probe = %self.probe_name,
                    error = %err,
                    "All stream endpoints exhausted; restart or reconfigure to recover"
                );
                self.set_state(ConnectionState::Failed);
            }
        }
    }

    // ── Shutdown ─────────────────────────────────────────────────────────────

    fn shutdown(&mut self, cause: &'static str) {
        self.shutdown.store(true, Ordering::SeqCst);
        let cancelled_retry = self.reconnect.cancel();
        self.heartbeat.stop();
        if let Some(task) = self.connect_task.take() {
            task.abort();
        }
        self.generation = self.generation.wrapping_add(1);
        self.outbound.send_replace(None);

        if let Some(link) = self.link.take() {
            if link.outbound.try_send(Outbound::Close).is_err() {
                link.socket.abort();
            }
            let reason = CloseReason::local();
            hooks::guarded("on_close", &self.probe_name, || self.hooks.on_close(&reason));
        }

        self.registry.unregister(&self.probe_name);
        self.registry.remove_metric(&self.metrics.messages_received);
        self.registry.remove_metric(&self.metrics.reconnect_attempts);

        if self.state != ConnectionState::Failed {
            self.state = ConnectionState::Closing;
        }
        self.publish();
        info!(
            probe = %self.probe_name,
            cause,
            cancelled_retry,
            state = %self.state,
            "Stream supervisor shut down"
        );
    }

    // ── Helpers ──────────────────────────────────────────────────────────────

    fn endpoint_at(&self, index: usize) -> String {
        self.rotator
            .endpoints()
            .get(index)
            .cloned()
            .unwrap_or_default()
    }

    fn set_state(&mut self, state: ConnectionState) {
        if self.state != state {
            debug!(probe = %self.probe_name, from = %self.state, to = %state, "State transition");
        }
        self.state = state;
        self.publish();
    }

    fn publish(&self) {
        self.status.send_replace(SupervisorStatus {
            state: self.state,
            endpoint_index: self.rotator.index(),
            reconnect_attempts: self.reconnect_attempts,
            service_cycles: self.rotator.cycles(),
            messages_received: self.messages_received,
            last_message_at: self.last_message_at,
            pings_sent: self.pings_sent,
        });
    }
}

/// Next event from the open link. Pending forever while there is none.
async fn next_link_event(link: &mut Option<ActiveLink>) -> TransportEvent {
    let Some(link) = link else {
        return std::future::pending().await;
    };
    link.events
        .recv()
        .await
        .unwrap_or_else(|| TransportEvent::Closed(CloseReason::abnormal("transport task ended")))
}

/// `websocket_<unix millis>_<5 base-36 chars>`, unique within `registry`.
fn unique_probe_name(registry: &HealthRegistry) -> String {
    loop {
        let name = probe_name();
        if !registry.is_registered(&name) {
            return name;
        }
    }
}

fn probe_name() -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::thread_rng();
    let suffix: String = (0..5)
        .map(|_| char::from(ALPHABET[rng.gen_range(0..ALPHABET.len())]))
        .collect();
    format!("websocket_{}_{suffix}", Utc::now().timestamp_millis())
}
