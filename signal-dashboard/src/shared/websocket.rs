/// WebSocket connection manager for the signal backend
///
/// Owns at most one live socket. Each connection runs in its own task ("session")
/// and reports back over a channel; the socket itself never leaves that task.
/// There is no automatic reconnection: after a failure the user reconnects.

use crate::shared::{error::DashboardError, types::StreamParams};
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};
use url::Url;

/// WebSocket client configuration
#[derive(Debug, Clone)]
pub struct WebSocketConfig {
    /// Signal backend endpoint, without stream query parameters
    pub url: Url,
    /// Ping interval to keep connection alive
    pub ping_interval: Duration,
    /// Maximum channel buffer size for session events
    pub channel_buffer_size: usize,
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            url: Url::parse(crate::shared::config::DEFAULT_WS_URL).expect("default url is valid"),
            ping_interval: Duration::from_secs(30),
            channel_buffer_size: 1000,
        }
    }
}

impl WebSocketConfig {
    /// Create a new configuration with custom URL
    pub fn new(url: Url) -> Self {
        Self {
            url,
            ..Default::default()
        }
    }

    /// Set ping interval; zero disables the keepalive
    pub fn with_ping_interval(mut self, interval: Duration) -> Self {
        self.ping_interval = interval;
        self
    }

    /// Set channel buffer size
    pub fn with_channel_buffer_size(mut self, size: usize) -> Self {
        self.channel_buffer_size = size;
        self
    }

    /// Endpoint for one stream, e.g. `ws://host/ws?symbol=BTCUSDT&interval=1m&strategy=rsi_macd`
    pub fn stream_url(&self, params: &StreamParams) -> Url {
        let mut url = self.url.clone();
        url.query_pairs_mut()
            .clear()
            .append_pair("symbol", &params.symbol)
            .append_pair("interval", params.interval.as_str())
            .append_pair("strategy", params.strategy.as_str());
        url
    }
}

/// Lifecycle of the (single) connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Connecting,
    Open,
    Closed,
    Errored,
}

/// Named transitions between [`ConnectionState`]s
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Start dialling the backend
    Dial,
    /// Handshake completed
    Established,
    /// Clean close by either side
    Shutdown,
    /// Transport failure
    Fault,
}

impl ConnectionState {
    /// State after `transition`, or `None` if the transition is illegal from here
    pub fn apply(self, transition: Transition) -> Option<ConnectionState> {
        use ConnectionState::*;
        match (self, transition) {
            (Idle | Closed | Errored, Transition::Dial) => Some(Connecting),
            (Connecting, Transition::Established) => Some(Open),
            (Connecting | Open, Transition::Shutdown) => Some(Closed),
            (Connecting | Open, Transition::Fault) => Some(Errored),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Idle => "IDLE",
            ConnectionState::Connecting => "CONNECTING",
            ConnectionState::Open => "LIVE",
            ConnectionState::Closed => "CLOSED",
            ConnectionState::Errored => "ERROR",
        }
    }

    /// A socket is being dialled or is open
    pub fn is_active(&self) -> bool {
        matches!(self, ConnectionState::Connecting | ConnectionState::Open)
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Event reported by a session task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEvent {
    session: u64,
    kind: SessionEventKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SessionEventKind {
    Opened,
    Frame(String),
    Closed,
    Failed(DashboardError),
}

/// Accepted event of the current session, after the state machine has been updated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionUpdate {
    Opened,
    /// Raw text frame, still to be decoded
    Frame(String),
    Closed,
    Failed(DashboardError),
}

#[derive(Debug)]
struct ActiveSession {
    shutdown_tx: oneshot::Sender<()>,
}

/// Owner of the single connection to the signal backend
#[derive(Debug)]
pub struct ConnectionManager {
    config: WebSocketConfig,
    state: ConnectionState,
    session: u64,
    active: Option<ActiveSession>,
    event_tx: mpsc::Sender<SessionEvent>,
}

impl ConnectionManager {
    /// Create a manager and the receiver its session events arrive on
    ///
    /// Events must be fed back through [`ConnectionManager::handle_event`].
    pub fn new(config: WebSocketConfig) -> (Self, mpsc::Receiver<SessionEvent>) {
        let (event_tx, event_rx) = mpsc::channel(config.channel_buffer_size);
        let manager = Self {
            config,
            state: ConnectionState::Idle,
            session: 0,
            active: None,
            event_tx,
        };
        (manager, event_rx)
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Open a connection for `params`, closing any existing one first
    ///
    /// Must be called from within a tokio runtime.
    pub fn connect(&mut self, params: &StreamParams) {
        if self.state.is_active() {
            self.close();
        }
        if !self.transition(Transition::Dial) {
            return;
        }

        self.session += 1;
        let url = self.config.stream_url(params);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        self.active = Some(ActiveSession { shutdown_tx });

        tokio::spawn(run_session(
            url,
            self.session,
            self.config.ping_interval,
            self.event_tx.clone(),
            shutdown_rx,
        ));
    }

    /// Close the current connection, if any
    ///
    /// Frames of the closed session that are still in flight are discarded.
    pub fn close(&mut self) {
        if let Some(active) = self.active.take() {
            let _ = active.shutdown_tx.send(());
            info!(session = self.session, "Closing connection");
        }
        if self.state.is_active() {
            self.transition(Transition::Shutdown);
        }
    }

    /// Apply a session event to the state machine
    ///
    /// Returns `None` for events of sessions that are no longer current.
    pub fn handle_event(&mut self, event: SessionEvent) -> Option<ConnectionUpdate> {
        if event.session != self.session || self.active.is_none() {
            debug!(
                session = event.session,
                current = self.session,
                "Discarding event of stale session"
            );
            return None;
        }

        match event.kind {
            SessionEventKind::Opened => self
                .transition(Transition::Established)
                .then_some(ConnectionUpdate::Opened),
            SessionEventKind::Frame(text) => {
                (self.state == ConnectionState::Open).then_some(ConnectionUpdate::Frame(text))
            }
            SessionEventKind::Closed => {
                self.active = None;
                self.transition(Transition::Shutdown);
                Some(ConnectionUpdate::Closed)
            }
            SessionEventKind::Failed(error) => {
                self.active = None;
                self.transition(Transition::Fault);
                Some(ConnectionUpdate::Failed(error))
            }
        }
    }

    fn transition(&mut self, transition: Transition) -> bool {
        match self.state.apply(transition) {
            Some(next) => {
                debug!(from = %self.state, to = %next, ?transition, "Connection state transition");
                self.state = next;
                true
            }
            None => {
                warn!(state = %self.state, ?transition, "Ignoring illegal connection transition");
                false
            }
        }
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        self.close();
    }
}

/// Wait for the next keepalive tick, or forever if pings are disabled
async fn next_ping(ping: &mut Option<tokio::time::Interval>) {
    match ping {
        Some(ping) => {
            ping.tick().await;
        }
        None => std::future::pending().await,
    }
}

/// One connection: dial, forward text frames, stop on close, failure or shutdown
async fn run_session(
    url: Url,
    session: u64,
    ping_interval: Duration,
    event_tx: mpsc::Sender<SessionEvent>,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    let send = |kind: SessionEventKind| event_tx.send(SessionEvent { session, kind });

    info!(%url, session, "Connecting to signal backend");
    let connected = tokio::select! {
        result = connect_async(url.as_str()) => result,
        _ = &mut shutdown_rx => {
            debug!(session, "Connection attempt cancelled");
            return;
        }
    };

    let ws_stream = match connected {
        Ok((ws_stream, _)) => ws_stream,
        Err(e) => {
            error!(session, "Failed to connect to {}: {}", url, e);
            let _ = send(SessionEventKind::Failed(e.into())).await;
            return;
        }
    };

    info!(session, "Connected to signal backend at {}", url);
    if send(SessionEventKind::Opened).await.is_err() {
        return;
    }

    let (mut write, mut read) = ws_stream.split();
    // A zero period disables the keepalive; `interval_at` panics on it
    let mut ping = (!ping_interval.is_zero()).then(|| {
        tokio::time::interval_at(tokio::time::Instant::now() + ping_interval, ping_interval)
    });

    loop {
        tokio::select! {
            _ = &mut shutdown_rx => {
                debug!(session, "Session shutting down");
                let _ = write.send(Message::Close(None)).await;
                break;
            }
            _ = next_ping(&mut ping) => {
                if let Err(e) = write.send(Message::Ping(vec![].into())).await {
                    error!(session, "Failed to send ping: {}", e);
                    let _ = send(SessionEventKind::Failed(e.into())).await;
                    break;
                }
            }
            msg = read.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    if send(SessionEventKind::Frame(text.as_str().to_owned())).await.is_err() {
                        warn!(session, "Event receiver dropped, stopping session");
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | None => {
                    info!(session, "Server closed connection");
                    let _ = send(SessionEventKind::Closed).await;
                    break;
                }
                Some(Ok(_)) => {
                    // Binary and heartbeat frames carry no signal data
                }
                Some(Err(e)) => {
                    error!(session, "WebSocket error: {}", e);
                    let _ = send(SessionEventKind::Failed(e.into())).await;
                    break;
                }
            }
        }
    }
}
