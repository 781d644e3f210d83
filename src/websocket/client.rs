//! Realtime subscription client.
//!
//! One background task owns the socket. It connects, authenticates with
//! `connection_init`, registers the house bet and balance subscriptions after
//! `connection_ack`, keeps the connection alive with pings and reconnects after
//! any close. Events reach the consumer through the client's `Stream` impl.

use std::pin::Pin;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, Stream, StreamExt};
use pin_project_lite::pin_project;
use rand::Rng;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::{
    HeaderValue, COOKIE, SEC_WEBSOCKET_PROTOCOL, USER_AGENT,
};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{
    connect_async_tls_with_config, Connector, MaybeTlsStream, WebSocketStream,
};

use crate::auth::{CredentialStore, Credentials};
use crate::network::{websocket_url, DEFAULT_MIRROR, GRAPHQL_WS_PROTOCOL};
use crate::websocket::error::{WebSocketError, WsResult};
use crate::websocket::handlers::{decode_frame, InboundFrame};
use crate::websocket::subscriptions::{Subscription, SubscriptionManager};
use crate::websocket::types::{ConnectionState, InitPayload, MessageOut, WsEvent};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

/// Length of the numeric lockdown token sent with `connection_init`
const LOCKDOWN_TOKEN_LEN: usize = 20;

/// Delay schedule between reconnect attempts.
///
/// Attempt `n` (1-based) waits `base_delay * backoff_factor^(n-1)`, capped at
/// `max_delay`. The attempt counter resets whenever a connection reaches
/// [`ConnectionState::Active`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub backoff_factor: u32,
    /// `None` retries forever
    pub max_attempts: Option<u32>,
}

/// Exponential backoff: 1s, 2s, 4s ... capped at 30s, unlimited attempts.
///
/// A drop after the connection became active always waits 1s. Consecutive
/// failures before that (refused connects, handshakes that never get acked)
/// wait longer each time. Use [`ReconnectPolicy::fixed`] with one second for a
/// constant delay.
impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            backoff_factor: 2,
            max_attempts: None,
        }
    }
}

impl ReconnectPolicy {
    /// Retry forever with the same delay.
    pub fn fixed(delay: Duration) -> Self {
        Self {
            base_delay: delay,
            max_delay: delay,
            backoff_factor: 1,
            max_attempts: None,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Delay before reconnect attempt `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1);
        let multiplier = self.backoff_factor.max(1).saturating_pow(exp);
        self.base_delay
            .saturating_mul(multiplier)
            .min(self.max_delay)
    }

    pub fn allows(&self, attempt: u32) -> bool {
        self.max_attempts.map_or(true, |max| attempt <= max)
    }
}

/// Realtime client configuration
#[derive(Debug, Clone)]
pub struct RealtimeConfig {
    /// WebSocket endpoint
    pub url: String,
    /// Language sent in `connection_init`
    pub language: String,
    /// Interval between keep-alive pings once the connection is active
    pub ping_interval: Duration,
    /// Timeout for opening the socket
    pub connect_timeout: Duration,
    pub reconnect: ReconnectPolicy,
    /// Skip TLS certificate and hostname verification.
    ///
    /// Some casino mirrors serve certificates that fail validation. Enabling
    /// this trusts any certificate, exposing the session cookies and API key
    /// to anyone able to intercept the connection. Off by default.
    pub accept_invalid_certs: bool,
    /// Capacity of the event channel. Default: 1000
    pub event_channel_capacity: usize,
    /// Capacity of the command channel. Default: 16
    pub command_channel_capacity: usize,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self::for_mirror(DEFAULT_MIRROR)
    }
}

impl RealtimeConfig {
    /// Default configuration targeting `wss://<mirror>/_api/websockets`.
    pub fn for_mirror(mirror: &str) -> Self {
        Self {
            url: websocket_url(mirror),
            language: "fr".to_string(),
            ping_interval: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(30),
            reconnect: ReconnectPolicy::default(),
            accept_invalid_certs: false,
            event_channel_capacity: 1000,
            command_channel_capacity: 16,
        }
    }
}

/// Internal command for the connection task
enum Command {
    Stop,
}

/// Why the connected loop ended
enum DisconnectReason {
    Stopped,
    Closed { code: u16, reason: String },
    Error(String),
}

/// State readable from the client handle while the task runs
#[derive(Debug, Default)]
struct SharedState {
    connection: AtomicU8,
    subscriptions: AtomicUsize,
}

impl SharedState {
    fn set_connection(&self, state: ConnectionState) {
        self.connection.store(state as u8, Ordering::SeqCst);
    }

    fn connection(&self) -> ConnectionState {
        ConnectionState::from(self.connection.load(Ordering::SeqCst))
    }
}

/// Aborts the connection task when the client is dropped
#[derive(Debug, Default)]
struct TaskGuard(Option<JoinHandle<()>>);

impl Drop for TaskGuard {
    fn drop(&mut self) {
        if let Some(handle) = self.0.take() {
            handle.abort();
        }
    }
}

pin_project! {
    /// Realtime client for live balances and house bets
    ///
    /// # Example
    ///
    /// ```ignore
    /// use casino_realtime::websocket::*;
    /// use futures_util::StreamExt;
    ///
    /// let mut client = RealtimeClient::new(store, RealtimeConfig::default());
    /// client.start().await?;
    ///
    /// while let Some(event) = client.next().await {
    ///     match event {
    ///         WsEvent::MultiplierUpdate(update) => {
    ///             println!("{} x{}", update.slot_name, update.multiplier);
    ///         }
    ///         WsEvent::BalanceUpdate(balance) => println!("{}", balance),
    ///         _ => {}
    ///     }
    /// }
    /// ```
    pub struct RealtimeClient {
        credentials: CredentialStore,
        config: RealtimeConfig,
        shared: Arc<SharedState>,
        cmd_tx: Option<mpsc::Sender<Command>>,
        #[pin]
        event_rx: mpsc::Receiver<WsEvent>,
        event_tx: mpsc::Sender<WsEvent>,
        task: TaskGuard,
    }
}

impl RealtimeClient {
    /// Create a client. Does not connect until [`start`](Self::start).
    pub fn new(credentials: CredentialStore, config: RealtimeConfig) -> Self {
        let (event_tx, event_rx) = mpsc::channel(config.event_channel_capacity.max(1));
        Self {
            credentials,
            config,
            shared: Arc::new(SharedState::default()),
            cmd_tx: None,
            event_rx,
            event_tx,
            task: TaskGuard::default(),
        }
    }

    /// Spawn the connection task.
    ///
    /// Fails with [`WebSocketError::MissingCredentials`] if the session is
    /// incomplete. Calling it while the task runs is a no-op.
    pub async fn start(&mut self) -> WsResult<()> {
        if self.is_running() {
            return Ok(());
        }

        if !self.credentials.is_complete().await {
            tracing::error!(
                "Cannot start realtime client: API key, user agent, or cookies are missing"
            );
            return Err(WebSocketError::MissingCredentials);
        }

        let (cmd_tx, cmd_rx) = mpsc::channel(self.config.command_channel_capacity.max(1));
        let state = TaskState {
            credentials: self.credentials.clone(),
            config: self.config.clone(),
            event_tx: self.event_tx.clone(),
            cmd_rx,
            shared: self.shared.clone(),
            reconnect_attempts: 0,
        };

        self.cmd_tx = Some(cmd_tx);
        self.task = TaskGuard(Some(tokio::spawn(run_task(state))));
        Ok(())
    }

    /// Close the socket gracefully and wait for the task to finish. No reconnect follows.
    pub async fn stop(&mut self) -> WsResult<()> {
        if let Some(tx) = self.cmd_tx.take() {
            let _ = tx.send(Command::Stop).await;
        }

        if let Some(handle) = self.task.0.take() {
            let _ = handle.await;
        }

        self.shared.set_connection(ConnectionState::Disconnected);
        self.shared.subscriptions.store(0, Ordering::SeqCst);
        Ok(())
    }

    /// Check if the connection task is still running
    pub fn is_running(&self) -> bool {
        self.task.0.as_ref().map(|h| !h.is_finished()).unwrap_or(false)
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.shared.connection()
    }

    /// True once `connection_ack` was received and subscriptions are registered
    pub fn is_active(&self) -> bool {
        self.connection_state() == ConnectionState::Active
    }

    /// Number of subscriptions registered on the current connection
    pub fn active_subscription_count(&self) -> usize {
        self.shared.subscriptions.load(Ordering::SeqCst)
    }

    pub fn config(&self) -> &RealtimeConfig {
        &self.config
    }
}

impl Stream for RealtimeClient {
    type Item = WsEvent;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();
        this.event_rx.poll_recv(cx)
    }
}

// ─── Background task ─────────────────────────────────────────────────────────

struct TaskState {
    credentials: CredentialStore,
    config: RealtimeConfig,
    event_tx: mpsc::Sender<WsEvent>,
    cmd_rx: mpsc::Receiver<Command>,
    shared: Arc<SharedState>,
    reconnect_attempts: u32,
}

impl TaskState {
    /// Never blocks on a slow consumer.
    fn emit(&self, event: WsEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(dropped)) => {
                tracing::warn!(
                    "Event channel full, dropping event: {:?}",
                    std::mem::discriminant(&dropped)
                );
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!("Event receiver dropped");
            }
        }
    }

    fn set_connection(&self, state: ConnectionState) {
        self.shared.set_connection(state);
    }
}

async fn run_task(mut state: TaskState) {
    loop {
        // Credentials are read afresh for every connection
        let credentials = state.credentials.snapshot().await;
        if !credentials.is_complete() {
            tracing::warn!("Credentials incomplete, realtime client stopping");
            state.set_connection(ConnectionState::Disconnected);
            state.emit(WsEvent::Stopped);
            return;
        }

        state.set_connection(ConnectionState::Connecting);
        let opened = tokio::select! {
            result = open_socket(&state.config, &credentials) => Some(result),
            cmd = state.cmd_rx.recv() => match cmd {
                Some(Command::Stop) | None => None,
            },
        };

        let reason = match opened {
            None => DisconnectReason::Stopped,
            Some(Ok(stream)) => {
                tracing::info!(url = %state.config.url, "WebSocket connected");
                state.emit(WsEvent::Connected);
                let (sink, source) = stream.split();
                run_connected(&mut state, &credentials, sink, source).await
            }
            Some(Err(e)) => {
                tracing::error!(url = %state.config.url, error = %e, "WebSocket connection failed");
                state.emit(WsEvent::Error { error: e.clone() });
                DisconnectReason::Error(e.to_string())
            }
        };

        state.set_connection(ConnectionState::Disconnected);
        state.shared.subscriptions.store(0, Ordering::SeqCst);

        match reason {
            DisconnectReason::Stopped => {
                tracing::info!("Realtime client stopped");
                state.emit(WsEvent::Stopped);
                return;
            }
            DisconnectReason::Closed { code, reason } => {
                tracing::info!(code, reason = %reason, "WebSocket closed");
                state.emit(WsEvent::Disconnected { code, reason });
            }
            DisconnectReason::Error(reason) => {
                tracing::warn!(reason = %reason, "WebSocket disconnected");
                state.emit(WsEvent::Disconnected { code: 1006, reason });
            }
        }

        let attempt = state.reconnect_attempts + 1;
        if !state.config.reconnect.allows(attempt) {
            tracing::warn!(attempts = state.reconnect_attempts, "Max reconnect attempts reached");
            state.emit(WsEvent::MaxReconnectReached);
            return;
        }

        if !backoff_sleep(&mut state).await {
            state.emit(WsEvent::Stopped);
            return;
        }
    }
}

/// The inner connected loop; runs until the connection breaks or a stop is requested.
async fn run_connected(
    state: &mut TaskState,
    credentials: &Credentials,
    mut sink: WsSink,
    mut source: WsSource,
) -> DisconnectReason {
    let init = MessageOut::connection_init(InitPayload {
        access_token: credentials.api_key.clone(),
        language: state.config.language.clone(),
        lockdown_token: lockdown_token(),
    });
    if let Err(e) = send_msg(&mut sink, &init).await {
        return DisconnectReason::Error(e.to_string());
    }
    state.set_connection(ConnectionState::Handshaking);

    let mut subscriptions = SubscriptionManager::new();
    let mut keep_alive: Option<Interval> = None;

    loop {
        tokio::select! {
            msg = source.next() => {
                let text = match msg {
                    Some(Ok(Message::Text(text))) => text.as_str().to_owned(),
                    Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes.to_vec()) {
                        Ok(text) => text,
                        Err(e) => {
                            tracing::warn!("Binary frame is not UTF-8: {}", e);
                            state.emit(WsEvent::Error {
                                error: WebSocketError::MessageParseError(e.to_string()),
                            });
                            continue;
                        }
                    },
                    Some(Ok(Message::Ping(data))) => {
                        if let Err(e) = sink.send(Message::Pong(data)).await {
                            tracing::warn!("Failed to send pong: {}", e);
                        }
                        continue;
                    }
                    Some(Ok(Message::Pong(_))) | Some(Ok(Message::Frame(_))) => continue,
                    Some(Ok(Message::Close(frame))) => {
                        let (code, reason) = extract_close(frame.as_ref());
                        return DisconnectReason::Closed { code, reason };
                    }
                    Some(Err(e)) => {
                        tracing::error!("WebSocket error: {}", e);
                        return DisconnectReason::Error(e.to_string());
                    }
                    None => {
                        return DisconnectReason::Closed {
                            code: 1006,
                            reason: "Stream ended".to_string(),
                        };
                    }
                };

                let handled =
                    handle_text(state, &mut sink, &mut subscriptions, &mut keep_alive, &text).await;
                if let Err(e) = handled {
                    return DisconnectReason::Error(e.to_string());
                }
            }

            cmd = state.cmd_rx.recv() => {
                match cmd {
                    Some(Command::Stop) | None => {
                        let _ = sink.send(Message::Close(Some(CloseFrame {
                            code: CloseCode::Normal,
                            reason: "Client stop".into(),
                        }))).await;
                        return DisconnectReason::Stopped;
                    }
                }
            }

            _ = next_tick(&mut keep_alive) => {
                if let Err(e) = send_msg(&mut sink, &MessageOut::Ping).await {
                    tracing::warn!("Failed to send keep-alive ping: {}", e);
                    return DisconnectReason::Error(e.to_string());
                }
            }
        }
    }
}

/// Act on one decoded text frame. Errors are send failures on the socket.
async fn handle_text(
    state: &mut TaskState,
    sink: &mut WsSink,
    subscriptions: &mut SubscriptionManager,
    keep_alive: &mut Option<Interval>,
    text: &str,
) -> WsResult<()> {
    match decode_frame(text) {
        Ok(InboundFrame::ConnectionAck) => {
            if !subscriptions.is_empty() {
                tracing::debug!("Duplicate connection_ack ignored");
                return Ok(());
            }

            for subscription in Subscription::ALL {
                let msg = subscriptions.register(subscription);
                send_msg(sink, &msg).await?;
            }
            state
                .shared
                .subscriptions
                .store(subscriptions.len(), Ordering::SeqCst);
            state.set_connection(ConnectionState::Active);
            state.reconnect_attempts = 0;

            let period = state.config.ping_interval;
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            *keep_alive = Some(ticker);

            tracing::info!(subscriptions = subscriptions.len(), "Connection acknowledged");
            state.emit(WsEvent::Acknowledged);
        }
        Ok(InboundFrame::Error(payload)) => {
            tracing::error!(payload = %payload, "Error frame received");
            state.emit(WsEvent::Error {
                error: WebSocketError::ServerError(payload.to_string()),
            });
        }
        Ok(InboundFrame::Pong) => {
            tracing::trace!("Pong received");
        }
        Ok(InboundFrame::BalanceUpdate(payload)) => {
            state.emit(WsEvent::BalanceUpdate(payload));
        }
        Ok(InboundFrame::MultiplierUpdate(update)) => {
            state.emit(WsEvent::MultiplierUpdate(update));
        }
        Ok(InboundFrame::Unrecognized(kind)) => {
            tracing::debug!(kind = %kind, "Unhandled frame");
        }
        Err(e) => {
            tracing::warn!("Failed to parse WebSocket message: {}", e);
            state.emit(WsEvent::Error { error: e });
        }
    }
    Ok(())
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Open the socket with the session headers and the `graphql-transport-ws` subprotocol.
async fn open_socket(config: &RealtimeConfig, credentials: &Credentials) -> WsResult<WsStream> {
    let mut request = config
        .url
        .as_str()
        .into_client_request()
        .map_err(|e| WebSocketError::InvalidUrl(e.to_string()))?;

    let headers = request.headers_mut();
    headers.insert(USER_AGENT, header_value("User-Agent", &credentials.user_agent)?);
    headers.insert(COOKIE, header_value("Cookie", &credentials.cookie_header)?);
    headers.insert(
        SEC_WEBSOCKET_PROTOCOL,
        HeaderValue::from_static(GRAPHQL_WS_PROTOCOL),
    );

    let connector = if config.accept_invalid_certs {
        tracing::warn!("TLS certificate verification disabled for realtime client");
        let tls = native_tls::TlsConnector::builder()
            .danger_accept_invalid_certs(true)
            .danger_accept_invalid_hostnames(true)
            .build()?;
        Some(Connector::NativeTls(tls))
    } else {
        None
    };

    let (stream, _) = tokio::time::timeout(
        config.connect_timeout,
        connect_async_tls_with_config(request, None, false, connector),
    )
    .await
    .map_err(|_| WebSocketError::Timeout)?
    .map_err(WebSocketError::from)?;

    Ok(stream)
}

fn header_value(name: &str, value: &str) -> WsResult<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| WebSocketError::Protocol(format!("Invalid {} header: {}", name, e)))
}

/// Serialize and send a frame.
async fn send_msg(sink: &mut WsSink, msg: &MessageOut) -> WsResult<()> {
    let json = serde_json::to_string(msg)?;
    sink.send(Message::Text(json.into()))
        .await
        .map_err(|e| WebSocketError::SendFailed(e.to_string()))
}

/// Resolves on the next keep-alive tick; pending while no keep-alive runs.
async fn next_tick(keep_alive: &mut Option<Interval>) {
    match keep_alive {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

/// Extract close code and reason from an optional CloseFrame.
fn extract_close(frame: Option<&CloseFrame>) -> (u16, String) {
    match frame {
        Some(f) => (f.code.into(), f.reason.as_str().to_string()),
        None => (1005, "No close frame".to_string()),
    }
}

/// Sleep before the next reconnect. Returns false if a stop arrived meanwhile.
async fn backoff_sleep(state: &mut TaskState) -> bool {
    state.reconnect_attempts += 1;
    let attempt = state.reconnect_attempts;
    let delay = state.config.reconnect.delay_for(attempt);

    tracing::info!("Reconnect attempt {} in {:?}", attempt, delay);
    state.emit(WsEvent::Reconnecting { attempt, delay });

    tokio::select! {
        _ = tokio::time::sleep(delay) => true,
        cmd = state.cmd_rx.recv() => match cmd {
            Some(Command::Stop) | None => false,
        },
    }
}

fn lockdown_token() -> String {
    let mut rng = rand::thread_rng();
    (0..LOCKDOWN_TOKEN_LEN)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}
