//! Realtime match listener over Socket.IO (Engine.IO v4, WebSocket transport).
//!
//! [`MatchSubscription::subscribe`] performs the handshake, then a background
//! task answers pings and forwards `match` events until the subscription is
//! closed or dropped. A lost connection is retried with exponential backoff
//! while the reconnect budget lasts.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use reqwest::Url;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::MaybeTlsStream;
use tokio_tungstenite::WebSocketStream;

use crate::config::Config;
use crate::error::ClientError;
use crate::messages::{
    MatchEvent, ServerMessage, CONNECT_PACKET, DISCONNECT_PACKET, PONG_PACKET,
};
use crate::session::Session;

/// Name of the only inbound event the listener handles.
pub const MATCH_EVENT: &str = "match";

const MAX_RECONNECT_DELAY: Duration = Duration::from_secs(30);
const EVENT_BUFFER: usize = 16;

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
}

/// Where and how to hold the realtime connection.
#[derive(Debug, Clone)]
pub struct RealtimeSettings {
    /// Server address, `ws(s)://` or `http(s)://`.
    pub url: String,
    /// Socket.IO endpoint path, usually `/socket.io/`.
    pub path: String,
    /// Reconnect tries after a lost connection; 0 disables reconnecting.
    pub reconnect_attempts: u32,
    /// First backoff delay, doubled per try.
    pub reconnect_delay: Duration,
}

impl RealtimeSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            url: config.effective_realtime_url(),
            path: config.effective_socket_path(),
            reconnect_attempts: config.reconnect_attempts(),
            reconnect_delay: config.reconnect_delay(),
        }
    }
}

/// Builds the WebSocket URL tagged with the acting user's id.
pub fn match_url(settings: &RealtimeSettings, session: &Session) -> Result<String, ClientError> {
    let mut url = Url::parse(&settings.url).map_err(|e| ClientError::Url(e.to_string()))?;
    let scheme = match url.scheme() {
        "ws" | "http" => "ws",
        "wss" | "https" => "wss",
        other => return Err(ClientError::Url(format!("unsupported scheme: {}", other))),
    };
    url.set_scheme(scheme)
        .map_err(|_| ClientError::Url(settings.url.clone()))?;
    url.set_path(&settings.path);
    url.query_pairs_mut()
        .clear()
        .append_pair("EIO", "4")
        .append_pair("transport", "websocket")
        .append_pair("user", session.user_id());
    Ok(url.to_string())
}

/// Connect and complete the Socket.IO handshake on the default namespace.
/// Returns the socket and how long it may stay silent between server pings.
async fn open(url: &str) -> Result<(WsStream, Option<Duration>), ClientError> {
    let (mut ws, _) = tokio_tungstenite::connect_async(url).await?;
    let mut heartbeat = None;
    while let Some(item) = ws.next().await {
        let text = match item? {
            Message::Text(t) => t,
            Message::Close(_) => break,
            _ => continue,
        };
        match ServerMessage::from_text(&text).map_err(ClientError::Protocol)? {
            ServerMessage::Open(open) => {
                tracing::debug!(sid = %open.sid, ping_interval = ?open.ping_interval, "engine open");
                heartbeat = match (open.ping_interval, open.ping_timeout) {
                    (Some(interval), Some(timeout)) => {
                        Some(Duration::from_millis(interval.saturating_add(timeout)))
                    }
                    _ => None,
                };
                ws.send(Message::Text(CONNECT_PACKET.into())).await?;
            }
            ServerMessage::Connect => return Ok((ws, heartbeat)),
            ServerMessage::Ping => ws.send(Message::Text(PONG_PACKET.into())).await?,
            ServerMessage::ConnectError(message) => {
                return Err(ClientError::Protocol(format!("connection refused: {}", message)))
            }
            ServerMessage::Close | ServerMessage::Disconnect => break,
            _ => {}
        }
    }
    Err(ClientError::Protocol("connection closed during handshake".into()))
}

enum Exit {
    Shutdown,
    Lost(String),
}

async fn disconnect(ws: &mut WsStream) -> Exit {
    let _ = ws.send(Message::Text(DISCONNECT_PACKET.into())).await;
    let _ = ws.close(None).await;
    Exit::Shutdown
}

/// Reads frames until shutdown or the connection is lost. With a
/// `heartbeat`, a server that sends no ping for that long counts as lost.
async fn pump(
    ws: &mut WsStream,
    heartbeat: Option<Duration>,
    events: &mpsc::Sender<MatchEvent>,
    shutdown: &mut oneshot::Receiver<()>,
) -> Exit {
    let deadline = tokio::time::sleep(heartbeat.unwrap_or_default());
    tokio::pin!(deadline);
    loop {
        tokio::select! {
            _ = &mut *shutdown => return disconnect(ws).await,
            _ = &mut deadline, if heartbeat.is_some() => {
                return Exit::Lost("ping timeout".into());
            }
            item = ws.next() => {
                let text = match item {
                    Some(Ok(Message::Text(t))) => t,
                    Some(Ok(Message::Close(_))) => return Exit::Lost("closed by server".into()),
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => return Exit::Lost(e.to_string()),
                    None => return Exit::Lost("stream ended".into()),
                };
                match ServerMessage::from_text(&text) {
                    Ok(ServerMessage::Ping) => {
                        if let Some(limit) = heartbeat {
                            deadline.as_mut().reset(tokio::time::Instant::now() + limit);
                        }
                        if let Err(e) = ws.send(Message::Text(PONG_PACKET.into())).await {
                            return Exit::Lost(e.to_string());
                        }
                    }
                    Ok(ServerMessage::Event { name, args }) if name == MATCH_EVENT => {
                        match decode_match(args) {
                            Ok(event) => {
                                tracing::info!(name = %event.name, "match received");
                                tokio::select! {
                                    _ = &mut *shutdown => return disconnect(ws).await,
                                    sent = events.send(event) => {
                                        if sent.is_err() {
                                            return disconnect(ws).await;
                                        }
                                    }
                                }
                            }
                            Err(e) => tracing::warn!(error = %e, "ignoring malformed match event"),
                        }
                    }
                    Ok(ServerMessage::Event { name, .. }) => {
                        tracing::debug!(event = %name, "ignoring event");
                    }
                    Ok(ServerMessage::Disconnect) | Ok(ServerMessage::Close) => {
                        return Exit::Lost("disconnected by server".into());
                    }
                    Ok(_) => {}
                    Err(e) => tracing::warn!(error = %e, frame = %text, "ignoring malformed frame"),
                }
            }
        }
    }
}

fn decode_match(args: Vec<serde_json::Value>) -> Result<MatchEvent, ClientError> {
    let payload = args
        .into_iter()
        .next()
        .ok_or_else(|| ClientError::Decode("match event without payload".into()))?;
    Ok(serde_json::from_value(payload)?)
}

async fn reconnect(
    url: &str,
    settings: &RealtimeSettings,
    shutdown: &mut oneshot::Receiver<()>,
) -> Option<(WsStream, Option<Duration>)> {
    let mut delay = settings.reconnect_delay;
    for attempt in 1..=settings.reconnect_attempts {
        tokio::select! {
            _ = &mut *shutdown => return None,
            _ = tokio::time::sleep(delay) => {}
        }
        tokio::select! {
            _ = &mut *shutdown => return None,
            result = open(url) => match result {
                Ok(opened) => return Some(opened),
                Err(e) => tracing::warn!(attempt, error = %e, "reconnect failed"),
            }
        }
        delay = (delay * 2).min(MAX_RECONNECT_DELAY);
    }
    None
}

async fn run(
    url: String,
    settings: RealtimeSettings,
    mut ws: WsStream,
    mut heartbeat: Option<Duration>,
    events: mpsc::Sender<MatchEvent>,
    state: watch::Sender<ConnectionState>,
    mut shutdown: oneshot::Receiver<()>,
) {
    loop {
        match pump(&mut ws, heartbeat, &events, &mut shutdown).await {
            Exit::Shutdown => break,
            Exit::Lost(reason) => {
                state.send_replace(ConnectionState::Disconnected);
                tracing::warn!(%reason, "realtime connection lost");
                match reconnect(&url, &settings, &mut shutdown).await {
                    Some((new_ws, new_heartbeat)) => {
                        ws = new_ws;
                        heartbeat = new_heartbeat;
                        state.send_replace(ConnectionState::Connected);
                        tracing::info!("realtime reconnected");
                    }
                    None => break,
                }
            }
        }
    }
    state.send_replace(ConnectionState::Disconnected);
    tracing::debug!("realtime listener stopped");
}

/// A live match subscription. Dropping it tears the connection down.
pub struct MatchSubscription {
    events: mpsc::Receiver<MatchEvent>,
    state: watch::Receiver<ConnectionState>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl MatchSubscription {
    /// Opens the connection for `session`. Fails if the first connection or
    /// handshake fails; later drops are handled by the reconnect policy.
    pub async fn subscribe(
        settings: &RealtimeSettings,
        session: &Session,
    ) -> Result<Self, ClientError> {
        let url = match_url(settings, session)?;
        let (ws, heartbeat) = open(&url).await?;
        tracing::info!(user_id = session.user_id(), "realtime connected");

        let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);
        let (state_tx, state_rx) = watch::channel(ConnectionState::Connected);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(run(
            url,
            settings.clone(),
            ws,
            heartbeat,
            events_tx,
            state_tx,
            shutdown_rx,
        ));
        Ok(Self {
            events: events_rx,
            state: state_rx,
            shutdown: Some(shutdown_tx),
            task: Some(task),
        })
    }

    /// Next match event; `None` once the listener has stopped for good.
    pub async fn recv(&mut self) -> Option<MatchEvent> {
        self.events.recv().await
    }

    pub fn try_recv(&mut self) -> Option<MatchEvent> {
        self.events.try_recv().ok()
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Waits until the connection reaches `target`. Returns false if the
    /// listener stopped first.
    pub async fn wait_for_state(&mut self, target: ConnectionState) -> bool {
        self.state.wait_for(|s| *s == target).await.is_ok()
    }

    /// Explicit teardown: disconnects from the server and waits for the
    /// listener task to finish. Unread events are discarded.
    pub async fn close(mut self) {
        self.events.close();
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for MatchSubscription {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

impl std::fmt::Debug for MatchSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchSubscription")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
