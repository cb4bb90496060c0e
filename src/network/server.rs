//! WebSocket Game Server
//!
//! Async WebSocket gateway in front of a single arena session.
//! Each socket gets a fresh player id; decoded messages are forwarded to the
//! session as intents and the session's messages are written back.

use std::collections::BTreeMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, RwLock, broadcast};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use futures_util::{SinkExt, StreamExt};
use tracing::{info, warn, error, debug, instrument};

use crate::game::state::PlayerId;
use crate::game::tick::ArenaConfig;
use crate::network::protocol::{
    snapshot_to_bytes, ClientMessage, ErrorCode, ServerError, ServerMessage,
};
use crate::network::session::{ArenaSession, SessionError, SessionHandle};

/// How long a closing connection waits for its last messages to flush.
const FLUSH_TIMEOUT: Duration = Duration::from_millis(250);

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address.
    pub bind_addr: SocketAddr,
    /// Maximum concurrent connections.
    pub max_connections: usize,
    /// Per-client outbound queue depth.
    pub outbound_queue: usize,
    /// Send `gameState` as bincode binary frames instead of JSON.
    pub binary_snapshots: bool,
    /// Arena tuning for the session.
    pub arena: ArenaConfig,
    /// Server version string.
    pub version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 8080),
            max_connections: 1000,
            outbound_queue: 256,
            binary_snapshots: false,
            arena: ArenaConfig::fast_action(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl ServerConfig {
    /// Build from environment variables, falling back to defaults.
    ///
    /// Reads `PORT`, `ARENA_BIND_HOST`, `ARENA_TICK_RATE` (60 or 10),
    /// `ARENA_MAX_CONNECTIONS` and `ARENA_BINARY_SNAPSHOTS`.
    pub fn from_env() -> Result<Self, GameServerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, GameServerError> {
        let mut config = Self::default();
        let invalid = |key: &str, value: &str| GameServerError::InvalidConfig(format!("{}={}", key, value));

        let mut ip = config.bind_addr.ip();
        let mut port = config.bind_addr.port();
        if let Some(host) = lookup("ARENA_BIND_HOST") {
            ip = host.parse().map_err(|_| invalid("ARENA_BIND_HOST", &host))?;
        }
        if let Some(value) = lookup("PORT") {
            port = value.parse().map_err(|_| invalid("PORT", &value))?;
        }
        config.bind_addr = SocketAddr::new(ip, port);

        if let Some(rate) = lookup("ARENA_TICK_RATE") {
            config.arena = match rate.trim() {
                "60" => ArenaConfig::fast_action(),
                "10" => ArenaConfig::sync_only(),
                _ => return Err(invalid("ARENA_TICK_RATE", &rate)),
            };
        }

        if let Some(value) = lookup("ARENA_MAX_CONNECTIONS") {
            config.max_connections = value.parse().map_err(|_| invalid("ARENA_MAX_CONNECTIONS", &value))?;
        }

        if let Some(value) = lookup("ARENA_BINARY_SNAPSHOTS") {
            config.binary_snapshots = matches!(value.trim(), "1" | "true" | "yes");
        }

        Ok(config)
    }
}

/// Game server errors.
#[derive(Debug, thiserror::Error)]
pub enum GameServerError {
    /// Failed to bind to address.
    #[error("Failed to bind: {0}")]
    BindFailed(#[from] std::io::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Session error.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Bad configuration value.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// The game server.
pub struct GameServer {
    /// Server configuration.
    config: ServerConfig,
    /// The arena every client joins.
    session: SessionHandle,
    /// Connected clients.
    clients: Arc<RwLock<BTreeMap<SocketAddr, PlayerId>>>,
    /// Shutdown signal.
    shutdown_tx: broadcast::Sender<()>,
}

impl GameServer {
    /// Create a new game server and start its arena session.
    ///
    /// Must be called inside a tokio runtime.
    pub fn new(config: ServerConfig) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        let (session, _task) = ArenaSession::spawn(config.arena.clone());

        Self {
            config,
            session,
            clients: Arc::new(RwLock::new(BTreeMap::new())),
            shutdown_tx,
        }
    }

    /// Bind and run the server until shutdown.
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<(), GameServerError> {
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        self.serve(listener).await
    }

    /// Accept connections on an already-bound listener until shutdown.
    pub async fn serve(&self, listener: TcpListener) -> Result<(), GameServerError> {
        info!(
            "Game server v{} listening on {} ({} Hz)",
            self.config.version,
            listener.local_addr()?,
            self.config.arena.tick_rate
        );

        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            let clients_count = self.clients.read().await.len();
                            if clients_count >= self.config.max_connections {
                                warn!("Connection limit reached, rejecting {}", addr);
                                tokio::spawn(reject_connection(stream, addr));
                                continue;
                            }

                            info!("New connection from {}", addr);
                            self.handle_connection(stream, addr).await;
                        }
                        Err(e) => {
                            error!("Accept error: {}", e);
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        if self.session.shutdown().await.is_err() {
            debug!("Session already stopped");
        }

        Ok(())
    }

    /// Register a new connection and spawn its task.
    async fn handle_connection(&self, stream: TcpStream, addr: SocketAddr) {
        let player_id = PlayerId::random();
        self.clients.write().await.insert(addr, player_id);

        let clients = self.clients.clone();
        let session = self.session.clone();
        let config = self.config.clone();
        let shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            if let Err(e) = Self::serve_client(stream, addr, player_id, &session, &config, shutdown_rx).await {
                warn!("Connection {} ended with error: {}", addr, e);
            }

            // Removes the player if it ever joined
            if session.detach(player_id).await.is_err() {
                debug!("Session gone before {} detached", player_id.short());
            }
            clients.write().await.remove(&addr);

            info!("Client {} ({}) cleaned up", addr, player_id.short());
        });
    }

    /// Run one WebSocket connection to completion.
    async fn serve_client(
        stream: TcpStream,
        addr: SocketAddr,
        player_id: PlayerId,
        session: &SessionHandle,
        config: &ServerConfig,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<(), GameServerError> {
        let ws_stream = accept_async(stream).await?;
        let (mut ws_sender, mut ws_receiver) = ws_stream.split();
        let (msg_tx, mut msg_rx) = mpsc::channel::<ServerMessage>(config.outbound_queue);

        session.attach(player_id, msg_tx.clone()).await?;
        debug!("{} assigned player id {}", addr, player_id.short());

        // Spawn message sender task
        let binary_snapshots = config.binary_snapshots;
        let sender_task = tokio::spawn(async move {
            while let Some(msg) = msg_rx.recv().await {
                let Some(frame) = encode_frame(&msg, binary_snapshots) else {
                    continue;
                };
                if ws_sender.send(frame).await.is_err() {
                    break;
                }
            }
            let _ = ws_sender.close().await;
        });

        // Handle incoming messages
        loop {
            tokio::select! {
                msg = ws_receiver.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            let client_msg = match ClientMessage::from_json(&text) {
                                Ok(m) => m,
                                Err(e) => {
                                    debug!("Invalid message from {}: {}", addr, e);
                                    continue;
                                }
                            };

                            if let ClientMessage::Ping { timestamp } = client_msg {
                                let pong = ServerMessage::Pong {
                                    timestamp,
                                    server_time: unix_millis(),
                                };
                                if msg_tx.try_send(pong).is_err() {
                                    debug!("Outbound queue full for {}, dropped pong", addr);
                                }
                                continue;
                            }

                            if let Some(intent) = client_msg.into_intent() {
                                if let Err(e) = session.intent(player_id, intent).await {
                                    let error = ServerMessage::Error(ServerError {
                                        code: ErrorCode::SessionClosed,
                                        message: e.to_string(),
                                    });
                                    if msg_tx.try_send(error).is_err() {
                                        debug!("Outbound queue full for {}, dropped error", addr);
                                    }
                                    break;
                                }
                            }
                        }
                        Some(Ok(Message::Binary(_))) => {
                            debug!("Binary frame from {} ignored", addr);
                        }
                        Some(Ok(Message::Close(_))) | None => {
                            debug!("Client {} disconnected", addr);
                            break;
                        }
                        Some(Err(e)) => {
                            error!("WebSocket error for {}: {}", addr, e);
                            break;
                        }
                        _ => {}
                    }
                }
                _ = shutdown_rx.recv() => {
                    let notice = ServerMessage::Shutdown {
                        reason: "Server shutting down".to_string(),
                    };
                    if msg_tx.try_send(notice).is_err() {
                        debug!("Outbound queue full for {}, dropped shutdown", addr);
                    }
                    break;
                }
            }
        }

        // The session still holds a sender until it processes the detach
        drop(msg_tx);
        if tokio::time::timeout(FLUSH_TIMEOUT, sender_task).await.is_err() {
            debug!("Outbound flush for {} timed out", addr);
        }

        Ok(())
    }

    /// Shutdown the server.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Get active connection count.
    pub async fn connection_count(&self) -> usize {
        self.clients.read().await.len()
    }

    /// Handle to the arena session.
    pub fn session(&self) -> &SessionHandle {
        &self.session
    }
}

/// Turn a message into a WebSocket frame.
fn encode_frame(msg: &ServerMessage, binary_snapshots: bool) -> Option<Message> {
    if let (true, ServerMessage::GameState(snapshot)) = (binary_snapshots, msg) {
        return match snapshot_to_bytes(snapshot) {
            Ok(bytes) => Some(Message::Binary(bytes)),
            Err(e) => {
                error!("Failed to encode snapshot: {}", e);
                None
            }
        };
    }

    match msg.to_json() {
        Ok(text) => Some(Message::Text(text)),
        Err(e) => {
            error!("Failed to serialize {}: {}", msg.name(), e);
            None
        }
    }
}

/// Complete the handshake only to say the server is full.
async fn reject_connection(stream: TcpStream, addr: SocketAddr) {
    let Ok(mut ws_stream) = accept_async(stream).await else {
        return;
    };

    let msg = ServerMessage::Error(ServerError {
        code: ErrorCode::ServerFull,
        message: "Connection limit reached".to_string(),
    });
    if let Some(frame) = encode_frame(&msg, false) {
        let _ = ws_stream.send(frame).await;
    }
    let _ = ws_stream.close(None).await;
    debug!("Rejected {}", addr);
}

/// Wall-clock milliseconds for pong replies.
fn unix_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
