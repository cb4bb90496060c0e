//! Arena Session
//!
//! One task owns one `ArenaState`. Ticks and client commands are taken from
//! a single `select!` loop, so a tick and an intent never run at the same
//! time. Outbound messages go through an [`EventSink`].

use std::collections::BTreeMap;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::core::rng::derive_session_seed;
use crate::game::events::{GameEvent, Recipient};
use crate::game::intent::{apply_intent, Intent};
use crate::game::state::{ArenaState, PlayerId};
use crate::game::tick::{tick, ArenaConfig};
use crate::network::protocol::ServerMessage;

/// Unique session identifier.
pub type SessionId = [u8; 16];

/// Capacity of the session command queue.
const COMMAND_QUEUE_SIZE: usize = 1024;

/// Where a session's outbound messages go.
pub trait EventSink: Send + 'static {
    /// Start delivering to a client.
    fn connect(&mut self, player_id: PlayerId, sender: mpsc::Sender<ServerMessage>);

    /// Stop delivering to a client.
    fn disconnect(&mut self, player_id: &PlayerId);

    /// Deliver to one client.
    fn send_to(&mut self, player_id: &PlayerId, message: ServerMessage);

    /// Deliver to every client.
    fn broadcast(&mut self, message: ServerMessage);
}

// =============================================================================
// CLIENT REGISTRY
// =============================================================================

/// Production sink: one bounded channel per connected client.
///
/// Delivery never waits. A client whose queue is full misses the message;
/// a client whose queue is closed is dropped.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: BTreeMap<PlayerId, mpsc::Sender<ServerMessage>>,
}

impl ClientRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of connected clients.
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Check if no clients are connected.
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Try to deliver; returns false if the client is gone.
    fn deliver(player_id: &PlayerId, sender: &mpsc::Sender<ServerMessage>, message: ServerMessage) -> bool {
        match sender.try_send(message) {
            Ok(()) => true,
            Err(TrySendError::Full(message)) => {
                warn!("Outbound queue full for {}, dropped {}", player_id.short(), message.name());
                true
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }
}

impl EventSink for ClientRegistry {
    fn connect(&mut self, player_id: PlayerId, sender: mpsc::Sender<ServerMessage>) {
        self.clients.insert(player_id, sender);
    }

    fn disconnect(&mut self, player_id: &PlayerId) {
        self.clients.remove(player_id);
    }

    fn send_to(&mut self, player_id: &PlayerId, message: ServerMessage) {
        let open = match self.clients.get(player_id) {
            Some(sender) => Self::deliver(player_id, sender, message),
            None => return,
        };
        if !open {
            debug!("Dropping closed client {}", player_id.short());
            self.clients.remove(player_id);
        }
    }

    fn broadcast(&mut self, message: ServerMessage) {
        self.clients
            .retain(|player_id, sender| Self::deliver(player_id, sender, message.clone()));
    }
}

// =============================================================================
// SESSION ACTOR
// =============================================================================

/// Commands accepted by a running session.
#[derive(Debug)]
pub enum SessionCommand {
    /// A client connected; start sending it messages.
    Attach {
        /// Id assigned to the socket
        player_id: PlayerId,
        /// Outbound queue for the socket
        sender: mpsc::Sender<ServerMessage>,
    },
    /// A client sent an intent.
    Intent {
        /// Sender
        player_id: PlayerId,
        /// Decoded action
        intent: Intent,
    },
    /// A client's socket closed.
    Detach {
        /// Id assigned to the socket
        player_id: PlayerId,
    },
    /// Stop the session.
    Shutdown,
}

/// A running arena: the simulation plus its outbound sink.
pub struct ArenaSession<S: EventSink> {
    /// Session identifier.
    pub id: SessionId,
    state: ArenaState,
    sink: S,
}

impl<S: EventSink> ArenaSession<S> {
    /// Create a session seeded from its id.
    pub fn new(id: SessionId, config: ArenaConfig, sink: S) -> Self {
        let seed = derive_session_seed(&id);
        Self {
            id,
            state: ArenaState::new(config, seed),
            sink,
        }
    }

    /// Read access to the simulation.
    pub fn state(&self) -> &ArenaState {
        &self.state
    }

    /// Read access to the sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Run one tick and publish its events and snapshot.
    pub fn step(&mut self) {
        let result = tick(&mut self.state);
        self.dispatch(result.events);
        self.sink.broadcast(ServerMessage::GameState(result.snapshot));
    }

    /// Handle a command. Returns false when the session should stop.
    pub fn handle_command(&mut self, command: SessionCommand) -> bool {
        match command {
            SessionCommand::Attach { player_id, sender } => {
                debug!("Client {} attached", player_id.short());
                self.sink.connect(player_id, sender);
            }
            SessionCommand::Intent { player_id, intent } => {
                // The socket stays registered until Detach, even after a leave
                debug!("{} from {}", intent.name(), player_id.short());
                apply_intent(&mut self.state, player_id, intent);
            }
            SessionCommand::Detach { player_id } => {
                debug!("Client {} detached", player_id.short());
                self.sink.disconnect(&player_id);
                apply_intent(&mut self.state, player_id, Intent::Disconnect);
            }
            SessionCommand::Shutdown => return false,
        }

        // Intents apply immediately, so their events go out immediately
        let events = self.state.take_events();
        self.dispatch(events);
        true
    }

    /// Route events to their recipients.
    fn dispatch(&mut self, events: Vec<GameEvent>) {
        for event in events {
            let message = ServerMessage::from(event.data);
            match event.recipient {
                Recipient::All => self.sink.broadcast(message),
                Recipient::Player(id) => self.sink.send_to(&id, message),
            }
        }
    }

    /// Drive the session until shutdown or until every handle is dropped.
    pub async fn run(mut self, mut commands: mpsc::Receiver<SessionCommand>) {
        let mut ticker = interval(self.state.config.interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            "Session {} running at {} Hz",
            hex::encode(&self.id[..4]),
            self.state.config.tick_rate
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => self.step(),
                command = commands.recv() => {
                    let keep_running = match command {
                        Some(command) => self.handle_command(command),
                        None => false,
                    };
                    if !keep_running {
                        break;
                    }
                }
            }
        }

        info!("Session {} stopped at tick {}", hex::encode(&self.id[..4]), self.state.tick());
    }
}

impl ArenaSession<ClientRegistry> {
    /// Spawn a session task with a fresh id and a client registry.
    pub fn spawn(config: ArenaConfig) -> (SessionHandle, JoinHandle<()>) {
        let id = uuid::Uuid::new_v4().into_bytes();
        let session = ArenaSession::new(id, config, ClientRegistry::new());
        let (tx, rx) = mpsc::channel(COMMAND_QUEUE_SIZE);

        let task = tokio::spawn(session.run(rx));
        (SessionHandle { id, tx }, task)
    }
}

/// Cloneable front door to a running session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    /// Session identifier.
    pub id: SessionId,
    tx: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    /// Queue a command.
    pub async fn send(&self, command: SessionCommand) -> Result<(), SessionError> {
        self.tx.send(command).await.map_err(|_| SessionError::Closed)
    }

    /// Register a client's outbound channel.
    pub async fn attach(&self, player_id: PlayerId, sender: mpsc::Sender<ServerMessage>) -> Result<(), SessionError> {
        self.send(SessionCommand::Attach { player_id, sender }).await
    }

    /// Forward an intent.
    pub async fn intent(&self, player_id: PlayerId, intent: Intent) -> Result<(), SessionError> {
        self.send(SessionCommand::Intent { player_id, intent }).await
    }

    /// Report a closed socket.
    pub async fn detach(&self, player_id: PlayerId) -> Result<(), SessionError> {
        self.send(SessionCommand::Detach { player_id }).await
    }

    /// Stop the session.
    pub async fn shutdown(&self) -> Result<(), SessionError> {
        self.send(SessionCommand::Shutdown).await
    }
}

/// Session errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SessionError {
    /// The session task has stopped.
    #[error("Session closed")]
    Closed,
}
