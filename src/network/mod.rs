//! Network Layer
//!
//! WebSocket gateway and the session actor that serializes every client
//! intent with the tick. Simulation logic lives in `game/`.

pub mod protocol;
pub mod session;
pub mod server;

pub use protocol::{ClientMessage, ServerMessage, ErrorCode};
pub use session::{ArenaSession, ClientRegistry, EventSink, SessionCommand, SessionHandle, SessionError, SessionId};
pub use server::{GameServer, ServerConfig, GameServerError};
