//! Protocol Messages
//!
//! Wire format for client-server communication over WebSocket.
//! Messages are JSON text frames tagged by `type`. Snapshots can
//! optionally go out as bincode binary frames to save bandwidth.

use serde::{Serialize, Deserialize};

use crate::game::events::GameEventData;
use crate::game::intent::Intent;
use crate::game::leaderboard::LeaderboardEntry;
use crate::game::snapshot::{ArenaSnapshot, PlayerSnapshot};
use crate::game::state::{AbilityKind, Cosmetic, JoinRequest, PlayerId};

// =============================================================================
// CLIENT -> SERVER MESSAGES
// =============================================================================

/// Messages sent from client to server.
///
/// An unknown `ability` name fails to decode, so it never reaches the
/// simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    /// Enter the arena.
    Join {
        /// Display name.
        name: String,
        /// Look; optional.
        #[serde(default)]
        cosmetic: Cosmetic,
        /// `arise`, `scaredy` or `saiyan`.
        ability: AbilityKind,
    },

    /// Report the client-side position.
    Move {
        /// World x.
        x: f32,
        /// World z.
        z: f32,
    },

    /// Fire along an aim angle in radians.
    Shoot {
        /// Aim angle.
        angle: f32,
    },

    /// Use the ability picked at join.
    UseAbility,

    /// Change colour.
    UpdateCosmetic {
        /// Hex colour or "original".
        color: String,
    },

    /// Leave the arena without closing the socket.
    Disconnect,

    /// Ping for latency measurement.
    Ping {
        /// Client timestamp, echoed back.
        timestamp: u64,
    },
}

impl ClientMessage {
    /// Convert to a simulation intent. Pings are answered by the gateway.
    pub fn into_intent(self) -> Option<Intent> {
        match self {
            ClientMessage::Join { name, cosmetic, ability } => {
                Some(Intent::Join(JoinRequest { name, cosmetic, ability }))
            }
            ClientMessage::Move { x, z } => Some(Intent::Move { x, z }),
            ClientMessage::Shoot { angle } => Some(Intent::Shoot { angle }),
            ClientMessage::UseAbility => Some(Intent::UseAbility),
            ClientMessage::UpdateCosmetic { color } => Some(Intent::UpdateCosmetic { color }),
            ClientMessage::Disconnect => Some(Intent::Disconnect),
            ClientMessage::Ping { .. } => None,
        }
    }
}

// =============================================================================
// SERVER -> CLIENT MESSAGES
// =============================================================================

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    /// Full arena snapshot (every tick).
    GameState(ArenaSnapshot),

    /// Sent once after join.
    Welcome {
        /// Your player id.
        player_id: PlayerId,
        /// Arena as it stands.
        snapshot: ArenaSnapshot,
    },

    /// A player entered.
    PlayerJoined {
        /// The new player.
        player: PlayerSnapshot,
    },

    /// A player left.
    PlayerDisconnected {
        /// Who left.
        id: PlayerId,
    },

    /// A player changed cosmetics.
    PlayerUpdated {
        /// The player after the change.
        player: PlayerSnapshot,
    },

    /// A player took damage.
    PlayerHit {
        /// Who was hit.
        id: PlayerId,
        /// Health after the hit.
        health: u32,
        /// Damage dealt.
        damage: u32,
    },

    /// Someone died.
    KillFeed {
        /// Killer's name, if credited.
        killer: Option<String>,
        /// Victim's name.
        victim: String,
        /// Killer's id, if credited.
        killer_id: Option<PlayerId>,
    },

    /// You died.
    YouDied {
        /// Killer's name, if credited.
        killer: Option<String>,
        /// Whole seconds until respawn.
        respawn_seconds: u32,
    },

    /// A player came back.
    PlayerRespawn {
        /// The player after respawn.
        player: PlayerSnapshot,
    },

    /// Top five by kills.
    LeaderboardUpdate {
        /// Ranked entries.
        top: Vec<LeaderboardEntry>,
    },

    /// A player used an ability.
    AbilityUsed {
        /// Who used it.
        id: PlayerId,
        /// Which ability.
        kind: AbilityKind,
    },

    /// Pong response.
    Pong {
        /// Echoed client timestamp.
        timestamp: u64,
        /// Server wall clock in Unix milliseconds.
        server_time: u64,
    },

    /// Error message.
    Error(ServerError),

    /// Server is shutting down.
    Shutdown {
        /// Why.
        reason: String,
    },
}

impl From<GameEventData> for ServerMessage {
    fn from(data: GameEventData) -> Self {
        match data {
            GameEventData::Welcome { player_id, snapshot } => {
                ServerMessage::Welcome { player_id, snapshot }
            }
            GameEventData::PlayerJoined { player } => ServerMessage::PlayerJoined { player },
            GameEventData::PlayerDisconnected { player_id } => {
                ServerMessage::PlayerDisconnected { id: player_id }
            }
            GameEventData::PlayerUpdated { player } => ServerMessage::PlayerUpdated { player },
            GameEventData::PlayerHit { player_id, health, damage } => {
                ServerMessage::PlayerHit { id: player_id, health, damage }
            }
            GameEventData::KillFeed { killer, victim, killer_id, .. } => {
                ServerMessage::KillFeed { killer, victim, killer_id }
            }
            GameEventData::YouDied { killer, respawn_seconds } => {
                ServerMessage::YouDied { killer, respawn_seconds }
            }
            GameEventData::PlayerRespawn { player } => ServerMessage::PlayerRespawn { player },
            GameEventData::LeaderboardUpdate { top } => ServerMessage::LeaderboardUpdate { top },
            GameEventData::AbilityUsed { player_id, kind } => {
                ServerMessage::AbilityUsed { id: player_id, kind }
            }
        }
    }
}

/// Server error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerError {
    /// Error code.
    pub code: ErrorCode,
    /// Human-readable message.
    pub message: String,
}

/// Error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Too many connections.
    ServerFull,
    /// Session is gone.
    SessionClosed,
}

// =============================================================================
// SERIALIZATION HELPERS
// =============================================================================

impl ClientMessage {
    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl ServerMessage {
    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// Short name for log lines.
    pub fn name(&self) -> &'static str {
        match self {
            ServerMessage::GameState(_) => "gameState",
            ServerMessage::Welcome { .. } => "welcome",
            ServerMessage::PlayerJoined { .. } => "playerJoined",
            ServerMessage::PlayerDisconnected { .. } => "playerDisconnected",
            ServerMessage::PlayerUpdated { .. } => "playerUpdated",
            ServerMessage::PlayerHit { .. } => "playerHit",
            ServerMessage::KillFeed { .. } => "killFeed",
            ServerMessage::YouDied { .. } => "youDied",
            ServerMessage::PlayerRespawn { .. } => "playerRespawn",
            ServerMessage::LeaderboardUpdate { .. } => "leaderboardUpdate",
            ServerMessage::AbilityUsed { .. } => "abilityUsed",
            ServerMessage::Pong { .. } => "pong",
            ServerMessage::Error(_) => "error",
            ServerMessage::Shutdown { .. } => "shutdown",
        }
    }
}

/// Encode a snapshot for a binary frame.
///
/// Tagged enums are not supported by bincode, so binary frames carry the
/// bare snapshot and the frame type tells them apart from JSON messages.
pub fn snapshot_to_bytes(snapshot: &ArenaSnapshot) -> Result<Vec<u8>, bincode::Error> {
    bincode::serialize(snapshot)
}

/// Decode a snapshot from a binary frame.
pub fn snapshot_from_bytes(data: &[u8]) -> Result<ArenaSnapshot, bincode::Error> {
    bincode::deserialize(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_message_parses() {
        let json = r##"{"type":"join","name":"Foxy","cosmetic":{"model":"fox","color":"#ff8800"},"ability":"saiyan"}"##;
        let msg = ClientMessage::from_json(json).unwrap();

        match msg.into_intent() {
            Some(Intent::Join(request)) => {
                assert_eq!(request.name, "Foxy");
                assert_eq!(request.cosmetic.model, "fox");
                assert_eq!(request.ability, AbilityKind::Saiyan);
            }
            other => panic!("Wrong intent: {:?}", other),
        }
    }

    #[test]
    fn test_join_without_cosmetic() {
        let msg = ClientMessage::from_json(r#"{"type":"join","name":"P","ability":"arise"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::Join { cosmetic, .. } if cosmetic == Cosmetic::default()));
    }

    #[test]
    fn test_unknown_ability_rejected() {
        let json = r#"{"type":"join","name":"P","ability":"teleport"}"#;
        assert!(ClientMessage::from_json(json).is_err());
    }

    #[test]
    fn test_client_message_names() {
        let msg = ClientMessage::from_json(r#"{"type":"useAbility"}"#).unwrap();
        assert_eq!(msg, ClientMessage::UseAbility);

        let msg = ClientMessage::from_json(r#"{"type":"updateCosmetic","color":"original"}"#).unwrap();
        assert_eq!(msg.into_intent(), Some(Intent::UpdateCosmetic { color: "original".to_string() }));

        let ping = ClientMessage::Ping { timestamp: 5 };
        assert_eq!(ClientMessage::from_json(&ping.to_json().unwrap()).unwrap(), ping);
        assert!(ping.into_intent().is_none());
    }

    #[test]
    fn test_server_message_field_names() {
        let id = PlayerId::new([1; 16]);
        let msg = ServerMessage::from(GameEventData::PlayerHit { player_id: id, health: 90, damage: 10 });
        let json = msg.to_json().unwrap();
        assert!(json.contains("\"type\":\"playerHit\""));
        assert!(json.contains("\"health\":90"));

        let msg = ServerMessage::YouDied { killer: Some("P1".to_string()), respawn_seconds: 5 };
        let json = msg.to_json().unwrap();
        assert!(json.contains("\"respawnSeconds\":5"));
        assert_eq!(ServerMessage::from_json(&json).unwrap().name(), "youDied");
    }

    #[test]
    fn test_kill_feed_drops_victim_id() {
        let killer = PlayerId::new([1; 16]);
        let msg = ServerMessage::from(GameEventData::KillFeed {
            killer: Some("P1".to_string()),
            victim: "P2".to_string(),
            killer_id: Some(killer),
            victim_id: PlayerId::new([2; 16]),
        });
        let json = msg.to_json().unwrap();
        assert!(json.contains("\"killerId\""));
        assert!(!json.contains("victimId"));
    }

    #[test]
    fn test_game_state_json() {
        let snapshot = ArenaSnapshot {
            tick: 3,
            time_ms: 50,
            players: Vec::new(),
            projectiles: Vec::new(),
            minions: Vec::new(),
        };
        let json = ServerMessage::GameState(snapshot).to_json().unwrap();
        assert!(json.contains("\"type\":\"gameState\""));
        assert!(json.contains("\"timeMs\":50"));
    }

    #[test]
    fn test_binary_snapshot() {
        let snapshot = ArenaSnapshot {
            tick: 9,
            time_ms: 150,
            players: Vec::new(),
            projectiles: Vec::new(),
            minions: Vec::new(),
        };
        let bytes = snapshot_to_bytes(&snapshot).unwrap();
        assert_eq!(snapshot_from_bytes(&bytes).unwrap(), snapshot);
    }
}
