//! Game Events
//!
//! Outbound notifications generated by intents and ticks. Each event carries
//! the tick it happened on and who should receive it; the session layer
//! turns them into wire messages.

use serde::{Serialize, Deserialize};
use crate::game::leaderboard::LeaderboardEntry;
use crate::game::snapshot::{ArenaSnapshot, PlayerSnapshot};
use crate::game::state::{AbilityKind, PlayerId};

/// Who an event is delivered to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recipient {
    /// Every connected client
    All,
    /// A single client
    Player(PlayerId),
}

/// Game event data.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum GameEventData {
    /// Sent to a joiner: its own id and the arena as it stands
    Welcome {
        /// The joiner's id
        player_id: PlayerId,
        /// Arena right after the join
        snapshot: ArenaSnapshot,
    },

    /// A player entered the arena
    PlayerJoined {
        /// The new player
        player: PlayerSnapshot,
    },

    /// A player left the arena
    PlayerDisconnected {
        /// Who left
        player_id: PlayerId,
    },

    /// A player's cosmetics changed
    PlayerUpdated {
        /// The player after the change
        player: PlayerSnapshot,
    },

    /// A player took damage
    PlayerHit {
        /// Who was hit
        player_id: PlayerId,
        /// Health after the hit
        health: u32,
        /// Damage dealt
        damage: u32,
    },

    /// Someone died
    KillFeed {
        /// Killer's name, `None` if uncredited
        killer: Option<String>,
        /// Victim's name
        victim: String,
        /// Killer's id, `None` if uncredited
        killer_id: Option<PlayerId>,
        /// Victim's id
        victim_id: PlayerId,
    },

    /// Victim-only notice of who killed them
    YouDied {
        /// Killer's name, `None` if uncredited
        killer: Option<String>,
        /// Whole seconds until respawn
        respawn_seconds: u32,
    },

    /// A dead player came back
    PlayerRespawn {
        /// The player after respawn
        player: PlayerSnapshot,
    },

    /// Top players by kills
    LeaderboardUpdate {
        /// At most five entries
        top: Vec<LeaderboardEntry>,
    },

    /// A player fired their ability
    AbilityUsed {
        /// Who used it
        player_id: PlayerId,
        /// Which ability
        kind: AbilityKind,
    },
}

/// A game event with timing and routing.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameEvent {
    /// Tick when event occurred
    pub tick: u64,

    /// Delivery target
    pub recipient: Recipient,

    /// Event data
    pub data: GameEventData,
}

impl GameEvent {
    /// Create an event for every client.
    pub fn broadcast(tick: u64, data: GameEventData) -> Self {
        Self {
            tick,
            recipient: Recipient::All,
            data,
        }
    }

    /// Create an event for a single client.
    pub fn to_player(tick: u64, player_id: PlayerId, data: GameEventData) -> Self {
        Self {
            tick,
            recipient: Recipient::Player(player_id),
            data,
        }
    }

    /// Create player hit event.
    pub fn player_hit(tick: u64, player_id: PlayerId, health: u32, damage: u32) -> Self {
        Self::broadcast(tick, GameEventData::PlayerHit { player_id, health, damage })
    }

    /// Create kill feed event.
    pub fn kill_feed(
        tick: u64,
        killer: Option<(PlayerId, String)>,
        victim_id: PlayerId,
        victim: String,
    ) -> Self {
        let (killer_id, killer) = match killer {
            Some((id, name)) => (Some(id), Some(name)),
            None => (None, None),
        };
        Self::broadcast(tick, GameEventData::KillFeed { killer, victim, killer_id, victim_id })
    }

    /// Create the victim-only death notice.
    pub fn you_died(tick: u64, victim_id: PlayerId, killer: Option<String>, respawn_seconds: u32) -> Self {
        Self::to_player(tick, victim_id, GameEventData::YouDied { killer, respawn_seconds })
    }

    /// Create ability used event.
    pub fn ability_used(tick: u64, player_id: PlayerId, kind: AbilityKind) -> Self {
        Self::broadcast(tick, GameEventData::AbilityUsed { player_id, kind })
    }

    /// Short name for log lines.
    pub fn name(&self) -> &'static str {
        match self.data {
            GameEventData::Welcome { .. } => "welcome",
            GameEventData::PlayerJoined { .. } => "playerJoined",
            GameEventData::PlayerDisconnected { .. } => "playerDisconnected",
            GameEventData::PlayerUpdated { .. } => "playerUpdated",
            GameEventData::PlayerHit { .. } => "playerHit",
            GameEventData::KillFeed { .. } => "killFeed",
            GameEventData::YouDied { .. } => "youDied",
            GameEventData::PlayerRespawn { .. } => "playerRespawn",
            GameEventData::LeaderboardUpdate { .. } => "leaderboardUpdate",
            GameEventData::AbilityUsed { .. } => "abilityUsed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kill_feed_without_killer() {
        let victim = PlayerId::new([2; 16]);
        let event = GameEvent::kill_feed(7, None, victim, "P2".to_string());

        match event.data {
            GameEventData::KillFeed { killer, killer_id, victim_id, .. } => {
                assert!(killer.is_none());
                assert!(killer_id.is_none());
                assert_eq!(victim_id, victim);
            }
            _ => panic!("Wrong event type"),
        }
        assert_eq!(event.recipient, Recipient::All);
    }

    #[test]
    fn test_you_died_is_targeted() {
        let victim = PlayerId::new([2; 16]);
        let event = GameEvent::you_died(1, victim, Some("P1".to_string()), 5);
        assert_eq!(event.recipient, Recipient::Player(victim));
        assert_eq!(event.name(), "youDied");
    }
}
