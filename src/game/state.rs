//! Game State Definitions
//!
//! The simulation context (`ArenaState`) and every entity it owns.
//! Players live in a BTreeMap so iteration order (hit testing, targeting,
//! leaderboard ties) is the same on every run.

use std::collections::BTreeMap;
use glam::Vec2;
use serde::{Serialize, Deserialize};

use crate::core::clock::{Millis, SimClock};
use crate::core::rng::DeterministicRng;
use crate::game::events::{GameEvent, GameEventData};
use crate::game::leaderboard;
use crate::game::schedule::Schedule;
use crate::game::snapshot::{ArenaSnapshot, PlayerSnapshot};
use crate::game::tick::ArenaConfig;

/// Full health for every player.
pub const MAX_HEALTH: u32 = 100;

// =============================================================================
// PLAYER ID
// =============================================================================

/// Unique player identifier (UUID as bytes).
///
/// Implements Ord for deterministic BTreeMap ordering. Serialized as a
/// UUID string so clients can use it as a map key directly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[derive(Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct PlayerId(pub [u8; 16]);

impl PlayerId {
    /// Create from raw bytes.
    pub const fn new(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Generate a fresh random id for a new connection.
    pub fn random() -> Self {
        Self(*uuid::Uuid::new_v4().as_bytes())
    }

    /// Create from UUID string.
    pub fn from_uuid_str(s: &str) -> Option<Self> {
        uuid::Uuid::parse_str(s)
            .ok()
            .map(|u| Self(*u.as_bytes()))
    }

    /// Convert to UUID string.
    pub fn to_uuid_string(&self) -> String {
        uuid::Uuid::from_bytes(self.0).to_string()
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// First four bytes in hex, for log lines.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl From<PlayerId> for String {
    fn from(id: PlayerId) -> Self {
        id.to_uuid_string()
    }
}

impl TryFrom<String> for PlayerId {
    type Error = uuid::Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        uuid::Uuid::parse_str(&s).map(|u| Self(*u.as_bytes()))
    }
}

// =============================================================================
// ABILITIES & BUFFS
// =============================================================================

/// Ability a player picks at join time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum AbilityKind {
    /// Summon a homing minion
    Arise = 0,
    /// Become invisible to minions
    Scaredy = 1,
    /// Double outgoing damage
    Saiyan = 2,
}

/// Timed status effect currently on a player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuffKind {
    /// Invisible flag set
    Scaredy,
    /// Damage multiplier raised
    Saiyan,
}

/// Active buff with its expiry timestamp.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Buff {
    /// Which effect is active
    pub kind: BuffKind,
    /// Simulated time the effect ends
    pub expires_at: Millis,
}

/// Client-chosen look, relayed verbatim.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cosmetic {
    /// Character model ("fox", "raccoon", ...)
    #[serde(default)]
    pub model: String,
    /// Colour as a hex string or "original"
    #[serde(default)]
    pub color: String,
}

// =============================================================================
// PLAYER STATE
// =============================================================================

/// State of a single player in the arena.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlayerState {
    /// Unique player ID (stable per connection)
    pub id: PlayerId,

    /// Display name
    pub name: String,

    /// Look chosen at join
    pub cosmetic: Cosmetic,

    /// Position on the x/z plane (`Vec2::y` holds z)
    pub position: Vec2,

    /// Health in [0, MAX_HEALTH]
    pub health: u32,

    /// Number of players killed
    pub kills: u32,

    /// Always equal to `health > 0`
    pub alive: bool,

    /// Outgoing damage multiplier (1 at baseline)
    pub damage_multiplier: u32,

    /// Hidden from minion targeting
    pub invisible: bool,

    /// At most one active buff
    pub buff: Option<Buff>,

    /// Ability picked at join
    pub ability: AbilityKind,

    /// Simulated time at which the ability is usable again
    pub cooldown_ready_at: Millis,
}

impl PlayerState {
    /// Create a new player at the given position.
    pub fn new(id: PlayerId, name: String, cosmetic: Cosmetic, ability: AbilityKind, position: Vec2) -> Self {
        Self {
            id,
            name,
            cosmetic,
            position,
            health: MAX_HEALTH,
            kills: 0,
            alive: true,
            damage_multiplier: 1,
            invisible: false,
            buff: None,
            ability,
            cooldown_ready_at: 0,
        }
    }

    /// Check if the ability is off cooldown.
    #[inline]
    pub fn ability_ready(&self, now: Millis) -> bool {
        now >= self.cooldown_ready_at
    }

    /// Drop every timed effect and return to baseline.
    pub fn reset_effects(&mut self) {
        self.buff = None;
        self.invisible = false;
        self.damage_multiplier = 1;
    }
}

// =============================================================================
// PROJECTILES & MINIONS
// =============================================================================

/// A bullet in flight.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Projectile {
    /// Unique projectile ID (monotonic counter)
    pub id: u32,
    /// Shooter; may no longer exist
    pub owner: PlayerId,
    /// Current position
    pub position: Vec2,
    /// Displacement per tick
    pub velocity: Vec2,
    /// Base damage before the owner's multiplier
    pub damage: u32,
    /// Ticks left before it is dropped
    pub lifetime_ticks: u32,
}

/// A homing summon created by the "arise" ability.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Minion {
    /// Unique minion ID (monotonic counter)
    pub id: u32,
    /// Summoner; may no longer exist
    pub owner: PlayerId,
    /// Current position
    pub position: Vec2,
    /// Ticks left before it fizzles
    pub lifetime_ticks: u32,
}

// =============================================================================
// JOIN REQUEST
// =============================================================================

/// Attributes supplied by a join intent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinRequest {
    /// Display name
    pub name: String,
    /// Look, defaulted when omitted
    #[serde(default)]
    pub cosmetic: Cosmetic,
    /// Ability for the whole stay
    pub ability: AbilityKind,
}

// =============================================================================
// ARENA STATE
// =============================================================================

/// The simulation context for one session.
///
/// Every mutation goes through this object; nothing is global. A session
/// owns exactly one and never shares it.
#[derive(Clone, Debug)]
pub struct ArenaState {
    /// Gameplay tuning
    pub config: ArenaConfig,

    /// Tick-driven simulated clock
    pub clock: SimClock,

    /// Seeded RNG (spawn points, minion notice rolls)
    pub rng: DeterministicRng,

    /// Entity store (BTreeMap for deterministic iteration)
    pub players: BTreeMap<PlayerId, PlayerState>,

    /// In-flight projectiles, in spawn order
    pub projectiles: Vec<Projectile>,

    /// Live minions, in spawn order
    pub minions: Vec<Minion>,

    /// Deferred work keyed by wake time
    pub schedule: Schedule,

    /// Next projectile ID (monotonic counter)
    pub next_projectile_id: u32,

    /// Next minion ID (monotonic counter)
    pub next_minion_id: u32,

    /// Events generated since the last drain
    pending_events: Vec<GameEvent>,
}

impl ArenaState {
    /// Create an empty arena.
    pub fn new(config: ArenaConfig, rng_seed: u64) -> Self {
        Self {
            clock: SimClock::new(config.tick_rate),
            config,
            rng: DeterministicRng::new(rng_seed),
            players: BTreeMap::new(),
            projectiles: Vec::new(),
            minions: Vec::new(),
            schedule: Schedule::new(),
            next_projectile_id: 0,
            next_minion_id: 0,
            pending_events: Vec::new(),
        }
    }

    /// Current simulated time.
    #[inline]
    pub fn now_ms(&self) -> Millis {
        self.clock.now_ms()
    }

    /// Current tick number.
    #[inline]
    pub fn tick(&self) -> u64 {
        self.clock.tick()
    }

    /// Add a player at a random in-bounds point.
    ///
    /// Returns `None` without touching anything if the id is already present.
    pub fn join(&mut self, id: PlayerId, request: JoinRequest) -> Option<&PlayerState> {
        if self.players.contains_key(&id) {
            return None;
        }

        let spawn_pos = self.rng.random_position(self.config.arena_half_extent);
        let player = PlayerState::new(id, request.name, request.cosmetic, request.ability, spawn_pos);
        let joined = PlayerSnapshot::from(&player);
        self.players.insert(id, player);

        self.push_event(GameEvent::broadcast(self.tick(), GameEventData::PlayerJoined { player: joined }));
        let welcome = GameEventData::Welcome {
            player_id: id,
            snapshot: ArenaSnapshot::capture(self),
        };
        self.push_event(GameEvent::to_player(self.tick(), id, welcome));

        self.players.get(&id)
    }

    /// Overwrite a player's position verbatim.
    pub fn apply_movement(&mut self, id: &PlayerId, position: Vec2) {
        if let Some(player) = self.players.get_mut(id) {
            player.position = position;
        }
    }

    /// Replace a player's colour.
    pub fn update_cosmetic(&mut self, id: &PlayerId, color: String) {
        let Some(player) = self.players.get_mut(id) else {
            return;
        };
        player.cosmetic.color = color;
        let updated = PlayerSnapshot::from(&*player);
        self.push_event(GameEvent::broadcast(self.tick(), GameEventData::PlayerUpdated { player: updated }));
    }

    /// Remove a player. Owned projectiles and minions stay in flight.
    pub fn remove(&mut self, id: &PlayerId) -> Option<PlayerState> {
        let removed = self.players.remove(id)?;

        self.push_event(GameEvent::broadcast(self.tick(), GameEventData::PlayerDisconnected { player_id: *id }));
        leaderboard::publish(self);

        Some(removed)
    }

    /// Get a player by ID.
    pub fn get_player(&self, id: &PlayerId) -> Option<&PlayerState> {
        self.players.get(id)
    }

    /// Get a player mutably by ID.
    pub fn get_player_mut(&mut self, id: &PlayerId) -> Option<&mut PlayerState> {
        self.players.get_mut(id)
    }

    /// Resolve an owner reference to its current damage multiplier (1 if gone).
    pub fn damage_multiplier_of(&self, owner: &PlayerId) -> u32 {
        self.players
            .get(owner)
            .map(|p| p.damage_multiplier)
            .unwrap_or(1)
    }

    /// Check if a position lies inside the arena square.
    pub fn is_in_bounds(&self, pos: Vec2) -> bool {
        let half = self.config.arena_half_extent;
        pos.x.abs() <= half && pos.y.abs() <= half
    }

    /// Count of players currently alive.
    pub fn alive_count(&self) -> usize {
        self.players.values().filter(|p| p.alive).count()
    }

    /// Allocate the next projectile ID.
    pub(crate) fn allocate_projectile_id(&mut self) -> u32 {
        let id = self.next_projectile_id;
        self.next_projectile_id = self.next_projectile_id.wrapping_add(1);
        id
    }

    /// Allocate the next minion ID.
    pub(crate) fn allocate_minion_id(&mut self) -> u32 {
        let id = self.next_minion_id;
        self.next_minion_id = self.next_minion_id.wrapping_add(1);
        id
    }

    /// Take pending events (consumes them).
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Push a game event.
    pub fn push_event(&mut self, event: GameEvent) {
        self.pending_events.push(event);
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::events::Recipient;

    fn join_request(name: &str) -> JoinRequest {
        JoinRequest {
            name: name.to_string(),
            cosmetic: Cosmetic::default(),
            ability: AbilityKind::Arise,
        }
    }

    #[test]
    fn test_player_id_ordering() {
        let id1 = PlayerId::new([0; 16]);
        let id2 = PlayerId::new([1; 16]);
        assert!(id1 < id2);
    }

    #[test]
    fn test_player_id_uuid_roundtrip() {
        let id = PlayerId::random();
        let parsed = PlayerId::from_uuid_str(&id.to_uuid_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_player_id_serializes_as_string() {
        let id = PlayerId::new([0xab; 16]);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.to_uuid_string()));
        let back: PlayerId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_join_defaults() {
        let mut state = ArenaState::new(ArenaConfig::default(), 1);
        let id = PlayerId::new([1; 16]);

        let player = state.join(id, join_request("P1")).unwrap();
        assert_eq!(player.health, MAX_HEALTH);
        assert_eq!(player.kills, 0);
        assert!(player.alive);
        assert_eq!(player.damage_multiplier, 1);
        assert!(!player.invisible);
        assert!(player.buff.is_none());

        let pos = player.position;
        assert!(state.is_in_bounds(pos));
    }

    #[test]
    fn test_duplicate_join_is_noop() {
        let mut state = ArenaState::new(ArenaConfig::default(), 1);
        let id = PlayerId::new([1; 16]);

        state.join(id, join_request("first"));
        state.take_events();
        assert!(state.join(id, join_request("second")).is_none());

        assert_eq!(state.get_player(&id).unwrap().name, "first");
        assert!(state.take_events().is_empty());
    }

    #[test]
    fn test_join_emits_joined_and_welcome() {
        let mut state = ArenaState::new(ArenaConfig::default(), 1);
        let id = PlayerId::new([1; 16]);
        state.join(id, join_request("P1"));

        let events = state.take_events();
        assert!(matches!(events[0].data, GameEventData::PlayerJoined { .. }));
        assert_eq!(events[0].recipient, Recipient::All);
        assert!(matches!(events[1].data, GameEventData::Welcome { player_id, .. } if player_id == id));
        assert_eq!(events[1].recipient, Recipient::Player(id));
    }

    #[test]
    fn test_movement_accepted_verbatim() {
        let mut state = ArenaState::new(ArenaConfig::default(), 1);
        let id = PlayerId::new([1; 16]);
        state.join(id, join_request("P1"));

        // Far outside the arena: still accepted
        state.apply_movement(&id, Vec2::new(999.0, -999.0));
        assert_eq!(state.get_player(&id).unwrap().position, Vec2::new(999.0, -999.0));
    }

    #[test]
    fn test_unknown_ids_are_silent() {
        let mut state = ArenaState::new(ArenaConfig::default(), 1);
        let ghost = PlayerId::new([9; 16]);

        state.apply_movement(&ghost, Vec2::ONE);
        state.update_cosmetic(&ghost, "#ff0000".to_string());
        assert!(state.remove(&ghost).is_none());
        assert!(state.take_events().is_empty());
    }

    #[test]
    fn test_remove_keeps_owned_entities() {
        let mut state = ArenaState::new(ArenaConfig::default(), 1);
        let id = PlayerId::new([1; 16]);
        state.join(id, join_request("P1"));
        state.projectiles.push(Projectile {
            id: 0,
            owner: id,
            position: Vec2::ZERO,
            velocity: Vec2::X,
            damage: 10,
            lifetime_ticks: 10,
        });

        state.remove(&id);
        assert!(state.get_player(&id).is_none());
        assert_eq!(state.projectiles.len(), 1);
        assert_eq!(state.damage_multiplier_of(&id), 1);
    }

    #[test]
    fn test_remove_republishes_leaderboard() {
        let mut state = ArenaState::new(ArenaConfig::default(), 1);
        let stays = PlayerId::new([1; 16]);
        let leaves = PlayerId::new([2; 16]);
        state.join(stays, join_request("stays"));
        state.join(leaves, join_request("leaves"));
        state.get_player_mut(&leaves).unwrap().kills = 3;
        state.take_events();

        state.remove(&leaves);

        let events = state.take_events();
        let names: Vec<_> = events.iter().map(|e| e.name()).collect();
        assert_eq!(names, ["playerDisconnected", "leaderboardUpdate"]);
        match &events[1].data {
            GameEventData::LeaderboardUpdate { top } => {
                assert_eq!(top.len(), 1);
                assert_eq!(top[0].name, "stays");
            }
            _ => panic!("Wrong event type"),
        }
    }

    #[test]
    fn test_update_cosmetic() {
        let mut state = ArenaState::new(ArenaConfig::default(), 1);
        let id = PlayerId::new([1; 16]);
        state.join(id, join_request("P1"));
        state.take_events();

        state.update_cosmetic(&id, "#00ff00".to_string());
        assert_eq!(state.get_player(&id).unwrap().cosmetic.color, "#00ff00");
        let events = state.take_events();
        assert!(matches!(events[0].data, GameEventData::PlayerUpdated { .. }));
    }

    #[test]
    fn test_spawn_positions_deterministic() {
        let mut state1 = ArenaState::new(ArenaConfig::default(), 12345);
        let mut state2 = ArenaState::new(ArenaConfig::default(), 12345);

        for i in 0..4 {
            let id = PlayerId::new([i; 16]);
            state1.join(id, join_request("p"));
            state2.join(id, join_request("p"));
        }

        for id in state1.players.keys() {
            assert_eq!(state1.players[id].position, state2.players[id].position);
        }
    }
}
