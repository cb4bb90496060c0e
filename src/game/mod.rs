//! Game Logic Module
//!
//! All arena simulation code. Runs on a single owner per session.
//!
//! ## Module Structure
//!
//! - `state`: Arena state, player state, entities
//! - `intent`: Inbound player actions
//! - `tick`: Fixed-rate simulation step and tuning
//! - `projectile`: Bullet flight and hit testing
//! - `minion`: Homing summons
//! - `ability`: Ability cooldowns and timed buffs
//! - `damage`: Damage, death and respawn
//! - `schedule`: Wake-time ordered deferred work
//! - `leaderboard`: Kill ranking
//! - `snapshot`: Serializable arena views
//! - `events`: Outbound notifications

pub mod state;
pub mod intent;
pub mod tick;
pub mod projectile;
pub mod minion;
pub mod ability;
pub mod damage;
pub mod schedule;
pub mod leaderboard;
pub mod snapshot;
pub mod events;

// Re-export key types
pub use state::{ArenaState, PlayerState, PlayerId, AbilityKind, JoinRequest};
pub use intent::{Intent, apply_intent};
pub use tick::{ArenaConfig, TickResult, tick};
pub use events::{GameEvent, GameEventData, Recipient};
pub use snapshot::ArenaSnapshot;
