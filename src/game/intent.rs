//! Player Intents
//!
//! Inbound client actions, already decoded and tagged with the sender.
//! They apply immediately, between ticks, on the same context the tick
//! mutates.

use glam::Vec2;
use tracing::debug;

use crate::game::ability::use_ability;
use crate::game::projectile::fire;
use crate::game::state::{ArenaState, JoinRequest, PlayerId};

/// One action from one client.
#[derive(Clone, Debug, PartialEq)]
pub enum Intent {
    /// Enter the arena
    Join(JoinRequest),
    /// Report a new position (trusted as-is)
    Move {
        /// World x
        x: f32,
        /// World z
        z: f32,
    },
    /// Fire a bullet along the aim angle (radians)
    Shoot {
        /// Aim angle in radians
        angle: f32,
    },
    /// Use the ability picked at join
    UseAbility,
    /// Leave the arena
    Disconnect,
    /// Change colour
    UpdateCosmetic {
        /// New colour, hex string or "original"
        color: String,
    },
}

impl Intent {
    /// Short name for log lines.
    pub fn name(&self) -> &'static str {
        match self {
            Intent::Join(_) => "join",
            Intent::Move { .. } => "move",
            Intent::Shoot { .. } => "shoot",
            Intent::UseAbility => "useAbility",
            Intent::Disconnect => "disconnect",
            Intent::UpdateCosmetic { .. } => "updateCosmetic",
        }
    }
}

/// Apply an intent from `player_id`.
///
/// Rejected intents (unknown sender, dead shooter, cooldown) leave the
/// arena untouched and produce no events.
pub fn apply_intent(state: &mut ArenaState, player_id: PlayerId, intent: Intent) {
    match intent {
        Intent::Join(request) => {
            if state.join(player_id, request).is_none() {
                debug!("Duplicate join from {} ignored", player_id.short());
            }
        }
        Intent::Move { x, z } => {
            state.apply_movement(&player_id, Vec2::new(x, z));
        }
        Intent::Shoot { angle } => {
            if fire(state, &player_id, angle).is_none() {
                debug!("Shot from {} rejected", player_id.short());
            }
        }
        Intent::UseAbility => {
            if !use_ability(state, player_id) {
                debug!("Ability use from {} rejected", player_id.short());
            }
        }
        Intent::Disconnect => {
            state.remove(&player_id);
        }
        Intent::UpdateCosmetic { color } => {
            state.update_cosmetic(&player_id, color);
        }
    }
}
