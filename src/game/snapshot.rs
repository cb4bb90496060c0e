//! Snapshots
//!
//! Serializable views of the arena, assembled once per tick and handed to
//! the broadcast side. Owner references are resolved at capture time, so a
//! disconnected owner shows up as `None`.

use serde::{Serialize, Deserialize};

use crate::core::clock::Millis;
use crate::game::state::{
    AbilityKind, ArenaState, BuffKind, Cosmetic, Minion, PlayerId, PlayerState, Projectile,
};

/// One player as clients see it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSnapshot {
    /// Player id
    pub id: PlayerId,
    /// Display name
    pub name: String,
    /// Look chosen at join
    pub cosmetic: Cosmetic,
    /// World x
    pub x: f32,
    /// World z
    pub z: f32,
    /// Health in [0, 100]
    pub health: u32,
    /// Kill count
    pub kills: u32,
    /// Whether the player is alive
    pub alive: bool,
    /// Hidden from minions
    pub invisible: bool,
    /// Outgoing damage multiplier
    pub damage_multiplier: u32,
    /// Active buff, if any
    pub buff: Option<BuffKind>,
    /// Ability picked at join
    pub ability: AbilityKind,
    /// Simulated time the ability is ready again
    pub cooldown_ready_at: Millis,
}

impl From<&PlayerState> for PlayerSnapshot {
    fn from(p: &PlayerState) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            cosmetic: p.cosmetic.clone(),
            x: p.position.x,
            z: p.position.y,
            health: p.health,
            kills: p.kills,
            alive: p.alive,
            invisible: p.invisible,
            damage_multiplier: p.damage_multiplier,
            buff: p.buff.map(|b| b.kind),
            ability: p.ability,
            cooldown_ready_at: p.cooldown_ready_at,
        }
    }
}

/// One projectile in flight.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectileSnapshot {
    /// Projectile id
    pub id: u32,
    /// Shooter, `None` once they left
    pub owner_id: Option<PlayerId>,
    /// World x
    pub x: f32,
    /// World z
    pub z: f32,
}

/// One live minion.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MinionSnapshot {
    /// Minion id
    pub id: u32,
    /// Summoner, `None` once they left
    pub owner_id: Option<PlayerId>,
    /// World x
    pub x: f32,
    /// World z
    pub z: f32,
}

/// Full arena view broadcast every tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArenaSnapshot {
    /// Tick the snapshot was taken on
    pub tick: u64,
    /// Simulated time at that tick
    pub time_ms: Millis,
    /// Players in id order
    pub players: Vec<PlayerSnapshot>,
    /// Projectiles in spawn order
    pub projectiles: Vec<ProjectileSnapshot>,
    /// Minions in spawn order
    pub minions: Vec<MinionSnapshot>,
}

impl ArenaSnapshot {
    /// Capture the current arena.
    pub fn capture(state: &ArenaState) -> Self {
        let resolve = |owner: &PlayerId| state.players.contains_key(owner).then_some(*owner);

        Self {
            tick: state.tick(),
            time_ms: state.now_ms(),
            players: state.players.values().map(PlayerSnapshot::from).collect(),
            projectiles: state
                .projectiles
                .iter()
                .map(|p: &Projectile| ProjectileSnapshot {
                    id: p.id,
                    owner_id: resolve(&p.owner),
                    x: p.position.x,
                    z: p.position.y,
                })
                .collect(),
            minions: state
                .minions
                .iter()
                .map(|m: &Minion| MinionSnapshot {
                    id: m.id,
                    owner_id: resolve(&m.owner),
                    x: m.position.x,
                    z: m.position.y,
                })
                .collect(),
        }
    }

    /// Look up a player in the snapshot.
    pub fn player(&self, id: &PlayerId) -> Option<&PlayerSnapshot> {
        self.players.iter().find(|p| p.id == *id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use crate::game::state::JoinRequest;
    use crate::game::tick::ArenaConfig;

    #[test]
    fn test_snapshot_resolves_missing_owner() {
        let mut state = ArenaState::new(ArenaConfig::default(), 5);
        let id = PlayerId::new([1; 16]);
        state.join(id, JoinRequest {
            name: "P1".to_string(),
            cosmetic: Cosmetic::default(),
            ability: AbilityKind::Arise,
        });
        state.minions.push(Minion { id: 0, owner: id, position: Vec2::ZERO, lifetime_ticks: 10 });

        let before = ArenaSnapshot::capture(&state);
        assert_eq!(before.minions[0].owner_id, Some(id));

        state.remove(&id);
        let after = ArenaSnapshot::capture(&state);
        assert_eq!(after.minions[0].owner_id, None);
        assert!(after.players.is_empty());
    }

    #[test]
    fn test_player_snapshot_maps_z() {
        let p = PlayerState::new(
            PlayerId::new([3; 16]),
            "P3".to_string(),
            Cosmetic::default(),
            AbilityKind::Saiyan,
            Vec2::new(1.5, -2.5),
        );
        let snap = PlayerSnapshot::from(&p);
        assert_eq!(snap.x, 1.5);
        assert_eq!(snap.z, -2.5);
        let json = serde_json::to_string(&snap).unwrap();
        assert!(json.contains("\"damageMultiplier\":1"));
    }
}
