//! Projectile Manager
//!
//! Bullets travel in a straight line at a fixed speed, expire after a fixed
//! number of ticks, and score at most one hit each.

use glam::Vec2;
use tracing::debug;

use crate::game::damage::apply_damage;
use crate::game::state::{ArenaState, PlayerId, PlayerState, Projectile};

/// Check if two circles overlap (touching does not count).
#[inline]
pub fn circles_overlap(a: Vec2, b: Vec2, radius_sum: f32) -> bool {
    a.distance_squared(b) < radius_sum * radius_sum
}

/// Append a projectile moving along `direction`.
///
/// `direction` is normalized here; a zero vector yields a projectile that
/// sits still until its lifetime runs out.
pub fn spawn_projectile(
    state: &mut ArenaState,
    owner: PlayerId,
    origin: Vec2,
    direction: Vec2,
    damage: u32,
    lifetime_ticks: u32,
) -> u32 {
    let velocity = direction.normalize_or_zero() * state.config.bullet_speed;
    let id = state.allocate_projectile_id();

    state.projectiles.push(Projectile {
        id,
        owner,
        position: origin,
        velocity,
        damage,
        lifetime_ticks,
    });

    id
}

/// Fire a bullet from a living player's position along `angle` (radians).
pub fn fire(state: &mut ArenaState, shooter: &PlayerId, angle: f32) -> Option<u32> {
    let origin = match state.players.get(shooter) {
        Some(player) if player.alive => player.position,
        _ => return None,
    };

    let damage = state.config.projectile_damage;
    let lifetime = state.config.projectile_lifetime_ticks;
    Some(spawn_projectile(state, *shooter, origin, Vec2::from_angle(angle), damage, lifetime))
}

/// First living non-owner player touching the projectile, in id order.
fn find_hit<'a>(
    players: impl IntoIterator<Item = &'a PlayerState>,
    projectile: &Projectile,
    radius_sum: f32,
) -> Option<PlayerId> {
    players
        .into_iter()
        .find(|p| {
            p.alive
                && p.id != projectile.owner
                && circles_overlap(p.position, projectile.position, radius_sum)
        })
        .map(|p| p.id)
}

/// Move every projectile one tick and resolve hits.
///
/// Hits go through the damage coordinator immediately, so a player killed
/// by an earlier projectile this tick is no longer a valid target for the
/// later ones. Dropped projectiles are discarded after the sweep.
pub fn advance_projectiles(state: &mut ArenaState) {
    let radius_sum = state.config.player_radius + state.config.projectile_radius;
    let in_flight = std::mem::take(&mut state.projectiles);
    let mut survivors = Vec::with_capacity(in_flight.len());

    for mut projectile in in_flight {
        projectile.position += projectile.velocity;
        projectile.lifetime_ticks = projectile.lifetime_ticks.saturating_sub(1);

        if projectile.lifetime_ticks == 0 || !state.is_in_bounds(projectile.position) {
            continue;
        }

        if let Some(target) = find_hit(state.players.values(), &projectile, radius_sum) {
            let amount = projectile.damage * state.damage_multiplier_of(&projectile.owner);
            debug!("Projectile {} hit {} for {}", projectile.id, target.short(), amount);
            apply_damage(state, target, amount, projectile.owner);
            continue;
        }

        survivors.push(projectile);
    }

    // Nothing above spawns projectiles, but keep anything that appeared
    survivors.append(&mut state.projectiles);
    state.projectiles = survivors;
}
