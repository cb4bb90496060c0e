//! Minion Manager
//!
//! Summoned minions home in on the nearest visible enemy one fixed step per
//! tick and explode on contact.

use std::collections::BTreeMap;

use glam::Vec2;
use tracing::debug;

use crate::core::rng::DeterministicRng;
use crate::game::damage::apply_damage;
use crate::game::state::{ArenaState, Minion, PlayerId, PlayerState};

/// Append a minion next to its owner.
pub fn spawn_minion(state: &mut ArenaState, owner: PlayerId, origin: Vec2, lifetime_ticks: u32) -> u32 {
    let half = state.config.arena_half_extent;
    let position = (origin + Vec2::new(state.config.minion_spawn_offset, 0.0))
        .clamp(Vec2::splat(-half), Vec2::splat(half));
    let id = state.allocate_minion_id();

    state.minions.push(Minion {
        id,
        owner,
        position,
        lifetime_ticks,
    });

    id
}

/// Nearest living non-owner player the minion can see.
///
/// Invisible players are skipped unless a notice roll succeeds. The roll is
/// only drawn for invisible candidates, so sessions without invisibility
/// never touch the RNG here.
fn nearest_target(
    players: &BTreeMap<PlayerId, PlayerState>,
    rng: &mut DeterministicRng,
    minion: &Minion,
    notice_chance: f32,
) -> Option<(PlayerId, Vec2)> {
    let mut best: Option<(PlayerId, Vec2, f32)> = None;

    for player in players.values() {
        if !player.alive || player.id == minion.owner {
            continue;
        }
        if player.invisible && !rng.chance(notice_chance) {
            continue;
        }

        let dist_sq = minion.position.distance_squared(player.position);
        if best.map_or(true, |(_, _, d)| dist_sq < d) {
            best = Some((player.id, player.position, dist_sq));
        }
    }

    best.map(|(id, pos, _)| (id, pos))
}

/// Age, steer and detonate every minion.
pub fn advance_minions(state: &mut ArenaState) {
    let step = state.config.minion_step;
    let contact = state.config.minion_contact_radius;
    let notice_chance = state.config.minion_notice_chance;
    let base_damage = state.config.minion_damage;

    let live = std::mem::take(&mut state.minions);
    let mut survivors = Vec::with_capacity(live.len());

    for mut minion in live {
        minion.lifetime_ticks = minion.lifetime_ticks.saturating_sub(1);
        if minion.lifetime_ticks == 0 {
            continue;
        }

        let Some((target, target_pos)) =
            nearest_target(&state.players, &mut state.rng, &minion, notice_chance)
        else {
            survivors.push(minion);
            continue;
        };

        let to_target = target_pos - minion.position;
        let bearing = to_target.y.atan2(to_target.x);
        minion.position += Vec2::from_angle(bearing) * step;

        if minion.position.distance(target_pos) < contact {
            let amount = base_damage * state.damage_multiplier_of(&minion.owner);
            debug!("Minion {} detonated on {}", minion.id, target.short());
            apply_damage(state, target, amount, minion.owner);
            continue;
        }

        survivors.push(minion);
    }

    survivors.append(&mut state.minions);
    state.minions = survivors;
}
