//! Damage & Respawn
//!
//! Every health change in the arena goes through [`apply_damage`]. Deaths
//! award the kill, notify everyone and queue a respawn in the schedule.

use tracing::{debug, info};

use crate::game::events::{GameEvent, GameEventData};
use crate::game::leaderboard;
use crate::game::schedule::ScheduledAction;
use crate::game::snapshot::PlayerSnapshot;
use crate::game::state::{ArenaState, PlayerId, MAX_HEALTH};

/// Apply `amount` damage from `attacker_id` to `target_id`.
///
/// Missing or already-dead targets are ignored, so a death is handled at
/// most once no matter how many hits land on the corpse.
pub fn apply_damage(state: &mut ArenaState, target_id: PlayerId, amount: u32, attacker_id: PlayerId) {
    let tick = state.tick();

    let (health, died, victim_name) = {
        let Some(target) = state.players.get_mut(&target_id) else {
            return;
        };
        if !target.alive {
            return;
        }

        target.health = target.health.saturating_sub(amount);
        let died = target.health == 0;
        if died {
            target.alive = false;
        }
        (target.health, died, target.name.clone())
    };

    state.push_event(GameEvent::player_hit(tick, target_id, health, amount));

    if died {
        handle_death(state, target_id, victim_name, attacker_id);
    }
}

/// Award the kill, notify, and schedule the respawn.
fn handle_death(state: &mut ArenaState, victim_id: PlayerId, victim_name: String, attacker_id: PlayerId) {
    let tick = state.tick();

    // Self-inflicted or disconnected attackers get no credit
    let killer = if attacker_id == victim_id {
        None
    } else {
        state.players.get_mut(&attacker_id).map(|killer| {
            killer.kills += 1;
            (killer.id, killer.name.clone())
        })
    };

    match &killer {
        Some((_, killer_name)) => info!("{} killed {}", killer_name, victim_name),
        None => info!("{} died", victim_name),
    }

    let killer_name = killer.as_ref().map(|(_, name)| name.clone());
    state.push_event(GameEvent::kill_feed(tick, killer, victim_id, victim_name));
    leaderboard::publish(state);

    let delay = state.config.respawn_delay_ms;
    let respawn_seconds = delay.div_ceil(1000) as u32;
    state.push_event(GameEvent::you_died(tick, victim_id, killer_name, respawn_seconds));

    let due_at = state.now_ms() + delay;
    state.schedule.push(due_at, ScheduledAction::Respawn(victim_id));
}

/// Bring a dead player back at a random point with full health.
///
/// Does nothing if the player left or is somehow alive already.
pub fn respawn_player(state: &mut ArenaState, id: PlayerId) {
    let dead = state.players.get(&id).is_some_and(|p| !p.alive);
    if !dead {
        debug!("Respawn for {} skipped", id.short());
        return;
    }

    let position = state.rng.random_position(state.config.arena_half_extent);
    let Some(player) = state.players.get_mut(&id) else {
        return;
    };

    player.health = MAX_HEALTH;
    player.alive = true;
    player.position = position;
    player.reset_effects();

    let snapshot = PlayerSnapshot::from(&*player);
    let tick = state.tick();
    state.push_event(GameEvent::broadcast(tick, GameEventData::PlayerRespawn { player: snapshot }));
}

/// Fire every scheduled action whose wake time has passed.
pub fn fire_due(state: &mut ArenaState) {
    let now = state.now_ms();
    for action in state.schedule.drain_due(now) {
        match action {
            ScheduledAction::Respawn(id) => respawn_player(state, id),
        }
    }
}
