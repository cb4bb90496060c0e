//! Abilities & Buffs
//!
//! Each player picks one ability at join time. Using it is gated by a
//! cooldown timestamp; scaredy and saiyan also grant a timed buff that the
//! tick sweeps away once it expires.

use tracing::debug;

use crate::core::clock::Millis;
use crate::game::events::GameEvent;
use crate::game::minion::spawn_minion;
use crate::game::state::{AbilityKind, ArenaState, Buff, BuffKind, PlayerId, PlayerState};

/// Ability cooldowns by kind, in simulated milliseconds.
pub const ABILITY_COOLDOWNS_MS: [Millis; 3] = [
    15_000, // Arise: 15 seconds
    20_000, // Scaredy: 20 seconds
    40_000, // Saiyan: 40 seconds
];

/// Invisibility duration for scaredy.
pub const SCAREDY_DURATION_MS: Millis = 5_000;

/// Damage boost duration for saiyan.
pub const SAIYAN_DURATION_MS: Millis = 10_000;

/// Outgoing damage multiplier while saiyan is active.
pub const SAIYAN_MULTIPLIER: u32 = 2;

/// Cooldown for an ability kind.
#[inline]
pub fn cooldown_for(kind: AbilityKind) -> Millis {
    ABILITY_COOLDOWNS_MS[kind as usize]
}

/// Use a player's ability.
///
/// Returns `false` without changing anything if the player is missing,
/// dead, or still on cooldown.
pub fn use_ability(state: &mut ArenaState, player_id: PlayerId) -> bool {
    match activate_ability(state, player_id) {
        Some(event) => {
            state.push_event(event);
            true
        }
        None => false,
    }
}

/// Activate a player's ability.
/// Returns an event if the ability was successfully activated.
pub fn activate_ability(state: &mut ArenaState, player_id: PlayerId) -> Option<GameEvent> {
    let now = state.now_ms();

    let (kind, position) = {
        let player = state.players.get(&player_id)?;
        if !player.alive {
            return None;
        }
        if !player.ability_ready(now) {
            debug!(
                "{} ability on cooldown for {} ms",
                player_id.short(),
                player.cooldown_ready_at - now
            );
            return None;
        }
        (player.ability, player.position)
    };

    match kind {
        AbilityKind::Arise => {
            let lifetime = state.config.minion_lifetime_ticks;
            spawn_minion(state, player_id, position, lifetime);
        }
        AbilityKind::Scaredy => {
            let player = state.players.get_mut(&player_id)?;
            apply_buff(player, BuffKind::Scaredy, now + SCAREDY_DURATION_MS);
        }
        AbilityKind::Saiyan => {
            let player = state.players.get_mut(&player_id)?;
            apply_buff(player, BuffKind::Saiyan, now + SAIYAN_DURATION_MS);
        }
    }

    let player = state.players.get_mut(&player_id)?;
    player.cooldown_ready_at = now + cooldown_for(kind);

    Some(GameEvent::ability_used(state.tick(), player_id, kind))
}

/// Put a buff on a player, replacing whatever was active.
///
/// The old effect is reverted first, so a replaced buff never leaves its
/// flag or multiplier behind.
pub fn apply_buff(player: &mut PlayerState, kind: BuffKind, expires_at: Millis) {
    if player.buff.is_some() {
        player.reset_effects();
    }

    match kind {
        BuffKind::Scaredy => player.invisible = true,
        BuffKind::Saiyan => player.damage_multiplier = SAIYAN_MULTIPLIER,
    }
    player.buff = Some(Buff { kind, expires_at });
}

/// Clear every buff whose expiry has passed and revert to baseline.
pub fn expire_buffs(state: &mut ArenaState) {
    let now = state.now_ms();

    for player in state.players.values_mut() {
        let expired = player.buff.is_some_and(|b| now >= b.expires_at);
        if expired {
            debug!("{} buff expired", player.id.short());
            player.reset_effects();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use crate::game::events::GameEventData;
    use crate::game::state::{Cosmetic, JoinRequest};
    use crate::game::tick::ArenaConfig;

    fn arena_with(kind: AbilityKind) -> (ArenaState, PlayerId) {
        let mut state = ArenaState::new(ArenaConfig::default(), 3);
        let id = PlayerId::new([1; 16]);
        state.join(id, JoinRequest {
            name: "P1".to_string(),
            cosmetic: Cosmetic::default(),
            ability: kind,
        });
        state.take_events();
        (state, id)
    }

    fn advance_ms(state: &mut ArenaState, ms: Millis) {
        let target = state.now_ms() + ms;
        while state.now_ms() < target {
            state.clock.advance();
            expire_buffs(state);
        }
    }

    #[test]
    fn test_cooldown_table() {
        assert_eq!(cooldown_for(AbilityKind::Arise), 15_000);
        assert_eq!(cooldown_for(AbilityKind::Scaredy), 20_000);
        assert_eq!(cooldown_for(AbilityKind::Saiyan), 40_000);
    }

    #[test]
    fn test_arise_spawns_minion() {
        let (mut state, id) = arena_with(AbilityKind::Arise);

        assert!(use_ability(&mut state, id));
        assert_eq!(state.minions.len(), 1);
        assert_eq!(state.minions[0].owner, id);
        assert_eq!(state.minions[0].lifetime_ticks, state.config.minion_lifetime_ticks);
        assert_eq!(state.get_player(&id).unwrap().cooldown_ready_at, 15_000);

        let events = state.take_events();
        assert!(matches!(
            events[0].data,
            GameEventData::AbilityUsed { player_id, kind: AbilityKind::Arise } if player_id == id
        ));
    }

    #[test]
    fn test_scaredy_grants_invisibility() {
        let (mut state, id) = arena_with(AbilityKind::Scaredy);

        assert!(use_ability(&mut state, id));
        let player = state.get_player(&id).unwrap();
        assert!(player.invisible);
        assert_eq!(player.buff, Some(Buff { kind: BuffKind::Scaredy, expires_at: 5_000 }));

        advance_ms(&mut state, 4_000);
        assert!(state.get_player(&id).unwrap().invisible);
        advance_ms(&mut state, 1_000);
        assert!(!state.get_player(&id).unwrap().invisible);
        assert!(state.get_player(&id).unwrap().buff.is_none());
    }

    #[test]
    fn test_saiyan_cooldown_gate() {
        let (mut state, id) = arena_with(AbilityKind::Saiyan);

        assert!(use_ability(&mut state, id));
        assert_eq!(state.get_player(&id).unwrap().damage_multiplier, 2);

        advance_ms(&mut state, 20_000);
        let before = state.get_player(&id).unwrap().clone();
        assert!(!use_ability(&mut state, id));
        let after = state.get_player(&id).unwrap();
        assert_eq!(after.cooldown_ready_at, before.cooldown_ready_at);
        assert_eq!(after.buff, before.buff);
        assert_eq!(after.damage_multiplier, 1);

        advance_ms(&mut state, 20_000);
        assert_eq!(state.now_ms(), 40_000);
        assert!(use_ability(&mut state, id));
        assert_eq!(state.get_player(&id).unwrap().damage_multiplier, 2);
        assert_eq!(state.get_player(&id).unwrap().cooldown_ready_at, 80_000);
    }

    #[test]
    fn test_dead_or_missing_player_cannot_use() {
        let (mut state, id) = arena_with(AbilityKind::Saiyan);
        assert!(!use_ability(&mut state, PlayerId::new([5; 16])));

        state.get_player_mut(&id).unwrap().alive = false;
        assert!(!use_ability(&mut state, id));
        assert_eq!(state.get_player(&id).unwrap().damage_multiplier, 1);
        assert!(state.take_events().is_empty());
    }

    #[test]
    fn test_replacing_buff_reverts_previous_effect() {
        let mut player = PlayerState::new(
            PlayerId::new([1; 16]),
            "P1".to_string(),
            Cosmetic::default(),
            AbilityKind::Saiyan,
            Vec2::ZERO,
        );

        apply_buff(&mut player, BuffKind::Scaredy, 5_000);
        apply_buff(&mut player, BuffKind::Saiyan, 10_000);

        assert!(!player.invisible);
        assert_eq!(player.damage_multiplier, 2);
        assert_eq!(player.buff, Some(Buff { kind: BuffKind::Saiyan, expires_at: 10_000 }));
    }

    #[test]
    fn test_expire_is_inclusive() {
        let (mut state, id) = arena_with(AbilityKind::Saiyan);
        state.get_player_mut(&id).unwrap().buff = Some(Buff { kind: BuffKind::Saiyan, expires_at: 0 });
        state.get_player_mut(&id).unwrap().damage_multiplier = 2;

        expire_buffs(&mut state);
        assert_eq!(state.get_player(&id).unwrap().damage_multiplier, 1);
    }
}
