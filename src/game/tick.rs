//! Authoritative Simulation Tick
//!
//! The fixed-rate step that advances everything time-dependent. Intents
//! are applied between ticks; the tick itself never waits on anything.

use std::time::Duration;

use crate::{FAST_ACTION_TICK_RATE, SYNC_ONLY_TICK_RATE};
use crate::core::clock::{Millis, SimClock};
use crate::game::ability::expire_buffs;
use crate::game::damage::fire_due;
use crate::game::events::GameEvent;
use crate::game::minion::advance_minions;
use crate::game::projectile::advance_projectiles;
use crate::game::snapshot::ArenaSnapshot;
use crate::game::state::ArenaState;

/// Result of a tick.
#[derive(Debug)]
pub struct TickResult {
    /// Events generated this tick
    pub events: Vec<GameEvent>,
    /// Arena view to broadcast
    pub snapshot: ArenaSnapshot,
}

/// Gameplay tuning for one session.
///
/// Speeds and lifetimes are per tick, so each preset scales them to its
/// rate to keep the same feel in world units per second.
#[derive(Clone, Debug, PartialEq)]
pub struct ArenaConfig {
    /// Ticks per second
    pub tick_rate: u32,
    /// Arena is the square [-half, half] on both axes
    pub arena_half_extent: f32,
    /// Player hit circle
    pub player_radius: f32,
    /// Bullet hit circle
    pub projectile_radius: f32,
    /// Bullet displacement per tick
    pub bullet_speed: f32,
    /// Base bullet damage
    pub projectile_damage: u32,
    /// Ticks a bullet lives
    pub projectile_lifetime_ticks: u32,
    /// Ticks a minion lives
    pub minion_lifetime_ticks: u32,
    /// Minion displacement per tick
    pub minion_step: f32,
    /// Distance under which a minion detonates
    pub minion_contact_radius: f32,
    /// Base minion explosion damage
    pub minion_damage: u32,
    /// Distance from the owner a minion appears at
    pub minion_spawn_offset: f32,
    /// Per-tick chance a minion notices an invisible player
    pub minion_notice_chance: f32,
    /// Delay between death and respawn
    pub respawn_delay_ms: Millis,
}

impl ArenaConfig {
    /// 60 Hz combat sessions.
    pub fn fast_action() -> Self {
        Self {
            tick_rate: FAST_ACTION_TICK_RATE,
            arena_half_extent: 50.0,
            player_radius: 1.0,
            projectile_radius: 0.3,
            bullet_speed: 0.4,          // 24 units/s
            projectile_damage: 10,
            projectile_lifetime_ticks: 120, // 2 seconds
            minion_lifetime_ticks: 600, // 10 seconds
            minion_step: 0.12,          // 7.2 units/s
            minion_contact_radius: 1.2,
            minion_damage: 30,
            minion_spawn_offset: 1.5,
            minion_notice_chance: 0.1,
            respawn_delay_ms: 5_000,
        }
    }

    /// 10 Hz sessions that mostly relay positions.
    pub fn sync_only() -> Self {
        Self {
            tick_rate: SYNC_ONLY_TICK_RATE,
            bullet_speed: 2.4,
            projectile_lifetime_ticks: 20,
            minion_lifetime_ticks: 100,
            minion_step: 0.72,
            ..Self::fast_action()
        }
    }

    /// Wall-clock time between ticks.
    pub fn interval(&self) -> Duration {
        SimClock::new(self.tick_rate).interval()
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self::fast_action()
    }
}

/// Run one simulation tick.
///
/// Order matters: projectiles and minions resolve before buffs expire, so
/// a buff active when the tick starts applies to all damage dealt in it.
pub fn tick(state: &mut ArenaState) -> TickResult {
    // 0. Advance simulated clock
    state.clock.advance();

    // 1. Fire due respawns
    fire_due(state);

    // 2. Move projectiles, resolve hits
    advance_projectiles(state);

    // 3. Steer minions, resolve detonations
    advance_minions(state);

    // 4. Expire buffs
    expire_buffs(state);

    #[cfg(feature = "debug-tracing")]
    tracing::trace!(
        tick = state.tick(),
        projectiles = state.projectiles.len(),
        minions = state.minions.len(),
        "tick complete"
    );

    TickResult {
        events: state.take_events(),
        snapshot: ArenaSnapshot::capture(state),
    }
}

/// Run `count` ticks back to back, collecting every event.
pub fn run_ticks(state: &mut ArenaState, count: u32) -> Vec<GameEvent> {
    let mut events = Vec::new();
    for _ in 0..count {
        events.extend(tick(state).events);
    }
    events
}
