//! Tick benchmarks for the arena simulation.
//!
//! Run with: `cargo bench --bench tick`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use glam::Vec2;

use arena_combat::game::intent::{apply_intent, Intent};
use arena_combat::game::state::{AbilityKind, ArenaState, Cosmetic, JoinRequest, PlayerId};
use arena_combat::game::tick::{tick, ArenaConfig};

/// A full arena: 32 players on a ring, each with a bullet in flight and
/// every arise player's minion out.
fn crowded_arena() -> ArenaState {
    let mut state = ArenaState::new(ArenaConfig::fast_action(), 0xBEEF);
    let abilities = [AbilityKind::Arise, AbilityKind::Scaredy, AbilityKind::Saiyan];

    for i in 0..32u8 {
        let id = PlayerId::new([i + 1; 16]);
        let angle = f32::from(i) / 32.0 * std::f32::consts::TAU;
        let pos = Vec2::from_angle(angle) * 30.0;

        apply_intent(&mut state, id, Intent::Join(JoinRequest {
            name: format!("bot{}", i),
            cosmetic: Cosmetic::default(),
            ability: abilities[usize::from(i) % abilities.len()],
        }));
        apply_intent(&mut state, id, Intent::Move { x: pos.x, z: pos.y });
        apply_intent(&mut state, id, Intent::UseAbility);
        apply_intent(&mut state, id, Intent::Shoot { angle: angle + std::f32::consts::PI });
    }

    state.take_events();
    state
}

/// Runs tick benchmarks.
pub fn tick_benchmark(c: &mut Criterion) {
    c.bench_function("crowded_tick", |b| {
        b.iter_batched(
            crowded_arena,
            |mut state| black_box(tick(&mut state)),
            BatchSize::SmallInput,
        )
    });

    c.bench_function("crowded_second", |b| {
        b.iter_batched(
            crowded_arena,
            |mut state| {
                for _ in 0..60 {
                    black_box(tick(&mut state));
                }
                state
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, tick_benchmark);
criterion_main!(benches);
