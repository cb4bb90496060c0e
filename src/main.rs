//! Arena Combat Server
//!
//! Authoritative combat server for battle-arena sessions.
//! `--demo` runs a headless scripted skirmish instead of serving clients.

use anyhow::Context;
use glam::Vec2;
use sha2::{Digest, Sha256};
use tracing::info;
use tracing_subscriber::EnvFilter;

use arena_combat::{
    VERSION,
    core::rng::derive_session_seed,
    game::{
        events::{GameEvent, GameEventData},
        intent::{apply_intent, Intent},
        leaderboard,
        snapshot::ArenaSnapshot,
        state::{AbilityKind, ArenaState, Cosmetic, JoinRequest, PlayerId},
        tick::{tick, ArenaConfig},
    },
    network::{GameServer, ServerConfig},
};

/// Demo length: one minute at 60 Hz.
const DEMO_TICKS: u32 = 3600;

/// Demo fighters stop closing in at this distance.
const DEMO_STANDOFF: f32 = 6.0;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging (RUST_LOG overrides)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Arena Combat Server v{}", VERSION);

    if std::env::args().any(|arg| arg == "--demo") {
        return demo_skirmish();
    }

    let config = ServerConfig::from_env().context("reading server configuration")?;
    let server = GameServer::new(config);

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, shutting down");
            server.shutdown();
            let _ = server.session().shutdown().await;
        }
    }

    Ok(())
}

/// Run the scripted skirmish twice and check both runs agree.
fn demo_skirmish() -> anyhow::Result<()> {
    info!("=== Starting Demo Skirmish ===");

    let session_id = [1u8; 16];
    let seed = derive_session_seed(&session_id);
    info!("Session ID: {}", hex::encode(session_id));
    info!("RNG Seed: {}", seed);

    let (state, events) = run_skirmish(seed);

    for event in &events {
        if let GameEventData::KillFeed { killer, victim, .. } = &event.data {
            let killer = killer.as_deref().unwrap_or("nobody");
            info!("Tick {}: {} killed {}", event.tick, killer, victim);
        }
    }

    info!("=== Leaderboard ===");
    for (place, entry) in leaderboard::rank(state.players.values()).iter().enumerate() {
        info!("#{}: {} - {} kills", place + 1, entry.name, entry.kills);
    }
    info!("Total events: {}", events.len());

    let hash = snapshot_hash(&state)?;
    info!("Final Snapshot Hash: {}", hash);

    // Same seed, same script: must land on the same snapshot
    info!("=== Verifying Determinism ===");
    let (replay, _) = run_skirmish(seed);
    let replay_hash = snapshot_hash(&replay)?;
    info!("Replay Snapshot Hash: {}", replay_hash);

    if hash == replay_hash {
        info!("DETERMINISM VERIFIED: Hashes match!");
        Ok(())
    } else {
        anyhow::bail!("determinism failure: {} != {}", hash, replay_hash)
    }
}

/// Four fighters close in on each other, shooting and using abilities.
fn run_skirmish(seed: u64) -> (ArenaState, Vec<GameEvent>) {
    let mut state = ArenaState::new(ArenaConfig::fast_action(), seed);
    let roster = [
        ("Fox", AbilityKind::Arise, Vec2::new(-12.0, -12.0)),
        ("Raccoon", AbilityKind::Scaredy, Vec2::new(12.0, -12.0)),
        ("Bunny", AbilityKind::Saiyan, Vec2::new(12.0, 12.0)),
        ("Otter", AbilityKind::Arise, Vec2::new(-12.0, 12.0)),
    ];

    let mut ids = Vec::new();
    for (i, (name, ability, start)) in roster.into_iter().enumerate() {
        let id = PlayerId::new([i as u8 + 1; 16]);
        apply_intent(&mut state, id, Intent::Join(JoinRequest {
            name: name.to_string(),
            cosmetic: Cosmetic::default(),
            ability,
        }));
        apply_intent(&mut state, id, Intent::Move { x: start.x, z: start.y });
        ids.push(id);
    }
    state.take_events();

    let mut events = Vec::new();
    for t in 0..DEMO_TICKS {
        for (i, id) in ids.iter().enumerate() {
            let Some(me) = state.get_player(id).filter(|p| p.alive) else {
                continue;
            };
            let my_pos = me.position;

            let nearest = state
                .players
                .values()
                .filter(|p| p.alive && p.id != *id)
                .min_by(|a, b| {
                    a.position
                        .distance_squared(my_pos)
                        .total_cmp(&b.position.distance_squared(my_pos))
                })
                .map(|p| p.position);
            let Some(target) = nearest else {
                continue;
            };

            let to_target = target - my_pos;
            if to_target.length() > DEMO_STANDOFF {
                let next = my_pos + to_target.normalize_or_zero() * 0.1;
                apply_intent(&mut state, *id, Intent::Move { x: next.x, z: next.y });
            }
            if (t as usize + i * 5) % 15 == 0 {
                apply_intent(&mut state, *id, Intent::Shoot { angle: to_target.y.atan2(to_target.x) });
            }
            // Rejected while on cooldown
            apply_intent(&mut state, *id, Intent::UseAbility);
        }

        events.extend(state.take_events());
        events.extend(tick(&mut state).events);
    }

    (state, events)
}

/// SHA-256 of the JSON snapshot, hex encoded.
fn snapshot_hash(state: &ArenaState) -> anyhow::Result<String> {
    let json = serde_json::to_vec(&ArenaSnapshot::capture(state))?;
    Ok(hex::encode(Sha256::digest(&json)))
}
