//! # Arena Combat Server
//!
//! Authoritative real-time combat simulation for battle-arena sessions.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    ARENA COMBAT SERVER                      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/            - Simulation primitives                   │
//! │  ├── rng.rs       - Seeded Xorshift128+ PRNG                │
//! │  └── clock.rs     - Tick-driven simulated clock             │
//! │                                                             │
//! │  game/            - Arena simulation (single writer)        │
//! │  ├── state.rs     - Arena, player and entity state          │
//! │  ├── intent.rs    - Inbound player actions                  │
//! │  ├── tick.rs      - Fixed-rate step and tuning presets      │
//! │  ├── projectile.rs- Bullet flight and hit testing           │
//! │  ├── minion.rs    - Homing summons                          │
//! │  ├── ability.rs   - Cooldowns and timed buffs               │
//! │  ├── damage.rs    - Damage, death and respawn               │
//! │  ├── schedule.rs  - Wake-time ordered deferred work         │
//! │  ├── leaderboard.rs- Kill ranking                           │
//! │  ├── snapshot.rs  - Serializable arena views                │
//! │  └── events.rs    - Outbound notifications                  │
//! │                                                             │
//! │  network/         - Networking                              │
//! │  ├── server.rs    - WebSocket gateway                       │
//! │  ├── protocol.rs  - Message types                           │
//! │  └── session.rs   - Session actor and client registry       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Single Writer
//!
//! Each session owns one `ArenaState` inside one tokio task. Ticks and
//! client intents are taken from the same `select!` loop, so they never
//! interleave. Deferred work (respawns) sits in a wake-time queue that the
//! tick drains, and every timer reads the simulated clock, so a session
//! driven by the same seed and intents always produces the same outcome.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod network;

// Re-export commonly used types
pub use crate::core::rng::DeterministicRng;
pub use crate::core::clock::{Millis, SimClock};
pub use game::state::{ArenaState, PlayerState, PlayerId};
pub use game::tick::ArenaConfig;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Tick rate of fast-action sessions (Hz)
pub const FAST_ACTION_TICK_RATE: u32 = 60;

/// Tick rate of position-sync-only sessions (Hz)
pub const SYNC_ONLY_TICK_RATE: u32 = 10;
