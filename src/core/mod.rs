//! Core primitives.
//!
//! Seeded randomness and the tick-driven simulated clock. Nothing in here
//! touches the wall clock or the OS RNG.

pub mod clock;
pub mod rng;

pub use clock::{Millis, SimClock};
pub use rng::DeterministicRng;
