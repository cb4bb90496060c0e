//! Simulated Clock
//!
//! Simulation time is derived from the tick counter, never read from the
//! wall clock. Tests advance time by stepping ticks instead of sleeping.

use std::time::Duration;
use serde::{Serialize, Deserialize};

/// Simulated time in milliseconds since the session started.
pub type Millis = u64;

/// Tick-driven clock.
///
/// `now_ms` is computed as `tick * 1000 / tick_rate`, so at 60 Hz tick 120
/// is exactly 2000 ms and tick 300 exactly 5000 ms.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimClock {
    tick: u64,
    tick_rate: u32,
}

impl SimClock {
    /// Create a clock at tick 0. A zero rate is treated as 1 Hz.
    pub fn new(tick_rate: u32) -> Self {
        Self {
            tick: 0,
            tick_rate: tick_rate.max(1),
        }
    }

    /// Advance by one tick.
    #[inline]
    pub fn advance(&mut self) {
        self.tick += 1;
    }

    /// Ticks elapsed since start.
    #[inline]
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Steps per second.
    #[inline]
    pub fn tick_rate(&self) -> u32 {
        self.tick_rate
    }

    /// Current simulated time.
    #[inline]
    pub fn now_ms(&self) -> Millis {
        self.tick * 1000 / self.tick_rate as u64
    }

    /// Real-time interval between two steps.
    pub fn interval(&self) -> Duration {
        Duration::from_micros(1_000_000 / self.tick_rate as u64)
    }
}
