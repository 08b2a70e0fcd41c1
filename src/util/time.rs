//! Time utilities for game simulation

use std::time::{Duration, Instant};

/// Tick rate configuration
pub const TICK_RATE_HZ: f64 = 60.0;

/// Pause between outer iterations of the tick loop
pub const BROADCAST_IDLE: Duration = Duration::from_millis(1);

/// Calculate delta time for a fixed tick at `tick_rate_hz` (in seconds)
pub fn tick_delta(tick_rate_hz: f64) -> f64 {
    1.0 / tick_rate_hz
}

/// Monotonic server clock, measured in seconds since the server started.
///
/// All simulation timestamps (shot cooldowns, respawn schedules) are
/// expressed on this clock.
#[derive(Debug, Clone)]
pub struct ServerClock {
    start: Instant,
}

impl ServerClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Seconds elapsed since the clock was created
    pub fn now_secs(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }

    pub fn uptime_secs(&self) -> u64 {
        self.start.elapsed().as_secs()
    }
}

impl Default for ServerClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixed-timestep accumulator.
///
/// Real elapsed time is fed in with [`FixedStep::advance`]; it reports how
/// many whole steps are due and keeps the remainder for the next call.
#[derive(Debug, Clone)]
pub struct FixedStep {
    step: f64,
    accumulator: f64,
}

impl FixedStep {
    pub fn new(step: f64) -> Self {
        Self {
            step,
            accumulator: 0.0,
        }
    }

    /// Add `elapsed` seconds and return the number of steps to run
    pub fn advance(&mut self, elapsed: f64) -> u32 {
        self.accumulator += elapsed;
        let mut steps = 0;
        while self.accumulator >= self.step {
            self.accumulator -= self.step;
            steps += 1;
        }
        steps
    }
}
