//! Time management utilities
//!
//! Frame timing for the application loop. Resource caches take explicit
//! `Instant`s instead so eviction stays deterministic under test.

use std::time::{Duration, Instant};

/// Frame clock: step length, run length and frame count
#[derive(Debug, Clone, Copy)]
pub struct Timer {
    started: Instant,
    last_tick: Instant,
    delta: Duration,
    frame_count: u64,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    /// Start the clock now
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            started: now,
            last_tick: now,
            delta: Duration::ZERO,
            frame_count: 0,
        }
    }

    /// Advance by one frame
    pub fn update(&mut self) {
        let now = Instant::now();
        self.delta = now.saturating_duration_since(self.last_tick);
        self.last_tick = now;
        self.frame_count += 1;
    }

    /// Seconds between the last two updates
    pub fn delta_time(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    /// Seconds from creation to the last update
    pub fn total_time(&self) -> f32 {
        self.last_tick.saturating_duration_since(self.started).as_secs_f32()
    }

    /// Updates so far
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Mean frame rate over the whole run; 0 before any time has passed
    pub fn average_fps(&self) -> f32 {
        let total = self.total_time();
        if total > 0.0 {
            self.frame_count as f32 / total
        } else {
            0.0
        }
    }
}
