//! Simulation clock and per-frame bookkeeping.
//!
//! One call to [`crate::engine::GameState::frame`] runs exactly one tick
//! unless the simulation is paused, in which case the clock does not move.

use crate::fixed::{Fixed64, Ticks};
use crate::transport::Activity;
use serde::{Deserialize, Serialize};
use std::time::Duration;

// ---------------------------------------------------------------------------
// Simulation state
// ---------------------------------------------------------------------------

/// Mutable clock tracked by the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimState {
    /// Ticks run so far. The first tick is tick 1.
    pub tick: Ticks,
    /// Frame time credited to ticks that actually ran.
    pub elapsed: Duration,
    pub paused: bool,
}

impl SimState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the clock by one tick of `dt`. Returns the new tick.
    pub(crate) fn advance(&mut self, dt: Duration) -> Ticks {
        self.tick += 1;
        self.elapsed += dt;
        self.tick
    }
}

// ---------------------------------------------------------------------------
// Frame report
// ---------------------------------------------------------------------------

/// Outcome of one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// The tick that ran, or `None` when paused.
    pub tick: Option<Ticks>,
    pub advanced: usize,
    pub blocked: usize,
    pub idle: usize,
}

impl FrameReport {
    pub(crate) fn ran(tick: Ticks) -> Self {
        Self {
            tick: Some(tick),
            ..Self::default()
        }
    }

    pub(crate) fn record(&mut self, activity: Activity) {
        match activity {
            Activity::Advanced => self.advanced += 1,
            Activity::Blocked => self.blocked += 1,
            Activity::Idle => self.idle += 1,
        }
    }

    /// Machines updated this frame.
    pub fn updated(&self) -> usize {
        self.advanced + self.blocked + self.idle
    }

    pub fn skipped(&self) -> bool {
        self.tick.is_none()
    }
}

// ---------------------------------------------------------------------------
// State hash
// ---------------------------------------------------------------------------

/// A simple deterministic hash of simulation state for determinism checks.
///
/// Uses FNV-1a (64-bit). Not cryptographic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateHash(pub u64);

impl StateHash {
    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;

    pub fn new() -> Self {
        Self(Self::FNV_OFFSET)
    }

    pub fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 ^= b as u64;
            self.0 = self.0.wrapping_mul(Self::FNV_PRIME);
        }
    }

    pub fn write_u64(&mut self, v: u64) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_u32(&mut self, v: u32) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_i32(&mut self, v: i32) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_fixed64(&mut self, v: Fixed64) {
        self.write(&v.to_bits().to_le_bytes());
    }

    pub fn finish(self) -> u64 {
        self.0
    }
}

impl Default for StateHash {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sim_state_starts_at_zero() {
        let state = SimState::new();
        assert_eq!(state.tick, 0);
        assert_eq!(state.elapsed, Duration::ZERO);
        assert!(!state.paused);
    }

    #[test]
    fn advance_counts_ticks_and_time() {
        let mut state = SimState::new();
        assert_eq!(state.advance(Duration::from_millis(10)), 1);
        assert_eq!(state.advance(Duration::from_millis(5)), 2);
        assert_eq!(state.elapsed, Duration::from_millis(15));
    }

    #[test]
    fn report_tallies_activity() {
        let mut report = FrameReport::ran(3);
        report.record(Activity::Advanced);
        report.record(Activity::Blocked);
        report.record(Activity::Idle);
        report.record(Activity::Advanced);
        assert_eq!(report.advanced, 2);
        assert_eq!(report.updated(), 4);
        assert!(!report.skipped());
        assert!(FrameReport::default().skipped());
    }

    #[test]
    fn state_hash_order_matters() {
        let mut h1 = StateHash::new();
        h1.write_u32(1);
        h1.write_u32(2);

        let mut h2 = StateHash::new();
        h2.write_u32(2);
        h2.write_u32(1);

        assert_ne!(h1.finish(), h2.finish());
    }

    #[test]
    fn state_hash_deterministic() {
        let mut h1 = StateHash::new();
        h1.write_fixed64(Fixed64::from_num(2.5));
        let mut h2 = StateHash::new();
        h2.write_fixed64(Fixed64::from_num(2.5));
        assert_eq!(h1.finish(), h2.finish());
    }
}
