//! Tick boundaries at fixed world-time granularity

use serde::{Deserialize, Serialize};

use crate::core::types::Time;

/// Counts fired tick boundaries
///
/// Boundary `n` (1-based) sits at `n * tick_interval`. The clock only ever
/// moves forward, so each boundary fires exactly once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldClock {
    tick_interval: Time,
    ticks: u64,
}

impl WorldClock {
    pub fn new(tick_interval: Time) -> Self {
        Self {
            tick_interval,
            ticks: 0,
        }
    }

    pub fn tick_interval(&self) -> Time {
        self.tick_interval
    }

    /// Boundaries fired so far
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Time of the next boundary to fire
    pub fn next_boundary(&self) -> Time {
        (self.ticks + 1) as f64 * self.tick_interval
    }

    /// Whether the next boundary lies strictly before `time`
    pub fn due_before(&self, time: Time) -> bool {
        self.next_boundary() < time
    }

    /// Whether the next boundary lies at or before `time`
    pub fn due_by(&self, time: Time) -> bool {
        self.next_boundary() <= time
    }

    /// Mark the next boundary fired, returning its time
    pub fn fire(&mut self) -> Time {
        let at = self.next_boundary();
        self.ticks += 1;
        at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundaries_are_whole_multiples() {
        let mut clock = WorldClock::new(2.5);
        assert_eq!(clock.next_boundary(), 2.5);
        assert_eq!(clock.fire(), 2.5);
        assert_eq!(clock.fire(), 5.0);
        assert_eq!(clock.ticks(), 2);
    }

    #[test]
    fn test_strict_and_inclusive_checks() {
        let clock = WorldClock::new(1.0);
        assert!(!clock.due_before(1.0));
        assert!(clock.due_by(1.0));
        assert!(clock.due_before(1.01));
        assert!(!clock.due_by(0.99));
    }
}
