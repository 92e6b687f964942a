//! Host clock for desktop builds.

use std::time::{Instant, SystemTime, UNIX_EPOCH};

use crate::traits::Clock;

/// Monotonic time since construction plus the system wall clock.
#[derive(Debug, Clone, Copy)]
pub struct StdClock {
    start: Instant,
}

impl StdClock {
    /// Clock starting at zero now.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// The instant `now_ms() == 0` refers to.
    pub fn start_time(&self) -> Instant {
        self.start
    }
}

impl Default for StdClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for StdClock {
    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    fn unix_time_s(&self) -> Option<u64> {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .ok()
            .map(|d| d.as_secs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_near_zero_and_uses_wall_clock() {
        let clock = StdClock::new();
        assert!(clock.now_ms() < 1000);
        assert!(clock.log_timestamp_s() > 1_609_459_200);
    }
}
