//! ESP32 clock implementation using the ESP-IDF timer.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::traits::{Clock, MIN_VALID_UNIX_TIME_S};

/// ESP32 clock using the hardware timer.
///
/// `now_ms` is `esp_timer_get_time()` (microseconds since boot) in
/// milliseconds. The wall clock comes from the system time, which only
/// becomes meaningful once SNTP has synced; before that
/// [`unix_time_s`](Clock::unix_time_s) returns `None` and history
/// timestamps fall back to uptime seconds.
///
/// # Example
///
/// ```ignore
/// use rs_fridge::hal::esp32::Esp32Clock;
/// use rs_fridge::traits::Clock;
///
/// let clock = Esp32Clock::new();
/// let start = clock.now_ms();
/// // ... do work ...
/// let elapsed = clock.now_ms() - start;
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct Esp32Clock;

impl Esp32Clock {
    /// Creates a new ESP32 clock instance.
    #[inline]
    pub fn new() -> Self {
        Self
    }
}

impl Clock for Esp32Clock {
    #[inline]
    fn now_ms(&self) -> u64 {
        // Safe: plain read of the hardware timer, no side effects
        let micros = unsafe { esp_idf_hal::sys::esp_timer_get_time() };
        (micros / 1000) as u64
    }

    fn unix_time_s(&self) -> Option<u64> {
        let secs = SystemTime::now().duration_since(UNIX_EPOCH).ok()?.as_secs();
        (secs >= MIN_VALID_UNIX_TIME_S).then_some(secs)
    }
}
