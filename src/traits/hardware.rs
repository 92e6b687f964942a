//! Hardware abstraction traits for the compressor relay, zone valve, and thermistors.
//!
//! This module defines the hardware interfaces that allow rs-fridge to
//! work across different platforms (ESP32, desktop mocks, the cabinet simulator).
//!
//! # Key Traits
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`CompressorRelay`] | Binary compressor on/off output |
//! | [`ZoneValve`] | Solenoid valve routing refrigerant to one zone |
//! | [`ThermistorAdc`] | Raw ADC samples from the two NTC thermistors |
//! | [`StatusIndicator`] | Front-panel LED mirroring the compressor |
//! | [`Clock`] | Monotonic time source for `no_std` environments |
//!
//! # Implementation
//!
//! For testing and desktop development, use the mock implementations
//! from [`crate::hal::mock`]. For ESP32 hardware, use the
//! implementations from `hal::esp32` (requires `esp32` feature).
//!
//! # Example
//!
//! ```rust
//! use rs_fridge::traits::{CompressorRelay, ZoneValve, Zone};
//! use rs_fridge::hal::{MockRelay, MockValve};
//!
//! let mut relay = MockRelay::new();
//! let mut valve = MockValve::new();
//! valve.select(Zone::Right).unwrap();
//! relay.set_running(true).unwrap();
//!
//! assert!(relay.running);
//! assert_eq!(valve.zone, Zone::Right);
//! ```

/// One of the two compartments sharing the compressor.
///
/// Zones are identified by index (`0` = left, `1` = right) in persisted data
/// and in the web API.
///
/// # Default
///
/// Defaults to [`Left`](Self::Left), the valve's de-energised position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Zone {
    /// Left compartment (valve de-energised).
    #[default]
    Left,
    /// Right compartment (valve energised).
    Right,
}

impl Zone {
    /// Both zones in index order.
    pub const ALL: [Zone; 2] = [Zone::Left, Zone::Right];

    /// Returns the zone index (`0` = left, `1` = right).
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Zone::Left => 0,
            Zone::Right => 1,
        }
    }

    /// Returns the zone for an index, if valid.
    ///
    /// ```
    /// use rs_fridge::Zone;
    ///
    /// assert_eq!(Zone::from_index(0), Some(Zone::Left));
    /// assert_eq!(Zone::from_index(1), Some(Zone::Right));
    /// assert_eq!(Zone::from_index(2), None);
    /// ```
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Zone::Left),
            1 => Some(Zone::Right),
            _ => None,
        }
    }

    /// The other zone.
    #[inline]
    pub const fn other(self) -> Self {
        match self {
            Zone::Left => Zone::Right,
            Zone::Right => Zone::Left,
        }
    }

    /// Returns the zone as a lowercase string.
    ///
    /// ```
    /// use rs_fridge::Zone;
    ///
    /// assert_eq!(Zone::Left.as_str(), "left");
    /// assert_eq!(Zone::Right.as_str(), "right");
    /// ```
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Zone::Left => "left",
            Zone::Right => "right",
        }
    }

    /// Returns the capitalised zone name used in status text.
    #[inline]
    pub const fn label(&self) -> &'static str {
        match self {
            Zone::Left => "Left",
            Zone::Right => "Right",
        }
    }

    /// Parse a zone from text input.
    ///
    /// Accepts `"left"`/`"l"`/`"0"` and `"right"`/`"r"`/`"1"`,
    /// trimmed and case-insensitive.
    ///
    /// ```
    /// use rs_fridge::Zone;
    ///
    /// assert_eq!(Zone::from_text("left"), Some(Zone::Left));
    /// assert_eq!(Zone::from_text(" R "), Some(Zone::Right));
    /// assert_eq!(Zone::from_text("1"), Some(Zone::Right));
    /// assert_eq!(Zone::from_text("middle"), None);
    /// ```
    pub fn from_text(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("left") || s.eq_ignore_ascii_case("l") || s == "0" {
            Some(Zone::Left)
        } else if s.eq_ignore_ascii_case("right") || s.eq_ignore_ascii_case("r") || s == "1" {
            Some(Zone::Right)
        } else {
            None
        }
    }
}

/// Compressor relay output.
///
/// Implement this trait for the relay (or contactor) that powers the
/// compressor. The control engine never calls this directly; the
/// [`FridgeController`](crate::FridgeController) forwards engine decisions.
///
/// # Implementation Notes
///
/// - Constructors should leave the relay de-energised
/// - `set_running` must be idempotent
pub trait CompressorRelay {
    /// Error type for relay operations.
    type Error: core::fmt::Debug;

    /// Energise (`true`) or release (`false`) the compressor relay.
    fn set_running(&mut self, on: bool) -> Result<(), Self::Error>;

    /// Convenience method to release the relay.
    fn stop(&mut self) -> Result<(), Self::Error> {
        self.set_running(false)
    }
}

/// Zone selector solenoid valve.
///
/// Routes refrigerant to exactly one zone. The valve keeps its last
/// position when the compressor stops.
pub trait ZoneValve {
    /// Error type for valve operations.
    type Error: core::fmt::Debug;

    /// Route refrigerant to `zone`.
    fn select(&mut self, zone: Zone) -> Result<(), Self::Error>;
}

/// Raw ADC access to the two thermistor dividers.
///
/// Returns the unconverted 12-bit reading; conversion to °C is done by
/// [`crate::sensor`] so calibration stays platform independent.
pub trait ThermistorAdc {
    /// Error type for ADC reads.
    type Error: core::fmt::Debug;

    /// Read the raw ADC value for one zone's thermistor.
    fn read_raw(&mut self, zone: Zone) -> Result<u16, Self::Error>;

    /// Read both zones, left first.
    fn read_pair(&mut self) -> Result<RawReadings, Self::Error> {
        Ok(RawReadings {
            left: self.read_raw(Zone::Left)?,
            right: self.read_raw(Zone::Right)?,
        })
    }
}

/// One raw ADC sample per zone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RawReadings {
    /// Left thermistor ADC value.
    pub left: u16,
    /// Right thermistor ADC value.
    pub right: u16,
}

impl RawReadings {
    /// Raw value for a zone.
    #[inline]
    pub fn get(&self, zone: Zone) -> u16 {
        match zone {
            Zone::Left => self.left,
            Zone::Right => self.right,
        }
    }
}

/// Front-panel status LED.
pub trait StatusIndicator {
    /// Error type for LED writes.
    type Error: core::fmt::Debug;

    /// Turn the indicator on or off.
    fn set_lit(&mut self, lit: bool) -> Result<(), Self::Error>;
}

/// Time source trait for `no_std` compatibility.
///
/// Provides monotonic time in milliseconds for compressor protection
/// timing. All control decisions use [`now_ms`](Self::now_ms); wall-clock
/// time is only used to stamp history entries.
///
/// # Example
///
/// ```rust
/// use rs_fridge::traits::Clock;
/// use rs_fridge::hal::MockClock;
///
/// let mut clock = MockClock::new();
/// assert_eq!(clock.now_ms(), 0);
///
/// clock.advance(100);
/// assert_eq!(clock.now_ms(), 100);
/// ```
pub trait Clock {
    /// Returns current time in milliseconds since an arbitrary epoch.
    ///
    /// Must be monotonically increasing.
    fn now_ms(&self) -> u64;

    /// Returns Unix time in seconds if a synchronised wall clock is available.
    ///
    /// Defaults to `None` (no wall clock).
    fn unix_time_s(&self) -> Option<u64> {
        None
    }

    /// Timestamp for history entries: Unix seconds when the wall clock is
    /// valid, otherwise seconds since boot.
    fn log_timestamp_s(&self) -> u64 {
        match self.unix_time_s() {
            Some(t) if t >= MIN_VALID_UNIX_TIME_S => t,
            _ => self.now_ms() / 1000,
        }
    }
}

/// 2021-01-01T00:00:00Z. Earlier wall-clock readings mean NTP has not synced.
pub const MIN_VALID_UNIX_TIME_S: u64 = 1_609_459_200;

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Zone Tests
    // =========================================================================

    #[test]
    fn zone_default_is_left() {
        assert_eq!(Zone::default(), Zone::Left);
    }

    #[test]
    fn zone_index_round_trip() {
        for zone in Zone::ALL {
            assert_eq!(Zone::from_index(zone.index()), Some(zone));
        }
    }

    #[test]
    fn zone_other() {
        assert_eq!(Zone::Left.other(), Zone::Right);
        assert_eq!(Zone::Right.other(), Zone::Left);
    }

    #[test]
    fn zone_from_text_variants() {
        assert_eq!(Zone::from_text("LEFT"), Some(Zone::Left));
        assert_eq!(Zone::from_text("l"), Some(Zone::Left));
        assert_eq!(Zone::from_text("0"), Some(Zone::Left));
        assert_eq!(Zone::from_text("Right"), Some(Zone::Right));
        assert_eq!(Zone::from_text("\tr\n"), Some(Zone::Right));
        assert_eq!(Zone::from_text(""), None);
        assert_eq!(Zone::from_text("2"), None);
    }

    #[test]
    fn zone_labels() {
        assert_eq!(Zone::Left.label(), "Left");
        assert_eq!(Zone::Right.label(), "Right");
    }

    // =========================================================================
    // Default Method Tests
    // =========================================================================

    struct FixedAdc {
        left: u16,
        right: u16,
    }

    impl ThermistorAdc for FixedAdc {
        type Error = ();

        fn read_raw(&mut self, zone: Zone) -> Result<u16, ()> {
            Ok(match zone {
                Zone::Left => self.left,
                Zone::Right => self.right,
            })
        }
    }

    #[test]
    fn adc_read_pair_default_impl() {
        let mut adc = FixedAdc {
            left: 1000,
            right: 3000,
        };
        let raw = adc.read_pair().unwrap();
        assert_eq!(raw.left, 1000);
        assert_eq!(raw.right, 3000);
        assert_eq!(raw.get(Zone::Right), 3000);
    }

    struct TestRelay {
        on: bool,
    }

    impl CompressorRelay for TestRelay {
        type Error = ();

        fn set_running(&mut self, on: bool) -> Result<(), ()> {
            self.on = on;
            Ok(())
        }
    }

    #[test]
    fn relay_stop_default_impl() {
        let mut relay = TestRelay { on: true };
        relay.stop().unwrap();
        assert!(!relay.on);
    }

    struct WallClock {
        ms: u64,
        unix: Option<u64>,
    }

    impl Clock for WallClock {
        fn now_ms(&self) -> u64 {
            self.ms
        }

        fn unix_time_s(&self) -> Option<u64> {
            self.unix
        }
    }

    #[test]
    fn log_timestamp_prefers_synced_wall_clock() {
        let clock = WallClock {
            ms: 42_000,
            unix: Some(1_700_000_000),
        };
        assert_eq!(clock.log_timestamp_s(), 1_700_000_000);
    }

    #[test]
    fn log_timestamp_falls_back_to_uptime() {
        let unsynced = WallClock {
            ms: 42_000,
            unix: Some(3600),
        };
        assert_eq!(unsynced.log_timestamp_s(), 42);

        let none = WallClock {
            ms: 7_999,
            unix: None,
        };
        assert_eq!(none.log_timestamp_s(), 7);
    }
}
