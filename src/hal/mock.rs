//! Mock implementations for testing without hardware.
//!
//! This module provides test doubles for all hardware, storage and update
//! traits, enabling development and testing on desktop without a fridge.
//!
//! # Available Mocks
//!
//! | Mock | Trait | Purpose |
//! |------|-------|---------|
//! | [`MockRelay`] | [`CompressorRelay`] | Tracks relay writes, can fail on demand |
//! | [`MockValve`] | [`ZoneValve`] | Tracks valve position |
//! | [`MockAdc`] | [`ThermistorAdc`] | Settable raw readings |
//! | [`MockLed`] | [`StatusIndicator`] | Tracks LED state |
//! | [`MockClock`] | [`Clock`] | Controllable time source |
//! | [`MemoryStorage`] | [`ConfigStorage`] | In-memory config record |
//! | [`MockUpdater`] | [`FirmwareUpdater`] | Canned release, records installs |
//!
//! # Example
//!
//! ```rust
//! use rs_fridge::FridgeController;
//! use rs_fridge::hal::{MemoryStorage, MockRelay, MockValve};
//!
//! let mut controller =
//!     FridgeController::new(MockRelay::new(), MockValve::new(), MemoryStorage::new());
//!
//! // No readings yet: the engine is not run and nothing is switched.
//! controller.tick(0).unwrap();
//! assert!(!controller.relay().running);
//! ```
//!
//! [`CompressorRelay`]: crate::traits::CompressorRelay
//! [`ZoneValve`]: crate::traits::ZoneValve
//! [`ThermistorAdc`]: crate::traits::ThermistorAdc
//! [`StatusIndicator`]: crate::traits::StatusIndicator
//! [`Clock`]: crate::traits::Clock
//! [`ConfigStorage`]: crate::traits::ConfigStorage
//! [`FirmwareUpdater`]: crate::traits::FirmwareUpdater

use alloc::string::String;
use alloc::vec::Vec;

use crate::store::ConfigRecord;
use crate::traits::{
    Clock, CompressorRelay, ConfigStorage, FirmwareUpdater, StatusIndicator, ThermistorAdc, Zone,
    ZoneValve,
};
use crate::update::ReleaseInfo;

// ============================================================================
// Hardware Mocks
// ============================================================================

/// Mock compressor relay.
///
/// Records every write. Set `fail` to make writes return an error.
///
/// # Example
///
/// ```rust
/// use rs_fridge::hal::MockRelay;
/// use rs_fridge::traits::CompressorRelay;
///
/// let mut relay = MockRelay::new();
/// relay.set_running(true).unwrap();
/// assert!(relay.running);
/// assert_eq!(relay.call_count, 1);
///
/// relay.fail = true;
/// assert!(relay.set_running(false).is_err());
/// assert!(relay.running); // unchanged
/// ```
#[derive(Debug, Default)]
pub struct MockRelay {
    /// Current relay state.
    pub running: bool,
    /// Number of successful `set_running` calls.
    pub call_count: usize,
    /// Make every write fail.
    pub fail: bool,
}

impl MockRelay {
    /// Creates a released relay.
    pub fn new() -> Self {
        Self::default()
    }
}

impl CompressorRelay for MockRelay {
    type Error = &'static str;

    fn set_running(&mut self, on: bool) -> Result<(), &'static str> {
        if self.fail {
            return Err("relay fault");
        }
        self.running = on;
        self.call_count += 1;
        Ok(())
    }
}

/// Mock zone valve.
#[derive(Debug, Default)]
pub struct MockValve {
    /// Current valve position.
    pub zone: Zone,
    /// Number of successful `select` calls.
    pub call_count: usize,
    /// Make every write fail.
    pub fail: bool,
}

impl MockValve {
    /// Creates a valve resting on the left zone.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ZoneValve for MockValve {
    type Error = &'static str;

    fn select(&mut self, zone: Zone) -> Result<(), &'static str> {
        if self.fail {
            return Err("valve fault");
        }
        self.zone = zone;
        self.call_count += 1;
        Ok(())
    }
}

/// Mock thermistor ADC with settable raw values.
///
/// # Example
///
/// ```rust
/// use rs_fridge::hal::MockAdc;
/// use rs_fridge::traits::{ThermistorAdc, Zone};
///
/// let mut adc = MockAdc::new(2048, 1500);
/// assert_eq!(adc.read_raw(Zone::Left).unwrap(), 2048);
/// assert_eq!(adc.read_raw(Zone::Right).unwrap(), 1500);
/// ```
#[derive(Debug, Default)]
pub struct MockAdc {
    /// Raw value returned for the left zone.
    pub left: u16,
    /// Raw value returned for the right zone.
    pub right: u16,
    /// Make every read fail.
    pub fail: bool,
}

impl MockAdc {
    /// Creates an ADC returning fixed values.
    pub fn new(left: u16, right: u16) -> Self {
        Self {
            left,
            right,
            fail: false,
        }
    }
}

impl ThermistorAdc for MockAdc {
    type Error = &'static str;

    fn read_raw(&mut self, zone: Zone) -> Result<u16, &'static str> {
        if self.fail {
            return Err("adc fault");
        }
        Ok(match zone {
            Zone::Left => self.left,
            Zone::Right => self.right,
        })
    }
}

/// Mock status LED.
#[derive(Debug, Default)]
pub struct MockLed {
    /// Current LED state.
    pub lit: bool,
    /// Number of writes.
    pub call_count: usize,
}

impl MockLed {
    /// Creates an unlit LED.
    pub fn new() -> Self {
        Self::default()
    }
}

impl StatusIndicator for MockLed {
    type Error = ();

    fn set_lit(&mut self, lit: bool) -> Result<(), ()> {
        self.lit = lit;
        self.call_count += 1;
        Ok(())
    }
}

/// Controllable time source.
///
/// # Example
///
/// ```rust
/// use rs_fridge::hal::MockClock;
/// use rs_fridge::traits::Clock;
///
/// let mut clock = MockClock::new();
/// assert_eq!(clock.now_ms(), 0);
///
/// clock.set(1000);
/// assert_eq!(clock.now_ms(), 1000);
///
/// clock.advance(500);
/// assert_eq!(clock.now_ms(), 1500);
///
/// // Wall clock not synced yet: history uses uptime seconds.
/// assert_eq!(clock.log_timestamp_s(), 1);
/// clock.set_unix_time(1_700_000_000);
/// assert_eq!(clock.log_timestamp_s(), 1_700_000_000);
/// ```
#[derive(Debug, Default)]
pub struct MockClock {
    current_ms: u64,
    unix_s: Option<u64>,
}

impl MockClock {
    /// Creates a new mock clock starting at 0ms with no wall clock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the current time in milliseconds.
    pub fn set(&mut self, ms: u64) {
        self.current_ms = ms;
    }

    /// Advances time by the specified milliseconds.
    pub fn advance(&mut self, ms: u64) {
        self.current_ms += ms;
    }

    /// Sets the wall clock in Unix seconds.
    pub fn set_unix_time(&mut self, s: u64) {
        self.unix_s = Some(s);
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> u64 {
        self.current_ms
    }

    fn unix_time_s(&self) -> Option<u64> {
        self.unix_s
    }
}

// ============================================================================
// Storage and Update Mocks
// ============================================================================

/// In-memory config storage.
///
/// # Example
///
/// ```rust
/// use rs_fridge::hal::MemoryStorage;
/// use rs_fridge::store::ConfigRecord;
/// use rs_fridge::traits::ConfigStorage;
///
/// let mut storage = MemoryStorage::new();
/// assert_eq!(storage.load().unwrap(), None);
///
/// storage.save(&ConfigRecord::default()).unwrap();
/// assert_eq!(storage.save_count, 1);
/// assert!(storage.load().unwrap().is_some());
/// ```
#[derive(Debug, Default)]
pub struct MemoryStorage {
    /// Last saved record.
    pub record: Option<ConfigRecord>,
    /// Number of successful saves.
    pub save_count: usize,
    /// Make loads fail.
    pub fail_loads: bool,
    /// Make saves fail.
    pub fail_saves: bool,
}

impl MemoryStorage {
    /// Empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-loaded with a record.
    pub fn with_record(record: ConfigRecord) -> Self {
        Self {
            record: Some(record),
            ..Self::default()
        }
    }
}

impl ConfigStorage for MemoryStorage {
    type Error = &'static str;

    fn load(&mut self) -> Result<Option<ConfigRecord>, &'static str> {
        if self.fail_loads {
            return Err("read fault");
        }
        Ok(self.record)
    }

    fn save(&mut self, record: &ConfigRecord) -> Result<(), &'static str> {
        if self.fail_saves {
            return Err("write fault");
        }
        self.record = Some(*record);
        self.save_count += 1;
        Ok(())
    }
}

/// Firmware updater returning a canned release.
#[derive(Debug, Default)]
pub struct MockUpdater {
    /// Release returned by `latest_release`; `None` simulates a network error.
    pub release: Option<ReleaseInfo>,
    /// Make installs fail.
    pub fail_install: bool,
    /// URLs passed to `install`.
    pub installs: Vec<String>,
    /// Number of release checks.
    pub check_count: usize,
}

impl MockUpdater {
    /// Updater that always reports `release`.
    pub fn with_release(release: ReleaseInfo) -> Self {
        Self {
            release: Some(release),
            ..Self::default()
        }
    }
}

impl FirmwareUpdater for MockUpdater {
    type Error = &'static str;

    fn latest_release(&mut self) -> Result<ReleaseInfo, &'static str> {
        self.check_count += 1;
        self.release.clone().ok_or("no network")
    }

    fn install(&mut self, url: &str) -> Result<(), &'static str> {
        self.installs.push(String::from(url));
        if self.fail_install {
            Err("flash write failed")
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relay_counts_and_fails() {
        let mut relay = MockRelay::new();
        relay.set_running(true).unwrap();
        relay.set_running(true).unwrap();
        assert_eq!(relay.call_count, 2);
        relay.fail = true;
        assert_eq!(relay.set_running(false), Err("relay fault"));
        assert!(relay.running);
        assert_eq!(relay.call_count, 2);
    }

    #[test]
    fn valve_defaults_left() {
        let mut valve = MockValve::new();
        assert_eq!(valve.zone, Zone::Left);
        valve.select(Zone::Right).unwrap();
        assert_eq!(valve.zone, Zone::Right);
    }

    #[test]
    fn adc_failure() {
        let mut adc = MockAdc::new(1, 2);
        adc.fail = true;
        assert!(adc.read_pair().is_err());
    }

    #[test]
    fn led_tracks_state() {
        let mut led = MockLed::new();
        led.set_lit(true).unwrap();
        assert!(led.lit);
        assert_eq!(led.call_count, 1);
    }

    #[test]
    fn memory_storage_failures() {
        let mut s = MemoryStorage::new();
        s.fail_saves = true;
        assert!(s.save(&ConfigRecord::default()).is_err());
        assert_eq!(s.save_count, 0);
        s.fail_loads = true;
        assert!(s.load().is_err());
    }

    #[test]
    fn updater_records_installs() {
        let mut u = MockUpdater::default();
        assert!(u.latest_release().is_err());
        assert_eq!(u.check_count, 1);
        u.fail_install = true;
        assert!(u.install("https://example.invalid/fw.bin").is_err());
        assert_eq!(u.installs.len(), 1);
    }
}
