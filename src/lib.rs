//! # rs-fridge
//!
//! A dual-zone refrigeration controller: two thermistors, one shared
//! compressor and a valve that routes refrigerant to one zone at a time,
//! with a web API for monitoring and configuration.
//!
//! ## Features
//!
//! - **Zone arbitration**: the warmer zone that needs cooling wins the compressor
//! - **Compressor protection**: minimum run, minimum rest, minimum zone switch and maximum run times
//! - **Full-width hysteresis**: start above `setpoint + hysteresis`, stop at `setpoint - hysteresis`
//! - **Two-point thermistor calibration** persisted with the settings
//! - **Manual override** of compressor and valve from the API
//! - **Temperature history** in a fixed-size ring buffer
//! - **Remote firmware updates** with a conservative scheduling policy
//!
//! ## Architecture
//!
//! The crate is structured to allow testing on desktop without hardware:
//!
//! - `traits` - Hardware, storage and update abstractions
//! - `sensor` - ADC to temperature conversion and calibration
//! - `settings` - Thermostat tunables with validated bounds
//! - `store` - Versioned persisted config record
//! - `engine` - Pure control engine (phase/decision transition table)
//! - `controller` - Owns actuators, store and history; the periodic tick
//! - `commands` - Operator commands and the hand-off queue
//! - `hal` - Concrete implementations (mock and simulator for testing, esp32 for hardware)
//!
//! ## Example
//!
//! ```rust
//! use rs_fridge::{
//!     CommandQueue, ControlCommand, FridgeController, Zone,
//!     hal::{MemoryStorage, MockAdc, MockRelay, MockValve},
//!     sensor::{resistance_to_adc, NtcParams},
//!     traits::ThermistorAdc,
//! };
//!
//! let mut controller =
//!     FridgeController::new(MockRelay::new(), MockValve::new(), MemoryStorage::new());
//!
//! // Left zone at 9 °C (above 4 + 1.5), right zone at 1 °C.
//! let adc_for = |t: f32| resistance_to_adc(NtcParams::DEFAULT.resistance_at(t));
//! let mut adc = MockAdc::new(adc_for(9.0), adc_for(1.0));
//!
//! // Operator commands are queued and applied at the top of a tick.
//! let mut queue: CommandQueue<8> = CommandQueue::new();
//! queue.push(ControlCommand::SetSystemEnabled(true)).unwrap();
//!
//! // Main loop, one pass every 2 s. No start before the minimum rest
//! // time has passed since boot.
//! for tick in 0..=150u64 {
//!     let now = tick * 2000;
//!     controller.drain_commands(&mut queue, now);
//!     let raw = adc.read_pair().unwrap();
//!     controller.record_sample(raw, now / 1000).unwrap();
//!     controller.tick(now).unwrap();
//! }
//!
//! assert!(controller.relay().running);
//! assert_eq!(controller.valve().zone, Zone::Left);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

/// Operator commands and the bounded hand-off queue.
pub mod commands;
/// Controller that owns the actuators, config store and history.
pub mod controller;
/// Zone arbitration and compressor control engine.
pub mod engine;
/// Error types.
pub mod error;
/// Hardware abstraction layer with mock implementations for testing.
pub mod hal;
/// Fixed-capacity temperature history.
pub mod history;
/// Thermistor conversion and two-point calibration.
pub mod sensor;
/// Thermostat tunables and their bounds.
pub mod settings;
/// Versioned config record and its store.
pub mod store;
/// Core traits for hardware, storage and update abstraction.
pub mod traits;
/// Firmware version comparison and update scheduling.
pub mod update;

/// Runtime configuration shared by the firmware and the desktop server.
pub mod config;

/// Request types for the HTTP API (serde-based).
#[cfg(feature = "serde")]
pub mod messages;

/// JSON file storage for the config record.
#[cfg(feature = "persist")]
pub mod persist;

/// Network services for the HTTP API (feature-gated).
#[cfg(any(feature = "web", feature = "wifi"))]
pub mod services;

// Re-exports for convenience
pub use commands::{CalibrationSlot, CommandOutcome, CommandQueue, ControlCommand};
pub use controller::{FridgeController, FridgeState};
pub use engine::{ControllerState, Decision, Phase, Status, Temperatures};
pub use error::{CalibrationError, FridgeError, SensorError};
pub use history::{LogEntry, TemperatureLog};
pub use sensor::{CalibrationPoint, NtcCalibration, NtcParams};
pub use settings::{ConfigPatch, ControllerConfig};
pub use store::{ConfigRecord, ConfigStore};
pub use traits::{
    Clock, CompressorRelay, ConfigStorage, FirmwareUpdater, RawReadings, StatusIndicator,
    ThermistorAdc, Zone, ZoneValve,
};
pub use update::{FirmwareVersion, ReleaseInfo, UpdatePolicy};

// Config re-exports
pub use config::{Config, DeviceConfig, LoopConfig, UpdateConfig, WebConfig, WifiConfig, WifiNetwork};

// Message re-exports (for the HTTP API)
#[cfg(feature = "serde")]
pub use messages::{
    AutoUpdatesRequest, CalibrationPointRequest, CompressorRequest, SystemRequest, ValveRequest,
};
