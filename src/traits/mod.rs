//! Trait definitions for hardware abstraction, persistence, and firmware updates.
//!
//! This module defines the seams that allow rs-fridge to:
//! - Run on different hardware (ESP32, desktop mock, simulated cabinet)
//! - Persist the thermostat configuration on different media
//! - Plug in a remote firmware updater
//!
//! # Submodules
//!
//! - `hardware`: Zones, compressor relay, zone valve, thermistor ADC, LED, clock
//! - `storage`: Configuration record persistence
//! - `update`: Release lookup and firmware installation
//!
//! # Hardware Abstraction
//!
//! The key hardware traits are:
//!
//! - [`CompressorRelay`]: Binary compressor output
//! - [`ZoneValve`]: Solenoid selecting the cooled zone
//! - [`ThermistorAdc`]: Raw NTC divider readings
//! - [`Clock`]: Monotonic time source for `no_std` environments

pub mod hardware;
pub mod storage;
pub mod update;

pub use hardware::*;
pub use storage::*;
pub use update::*;
