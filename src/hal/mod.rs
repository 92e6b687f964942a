//! Hardware Abstraction Layer implementations.
//!
//! This module contains concrete implementations of the traits
//! defined in [`crate::traits`] for various platforms.
//!
//! # Available Implementations
//!
//! - `mock`: Test implementations for desktop development
//! - `sim`: Simulated two-zone cabinet producing raw thermistor readings
//! - `host`: `Instant`/`SystemTime` clock for desktop builds (requires `std` feature)
//! - `esp32`: ESP32 relay, valve, thermistors, LED, WiFi, NVS and OTA (requires `esp32` feature)

pub mod mock;
pub mod sim;

#[cfg(feature = "std")]
pub mod host;

#[cfg(feature = "esp32")]
pub mod esp32;

pub use mock::*;
pub use sim::*;

#[cfg(feature = "std")]
pub use host::*;

#[cfg(feature = "esp32")]
pub use esp32::*;
