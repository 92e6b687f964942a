//! ESP32 hardware abstraction layer for the dual-zone fridge.
//!
//! # Hardware Configuration
//!
//! - **MCU**: ESP32 (Xtensa dual core, ADC1 on GPIO32..39)
//! - **Sensors**: two 10 kΩ NTC thermistors in 10 kΩ dividers
//! - **Compressor**: relay module, active high
//! - **Zone valve**: 12 V solenoid through a MOSFET, energized for the right zone
//!
//! # Pin Assignments
//!
//! See the [`pins`] module.

mod clock;
mod outputs;
mod thermistor;

pub use clock::Esp32Clock;
pub use outputs::{Esp32Led, Esp32Relay, Esp32Valve};
pub use thermistor::Esp32Thermistors;

#[cfg(feature = "wifi")]
mod nvs;
#[cfg(feature = "wifi")]
pub use nvs::{NvsStorage, NvsStorageError};

#[cfg(feature = "wifi")]
mod wifi;
#[cfg(feature = "wifi")]
pub use wifi::Esp32Wifi;

#[cfg(feature = "esp32-http")]
mod http;
#[cfg(feature = "esp32-http")]
pub use http::{Esp32HttpServer, Esp32SharedState, COMMAND_QUEUE_DEPTH};

#[cfg(feature = "esp32-ota")]
mod ota;
#[cfg(feature = "esp32-ota")]
pub use ota::{Esp32Updater, OtaError};

/// Pin assignments.
pub mod pins {
    // =========================================================================
    // Thermistors (ADC1)
    // =========================================================================

    /// Left zone NTC divider
    pub const NTC_LEFT: i32 = 33;

    /// Right zone NTC divider
    pub const NTC_RIGHT: i32 = 32;

    // =========================================================================
    // Outputs
    // =========================================================================

    /// Compressor relay (high = running)
    pub const COMPRESSOR: i32 = 4;

    /// Zone solenoid (high = right zone)
    pub const SOLENOID: i32 = 2;

    /// Status LED (lit while the compressor runs)
    pub const LED: i32 = 5;
}
