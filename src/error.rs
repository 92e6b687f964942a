//! Error types shared across the crate.
//!
//! Sensor and calibration problems are recoverable. The control
//! loop treats a [`SensorError`] as a bad sample and keeps the previous
//! reading. [`FridgeError`] is what the [`FridgeController`](crate::FridgeController)
//! surfaces to the API layer.

use alloc::string::String;
use thiserror::Error;

/// A raw thermistor sample that cannot be converted to a temperature.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum SensorError {
    /// Reading of zero: the divider would imply infinite resistance.
    #[error("ADC reading {0} is at the floor (open thermistor)")]
    AdcFloor(u16),
    /// Reading at or above full scale: the divider would imply zero resistance.
    #[error("ADC reading {0} is at full scale (shorted thermistor)")]
    AdcCeiling(u16),
    /// The conversion produced NaN or infinity.
    #[error("converted temperature is not finite")]
    NonFinite,
}

/// Two-point calibration could not derive usable thermistor constants.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum CalibrationError {
    /// Point 2 has not been captured yet.
    #[error("calibration point 2 has not been captured")]
    MissingPoint,
    /// Both points were captured at the same temperature.
    #[error("calibration points share the same temperature")]
    EqualTemperatures,
    /// A captured resistance is zero, negative, or not finite.
    #[error("calibration resistance must be positive and finite")]
    InvalidResistance,
    /// The derived beta coefficient is not a positive finite number.
    #[error("derived beta coefficient {0} is not usable")]
    InvalidBeta(f32),
    /// The reference temperature is not a finite number.
    #[error("reference temperature is not a number")]
    InvalidTemperature,
    /// The sample used for capture was unreadable.
    #[error("sensor: {0}")]
    Sensor(#[from] SensorError),
}

/// Errors surfaced by the fridge controller to its callers.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FridgeError {
    /// Writing the compressor relay failed.
    #[error("compressor relay: {0}")]
    Relay(String),
    /// Moving the zone valve failed.
    #[error("zone valve: {0}")]
    Valve(String),
    /// Writing the status indicator failed.
    #[error("status indicator: {0}")]
    Indicator(String),
    /// Reading or writing the configuration medium failed.
    #[error("config storage: {0}")]
    Storage(String),
    /// The command queue is full; the command was dropped.
    #[error("command queue full")]
    QueueFull,
    /// Calibration capture or derivation failed.
    #[error("calibration: {0}")]
    Calibration(#[from] CalibrationError),
    /// No valid sample has been taken yet.
    #[error("no sensor reading available yet")]
    NoReading,
    /// A sample could not be converted.
    #[error("sensor: {0}")]
    Sensor(#[from] SensorError),
}

impl FridgeError {
    /// Wrap a hardware error's debug text.
    pub(crate) fn relay<E: core::fmt::Debug>(err: E) -> Self {
        FridgeError::Relay(alloc::format!("{err:?}"))
    }

    pub(crate) fn valve<E: core::fmt::Debug>(err: E) -> Self {
        FridgeError::Valve(alloc::format!("{err:?}"))
    }

    pub(crate) fn indicator<E: core::fmt::Debug>(err: E) -> Self {
        FridgeError::Indicator(alloc::format!("{err:?}"))
    }

    pub(crate) fn storage<E: core::fmt::Debug>(err: E) -> Self {
        FridgeError::Storage(alloc::format!("{err:?}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn sensor_error_messages() {
        assert_eq!(
            SensorError::AdcFloor(0).to_string(),
            "ADC reading 0 is at the floor (open thermistor)"
        );
        assert!(SensorError::AdcCeiling(4095).to_string().contains("4095"));
    }

    #[test]
    fn calibration_error_wraps_sensor() {
        let err: CalibrationError = SensorError::AdcFloor(0).into();
        assert!(matches!(err, CalibrationError::Sensor(_)));
    }

    #[test]
    fn fridge_error_debug_wrapping() {
        let err = FridgeError::relay("gpio busy");
        assert_eq!(err, FridgeError::Relay("\"gpio busy\"".into()));
        assert!(err.to_string().starts_with("compressor relay"));
    }
}
