//! Thermostat tunables and their safe bounds.
//!
//! [`ControllerConfig`] is the set of parameters the control engine reads
//! every cycle. It is only ever replaced through [`ConfigPatch`] merges or
//! a load, both of which end in [`ControllerConfig::sanitize`], so the engine
//! can assume every field is finite and within [`Bounds`].
//!
//! All run-time fields are minutes and all temperatures are °C.
//!
//! # Example
//!
//! ```rust
//! use rs_fridge::settings::{ConfigPatch, ControllerConfig};
//!
//! let config = ControllerConfig::default();
//! let patch = ConfigPatch {
//!     left_setpoint: Some(2.0),
//!     hysteresis: Some(99.0), // out of range, replaced by the default
//!     ..Default::default()
//! };
//!
//! let (merged, corrected) = patch.merge(&config);
//! assert_eq!(merged.left_setpoint, 2.0);
//! assert_eq!(merged.hysteresis, 1.5);
//! assert!(corrected);
//! ```

use crate::traits::Zone;

/// Inclusive range and factory default for one numeric field.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    /// Lowest accepted value.
    pub min: f32,
    /// Highest accepted value.
    pub max: f32,
    /// Value substituted when the stored or requested one is unusable.
    pub default: f32,
}

impl Bounds {
    const fn new(min: f32, max: f32, default: f32) -> Self {
        Self { min, max, default }
    }

    /// Whether `value` is a number inside the range.
    pub fn contains(&self, value: f32) -> bool {
        !value.is_nan() && value >= self.min && value <= self.max
    }

    /// Replace an unusable value with the default. Returns `true` if replaced.
    pub fn repair(&self, value: &mut f32) -> bool {
        if self.contains(*value) {
            false
        } else {
            *value = self.default;
            true
        }
    }
}

/// Setpoint range (°C), shared by both zones.
pub const SETPOINT: Bounds = Bounds::new(-20.0, 10.0, 4.0);
/// Hysteresis range (°C).
pub const HYSTERESIS: Bounds = Bounds::new(1.0, 8.0, 1.5);
/// Minimum compressor run time (minutes).
pub const MIN_RUN_TIME: Bounds = Bounds::new(0.5, 10.0, 1.0);
/// Minimum compressor rest time (minutes).
pub const MIN_STOP_TIME: Bounds = Bounds::new(1.0, 15.0, 5.0);
/// Minimum time between zone switches (minutes).
pub const MIN_ZONE_SWITCH_TIME: Bounds = Bounds::new(1.0, 10.0, 5.0);
/// Maximum continuous run time (minutes).
pub const MAX_RUN_TIME: Bounds = Bounds::new(10.0, 45.0, 30.0);
/// Sensor offset (°C).
pub const TEMPERATURE_OFFSET: Bounds = Bounds::new(-5.0, 5.0, 0.0);

/// Convert a minutes setting to milliseconds.
#[inline]
pub fn minutes_to_ms(minutes: f32) -> u64 {
    if minutes.is_nan() || minutes <= 0.0 {
        0
    } else {
        libm::roundf(minutes * 60_000.0) as u64
    }
}

/// Thermostat configuration read by the control engine.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ControllerConfig {
    /// Left zone setpoint (°C).
    pub left_setpoint: f32,
    /// Right zone setpoint (°C).
    pub right_setpoint: f32,
    /// Deadband applied on both sides of each setpoint (°C).
    pub hysteresis: f32,
    /// Minimum compressor run time (minutes).
    pub min_run_time: f32,
    /// Minimum compressor rest time (minutes).
    pub min_stop_time: f32,
    /// Minimum time between zone switches (minutes).
    pub min_zone_switch_time: f32,
    /// Maximum continuous run time (minutes).
    pub max_run_time: f32,
    /// Offset added to every converted reading (°C).
    #[cfg_attr(feature = "serde", serde(rename = "tempOffset"))]
    pub temperature_offset: f32,
    /// Whether the left zone is thermostatically controlled.
    pub left_enabled: bool,
    /// Whether the right zone is thermostatically controlled.
    pub right_enabled: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            left_setpoint: SETPOINT.default,
            right_setpoint: SETPOINT.default,
            hysteresis: HYSTERESIS.default,
            min_run_time: MIN_RUN_TIME.default,
            min_stop_time: MIN_STOP_TIME.default,
            min_zone_switch_time: MIN_ZONE_SWITCH_TIME.default,
            max_run_time: MAX_RUN_TIME.default,
            temperature_offset: TEMPERATURE_OFFSET.default,
            left_enabled: true,
            right_enabled: true,
        }
    }
}

impl ControllerConfig {
    /// Replace every out-of-range or non-numeric field with its default.
    ///
    /// Returns `true` if any field was replaced.
    pub fn sanitize(&mut self) -> bool {
        // Non-short-circuiting so every field is checked.
        SETPOINT.repair(&mut self.left_setpoint)
            | SETPOINT.repair(&mut self.right_setpoint)
            | HYSTERESIS.repair(&mut self.hysteresis)
            | MIN_RUN_TIME.repair(&mut self.min_run_time)
            | MIN_STOP_TIME.repair(&mut self.min_stop_time)
            | MIN_ZONE_SWITCH_TIME.repair(&mut self.min_zone_switch_time)
            | MAX_RUN_TIME.repair(&mut self.max_run_time)
            | TEMPERATURE_OFFSET.repair(&mut self.temperature_offset)
    }

    /// Whether every field is within bounds.
    pub fn is_valid(&self) -> bool {
        let mut copy = *self;
        !copy.sanitize()
    }

    /// Setpoint for a zone.
    pub fn setpoint(&self, zone: Zone) -> f32 {
        match zone {
            Zone::Left => self.left_setpoint,
            Zone::Right => self.right_setpoint,
        }
    }

    /// Whether a zone is enabled.
    pub fn enabled(&self, zone: Zone) -> bool {
        match zone {
            Zone::Left => self.left_enabled,
            Zone::Right => self.right_enabled,
        }
    }

    /// Minimum run time in milliseconds.
    pub fn min_run_ms(&self) -> u64 {
        minutes_to_ms(self.min_run_time)
    }

    /// Minimum rest time in milliseconds.
    pub fn min_stop_ms(&self) -> u64 {
        minutes_to_ms(self.min_stop_time)
    }

    /// Minimum zone switch interval in milliseconds.
    pub fn min_zone_switch_ms(&self) -> u64 {
        minutes_to_ms(self.min_zone_switch_time)
    }

    /// Maximum run time in milliseconds.
    pub fn max_run_ms(&self) -> u64 {
        minutes_to_ms(self.max_run_time)
    }
}

/// Partial update to [`ControllerConfig`]. Absent fields are left untouched.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct ConfigPatch {
    /// New left setpoint.
    pub left_setpoint: Option<f32>,
    /// New right setpoint.
    pub right_setpoint: Option<f32>,
    /// New hysteresis.
    pub hysteresis: Option<f32>,
    /// New minimum run time.
    pub min_run_time: Option<f32>,
    /// New minimum rest time.
    pub min_stop_time: Option<f32>,
    /// New minimum zone switch interval.
    pub min_zone_switch_time: Option<f32>,
    /// New maximum run time.
    pub max_run_time: Option<f32>,
    /// New sensor offset.
    #[cfg_attr(feature = "serde", serde(rename = "tempOffset"))]
    pub temperature_offset: Option<f32>,
    /// Enable or disable the left zone.
    pub left_enabled: Option<bool>,
    /// Enable or disable the right zone.
    pub right_enabled: Option<bool>,
}

impl ConfigPatch {
    /// Whether the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply the patch on top of `base` and validate the result.
    ///
    /// Returns the merged config and whether any field had to be replaced
    /// by its default.
    pub fn merge(&self, base: &ControllerConfig) -> (ControllerConfig, bool) {
        let mut c = *base;
        if let Some(v) = self.left_setpoint {
            c.left_setpoint = v;
        }
        if let Some(v) = self.right_setpoint {
            c.right_setpoint = v;
        }
        if let Some(v) = self.hysteresis {
            c.hysteresis = v;
        }
        if let Some(v) = self.min_run_time {
            c.min_run_time = v;
        }
        if let Some(v) = self.min_stop_time {
            c.min_stop_time = v;
        }
        if let Some(v) = self.min_zone_switch_time {
            c.min_zone_switch_time = v;
        }
        if let Some(v) = self.max_run_time {
            c.max_run_time = v;
        }
        if let Some(v) = self.temperature_offset {
            c.temperature_offset = v;
        }
        if let Some(v) = self.left_enabled {
            c.left_enabled = v;
        }
        if let Some(v) = self.right_enabled {
            c.right_enabled = v;
        }
        let corrected = c.sanitize();
        (c, corrected)
    }
}
