//! Thermistor conversion and two-point calibration.
//!
//! Each zone has a 2.5 kΩ NTC thermistor in a divider with a 2.5 kΩ series
//! resistor, sampled by a 12-bit ADC. Conversion is a pure function of the
//! raw sample, the active [`NtcParams`] and the configured offset.
//!
//! # Example
//!
//! ```rust
//! use rs_fridge::sensor::{read_zone_temperature, NtcParams};
//!
//! // Mid-scale is the nominal point of the default thermistor.
//! let t = read_zone_temperature(2048, &NtcParams::DEFAULT, 0.0).unwrap();
//! assert!((t - 25.0).abs() < 0.1);
//!
//! // Samples at either rail are rejected, not converted.
//! assert!(read_zone_temperature(0, &NtcParams::DEFAULT, 0.0).is_err());
//! assert!(read_zone_temperature(4095, &NtcParams::DEFAULT, 0.0).is_err());
//! ```

use crate::error::{CalibrationError, SensorError};
use crate::traits::{RawReadings, Zone};

/// Full-scale reading of the 12-bit ADC.
pub const ADC_MAX: u16 = 4095;

/// Series resistor in the thermistor divider (Ω).
pub const SERIES_RESISTOR_OHMS: f32 = 2500.0;

const KELVIN: f32 = 273.15;

/// Beta-model constants for an NTC thermistor.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct NtcParams {
    /// Resistance at the nominal temperature (Ω).
    pub nominal_resistance: f32,
    /// Nominal temperature (°C).
    pub nominal_temp_c: f32,
    /// Beta coefficient (K).
    pub beta: f32,
}

impl NtcParams {
    /// Datasheet constants for the fitted 2.5 kΩ / B5000 thermistor.
    pub const DEFAULT: Self = Self {
        nominal_resistance: 2500.0,
        nominal_temp_c: 25.0,
        beta: 5000.0,
    };

    /// Convert a thermistor resistance to °C (simplified Steinhart–Hart).
    pub fn temperature_c(&self, resistance: f32) -> f32 {
        let mut s = libm::logf(resistance / self.nominal_resistance);
        s /= self.beta;
        s += 1.0 / (self.nominal_temp_c + KELVIN);
        1.0 / s - KELVIN
    }

    /// Inverse of [`temperature_c`](Self::temperature_c).
    pub fn resistance_at(&self, temp_c: f32) -> f32 {
        let inv = 1.0 / (temp_c + KELVIN) - 1.0 / (self.nominal_temp_c + KELVIN);
        self.nominal_resistance * libm::expf(self.beta * inv)
    }

    fn is_usable(&self) -> bool {
        self.beta.is_finite()
            && self.beta > 0.0
            && self.nominal_resistance.is_finite()
            && self.nominal_resistance > 0.0
            && self.nominal_temp_c.is_finite()
    }
}

impl Default for NtcParams {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Convert a raw divider reading to thermistor resistance.
///
/// Rejects readings at either rail, where the divider equation divides by
/// zero or yields zero resistance.
pub fn adc_to_resistance(raw: u16) -> Result<f32, SensorError> {
    if raw == 0 {
        return Err(SensorError::AdcFloor(raw));
    }
    if raw >= ADC_MAX {
        return Err(SensorError::AdcCeiling(raw));
    }
    Ok(SERIES_RESISTOR_OHMS * (ADC_MAX as f32 / raw as f32 - 1.0))
}

/// Raw reading the divider would produce for a given resistance.
///
/// Clamped to `1..=4094` so the result always converts back.
pub fn resistance_to_adc(resistance: f32) -> u16 {
    let raw = ADC_MAX as f32 / (resistance / SERIES_RESISTOR_OHMS + 1.0);
    let raw = libm::roundf(raw);
    if raw.is_nan() || raw < 1.0 {
        1
    } else if raw > (ADC_MAX - 1) as f32 {
        ADC_MAX - 1
    } else {
        raw as u16
    }
}

/// Convert a raw reading to a calibrated zone temperature in °C.
pub fn read_zone_temperature(
    raw: u16,
    params: &NtcParams,
    offset_c: f32,
) -> Result<f32, SensorError> {
    let resistance = adc_to_resistance(raw)?;
    let temp = params.temperature_c(resistance) + offset_c;
    if temp.is_finite() {
        Ok(temp)
    } else {
        Err(SensorError::NonFinite)
    }
}

/// Resistances of both thermistors captured at a known temperature.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct CalibrationPoint {
    /// Reference temperature supplied by the operator (°C).
    pub temp: f32,
    /// Left thermistor resistance (Ω).
    pub resistance_left: f32,
    /// Right thermistor resistance (Ω).
    pub resistance_right: f32,
}

impl CalibrationPoint {
    /// Factory point 1: nominal resistance at 25 °C on both sensors.
    pub const FACTORY: Self = Self {
        temp: 25.0,
        resistance_left: 2500.0,
        resistance_right: 2500.0,
    };

    /// Capture a point from the current raw readings.
    pub fn capture(actual_temp: f32, raw: RawReadings) -> Result<Self, SensorError> {
        Ok(Self {
            temp: actual_temp,
            resistance_left: adc_to_resistance(raw.left)?,
            resistance_right: adc_to_resistance(raw.right)?,
        })
    }

    /// Resistance recorded for one zone.
    pub fn resistance(&self, zone: Zone) -> f32 {
        match zone {
            Zone::Left => self.resistance_left,
            Zone::Right => self.resistance_right,
        }
    }

    fn has_valid_resistance(&self) -> bool {
        self.resistance_left.is_finite() && self.resistance_left > 0.0
    }
}

/// Derive beta-model constants from two calibration points.
///
/// Uses the left sensor's resistances, `beta = ln(R1/R2) / (1/T1 - 1/T2)`,
/// and takes the warmer point (point 1 on a tie) as the nominal reference.
pub fn derive_params(
    p1: &CalibrationPoint,
    p2: &CalibrationPoint,
) -> Result<NtcParams, CalibrationError> {
    if !p1.has_valid_resistance() || !p2.has_valid_resistance() {
        return Err(CalibrationError::InvalidResistance);
    }
    if p1.temp == p2.temp {
        return Err(CalibrationError::EqualTemperatures);
    }

    let t1 = p1.temp + KELVIN;
    let t2 = p2.temp + KELVIN;
    let beta = libm::logf(p1.resistance_left / p2.resistance_left) / (1.0 / t1 - 1.0 / t2);
    if !beta.is_finite() || beta <= 0.0 {
        return Err(CalibrationError::InvalidBeta(beta));
    }

    let nominal = if p1.temp >= p2.temp { p1 } else { p2 };
    Ok(NtcParams {
        nominal_resistance: nominal.resistance_left,
        nominal_temp_c: nominal.temp,
        beta,
    })
}

/// Persisted two-point calibration for both thermistors.
///
/// Until point 2 is captured and yields valid constants, conversion uses
/// [`NtcParams::DEFAULT`].
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct NtcCalibration {
    /// First reference point.
    pub point1: CalibrationPoint,
    /// Second reference point, once captured.
    pub point2: Option<CalibrationPoint>,
    /// Derived constants; `Some` means calibrated mode is active.
    pub custom: Option<NtcParams>,
}

impl Default for NtcCalibration {
    fn default() -> Self {
        Self {
            point1: CalibrationPoint::FACTORY,
            point2: None,
            custom: None,
        }
    }
}

impl NtcCalibration {
    /// Constants to use for conversion right now.
    pub fn active_params(&self) -> NtcParams {
        self.custom.unwrap_or(NtcParams::DEFAULT)
    }

    /// Whether calibrated mode is active.
    pub fn is_calibrated(&self) -> bool {
        self.custom.is_some()
    }

    /// Record point 1. Existing derived constants are kept until point 2
    /// is captured again.
    pub fn set_point1(&mut self, point: CalibrationPoint) {
        self.point1 = point;
    }

    /// Record point 2 and derive new constants.
    ///
    /// The point is stored even when derivation fails; calibrated mode is
    /// then left as it was.
    pub fn set_point2(&mut self, point: CalibrationPoint) -> Result<NtcParams, CalibrationError> {
        self.point2 = Some(point);
        let params = derive_params(&self.point1, &point)?;
        self.custom = Some(params);
        Ok(params)
    }

    /// Back to factory point 1, no point 2, default constants.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Repair unusable stored values. Returns `true` if anything changed.
    pub fn sanitize(&mut self) -> bool {
        let mut corrected = false;
        if !self.point1.has_valid_resistance() {
            self.point1 = CalibrationPoint::FACTORY;
            corrected = true;
        }
        if matches!(self.point2, Some(p) if !p.has_valid_resistance() || p.temp.is_nan()) {
            self.point2 = None;
            corrected = true;
        }
        if matches!(self.custom, Some(p) if !p.is_usable()) {
            self.custom = None;
            corrected = true;
        }
        corrected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32, tol: f32) -> bool {
        (a - b).abs() <= tol
    }

    // =========================================================================
    // Conversion
    // =========================================================================

    #[test]
    fn rails_are_rejected() {
        assert_eq!(adc_to_resistance(0), Err(SensorError::AdcFloor(0)));
        assert_eq!(adc_to_resistance(4095), Err(SensorError::AdcCeiling(4095)));
        assert_eq!(adc_to_resistance(5000), Err(SensorError::AdcCeiling(5000)));
        assert!(adc_to_resistance(1).is_ok());
        assert!(adc_to_resistance(4094).is_ok());
    }

    #[test]
    fn divider_equation() {
        let r = adc_to_resistance(1365).unwrap();
        // 4095/1365 = 3, so R = 2 * series
        assert!(close(r, 5000.0, 0.5));
    }

    #[test]
    fn default_params_at_nominal() {
        let t = NtcParams::DEFAULT.temperature_c(2500.0);
        assert!(close(t, 25.0, 0.001));
    }

    #[test]
    fn colder_means_more_resistance() {
        let p = NtcParams::DEFAULT;
        assert!(p.resistance_at(0.0) > p.resistance_at(25.0));
        assert!(p.temperature_c(8000.0) < p.temperature_c(2500.0));
    }

    #[test]
    fn resistance_at_inverts_temperature() {
        let p = NtcParams::DEFAULT;
        for t in [-15.0_f32, 0.0, 4.0, 12.5, 30.0] {
            assert!(close(p.temperature_c(p.resistance_at(t)), t, 0.01));
        }
    }

    #[test]
    fn offset_is_added_last() {
        let base = read_zone_temperature(2048, &NtcParams::DEFAULT, 0.0).unwrap();
        let shifted = read_zone_temperature(2048, &NtcParams::DEFAULT, -1.5).unwrap();
        assert!(close(shifted, base - 1.5, 0.0001));
    }

    #[test]
    fn resistance_to_adc_clamps() {
        assert_eq!(resistance_to_adc(0.0), 4094);
        assert_eq!(resistance_to_adc(1.0e9), 1);
        assert_eq!(resistance_to_adc(f32::NAN), 1);
        assert_eq!(resistance_to_adc(2500.0), 2048);
    }

    // =========================================================================
    // Calibration
    // =========================================================================

    fn point_from(params: &NtcParams, temp: f32) -> CalibrationPoint {
        let r = params.resistance_at(temp);
        CalibrationPoint {
            temp,
            resistance_left: r,
            resistance_right: r * 1.02,
        }
    }

    #[test]
    fn derive_recovers_known_beta() {
        let truth = NtcParams {
            nominal_resistance: 2500.0,
            nominal_temp_c: 25.0,
            beta: 3950.0,
        };
        let p1 = point_from(&truth, 25.0);
        let p2 = point_from(&truth, 0.0);

        let derived = derive_params(&p1, &p2).unwrap();
        assert!(close(derived.beta, 3950.0, 1.0));
        assert_eq!(derived.nominal_temp_c, 25.0);
        assert!(close(derived.nominal_resistance, 2500.0, 0.1));
    }

    #[test]
    fn warmer_point_becomes_nominal() {
        let truth = NtcParams::DEFAULT;
        let p1 = point_from(&truth, 2.0);
        let p2 = point_from(&truth, 20.0);

        let derived = derive_params(&p1, &p2).unwrap();
        assert_eq!(derived.nominal_temp_c, 20.0);
        assert_eq!(derived.nominal_resistance, p2.resistance_left);
    }

    #[test]
    fn equal_temperatures_rejected() {
        let p = point_from(&NtcParams::DEFAULT, 10.0);
        assert_eq!(derive_params(&p, &p), Err(CalibrationError::EqualTemperatures));
    }

    #[test]
    fn non_positive_resistance_rejected() {
        let p1 = CalibrationPoint::FACTORY;
        let p2 = CalibrationPoint {
            temp: 0.0,
            resistance_left: 0.0,
            resistance_right: 0.0,
        };
        assert_eq!(derive_params(&p1, &p2), Err(CalibrationError::InvalidResistance));
    }

    #[test]
    fn inverted_curve_rejected() {
        // Resistance rising with temperature gives a negative beta.
        let p1 = CalibrationPoint::FACTORY;
        let p2 = CalibrationPoint {
            temp: 0.0,
            resistance_left: 1000.0,
            resistance_right: 1000.0,
        };
        assert!(matches!(
            derive_params(&p1, &p2),
            Err(CalibrationError::InvalidBeta(_))
        ));
    }

    #[test]
    fn point2_enables_calibrated_mode() {
        let truth = NtcParams {
            nominal_resistance: 2700.0,
            nominal_temp_c: 25.0,
            beta: 4200.0,
        };
        let mut cal = NtcCalibration::default();
        assert!(!cal.is_calibrated());
        assert_eq!(cal.active_params(), NtcParams::DEFAULT);

        cal.set_point1(point_from(&truth, 22.0));
        assert!(!cal.is_calibrated());

        let params = cal.set_point2(point_from(&truth, 1.0)).unwrap();
        assert!(cal.is_calibrated());
        assert_eq!(cal.active_params(), params);

        // Both points now convert back to their reference temperatures.
        let r = truth.resistance_at(1.0);
        assert!(close(cal.active_params().temperature_c(r), 1.0, 0.05));
    }

    #[test]
    fn failed_point2_keeps_previous_mode() {
        let mut cal = NtcCalibration::default();
        let bad = CalibrationPoint { temp: 25.0, ..CalibrationPoint::FACTORY };
        assert!(cal.set_point2(bad).is_err());
        assert!(!cal.is_calibrated());
        assert_eq!(cal.point2, Some(bad));
    }

    #[test]
    fn reset_restores_factory() {
        let mut cal = NtcCalibration::default();
        cal.set_point1(point_from(&NtcParams::DEFAULT, 20.0));
        cal.set_point2(point_from(&NtcParams::DEFAULT, 0.0)).unwrap();
        cal.reset();
        assert_eq!(cal, NtcCalibration::default());
        assert_eq!(cal.point1.temp, 25.0);
        assert_eq!(cal.point1.resistance_right, 2500.0);
    }

    #[test]
    fn sanitize_repairs_garbage() {
        let mut cal = NtcCalibration {
            point1: CalibrationPoint {
                temp: 25.0,
                resistance_left: f32::NAN,
                resistance_right: 2500.0,
            },
            point2: None,
            custom: Some(NtcParams {
                beta: -1.0,
                ..NtcParams::DEFAULT
            }),
        };
        assert!(cal.sanitize());
        assert_eq!(cal, NtcCalibration::default());
        assert!(!cal.sanitize());
    }

    #[test]
    fn capture_rejects_rail_reading() {
        let raw = RawReadings { left: 0, right: 2000 };
        assert_eq!(
            CalibrationPoint::capture(4.0, raw),
            Err(SensorError::AdcFloor(0))
        );
    }
}
