//! Simulated two-zone cabinet for the desktop server and tests.
//!
//! Each zone warms toward ambient (Newton's law of cooling) and the zone
//! the valve selects is pulled down at a fixed rate while the compressor
//! runs. Readings are reported as raw ADC values through the default
//! thermistor curve, so the full conversion path is exercised.

use crate::sensor::{resistance_to_adc, NtcParams};
use crate::traits::{ThermistorAdc, Zone};

/// Simulated cabinet state.
///
/// # Example
///
/// ```rust
/// use rs_fridge::hal::SimulatedCabinet;
/// use rs_fridge::Zone;
///
/// let mut cabinet = SimulatedCabinet::new(20.0).with_temps(8.0, 8.0);
///
/// // Ten minutes of cooling the left zone.
/// for _ in 0..300 {
///     cabinet.step(2000, true, Zone::Left);
/// }
/// assert!(cabinet.temp(Zone::Left) < 8.0);
/// assert!(cabinet.temp(Zone::Right) > 8.0);
/// ```
#[derive(Debug, Clone)]
pub struct SimulatedCabinet {
    temps: [f32; 2],
    /// Room temperature (°C).
    pub ambient_c: f32,
    /// Fraction of the gap to ambient closed per second.
    pub leak_per_s: f32,
    /// Cooling rate of the selected zone while running (°C/s).
    pub cooling_c_per_s: f32,
}

impl SimulatedCabinet {
    /// Cabinet with both zones at ambient.
    pub fn new(ambient_c: f32) -> Self {
        Self {
            temps: [ambient_c; 2],
            ambient_c,
            leak_per_s: 0.0005,
            cooling_c_per_s: 0.02,
        }
    }

    /// Set starting zone temperatures.
    pub fn with_temps(mut self, left: f32, right: f32) -> Self {
        self.temps = [left, right];
        self
    }

    /// Current temperature of a zone.
    pub fn temp(&self, zone: Zone) -> f32 {
        self.temps[zone.index()]
    }

    /// Force a zone temperature (e.g. door opened).
    pub fn set_temp(&mut self, zone: Zone, temp_c: f32) {
        self.temps[zone.index()] = temp_c;
    }

    /// Advance the model by `dt_ms`.
    pub fn step(&mut self, dt_ms: u64, compressor_on: bool, valve: Zone) {
        let dt = dt_ms as f32 / 1000.0;
        for zone in Zone::ALL {
            let t = &mut self.temps[zone.index()];
            *t += (self.ambient_c - *t) * self.leak_per_s * dt;
            if compressor_on && zone == valve {
                *t -= self.cooling_c_per_s * dt;
            }
        }
    }
}

impl ThermistorAdc for SimulatedCabinet {
    type Error = core::convert::Infallible;

    fn read_raw(&mut self, zone: Zone) -> Result<u16, Self::Error> {
        let r = NtcParams::DEFAULT.resistance_at(self.temp(zone));
        Ok(resistance_to_adc(r))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::read_zone_temperature;

    #[test]
    fn drifts_toward_ambient_when_off() {
        let mut cab = SimulatedCabinet::new(25.0).with_temps(0.0, 30.0);
        for _ in 0..100 {
            cab.step(1000, false, Zone::Left);
        }
        assert!(cab.temp(Zone::Left) > 0.0);
        assert!(cab.temp(Zone::Right) < 30.0);
    }

    #[test]
    fn only_selected_zone_cools() {
        let mut cab = SimulatedCabinet::new(10.0);
        cab.step(10_000, true, Zone::Right);
        assert_eq!(cab.temp(Zone::Left), 10.0);
        assert!(cab.temp(Zone::Right) < 10.0);
    }

    #[test]
    fn raw_reading_converts_back() {
        let mut cab = SimulatedCabinet::new(20.0).with_temps(3.0, -5.0);
        let raw = cab.read_pair().unwrap();
        let left = read_zone_temperature(raw.left, &NtcParams::DEFAULT, 0.0).unwrap();
        let right = read_zone_temperature(raw.right, &NtcParams::DEFAULT, 0.0).unwrap();
        assert!((left - 3.0).abs() < 0.1);
        assert!((right + 5.0).abs() < 0.1);
    }
}
