//! Zone thermistors read through ADC1.
//!
//! Each thermistor sits in a divider with a 10 kΩ series resistor. The
//! channels use 11 dB attenuation so the full 0..3.3 V swing maps onto the
//! 12-bit raw range the sensor conversion expects.
//!
//! # Wiring
//!
//! - Left zone NTC → GPIO33 (ADC1 channel 5)
//! - Right zone NTC → GPIO32 (ADC1 channel 4)

use esp_idf_hal::adc::attenuation::DB_11;
use esp_idf_hal::adc::oneshot::config::AdcChannelConfig;
use esp_idf_hal::adc::oneshot::{AdcChannelDriver, AdcDriver};
use esp_idf_hal::adc::ADC1;
use esp_idf_hal::gpio::{Gpio32, Gpio33};
use esp_idf_hal::peripheral::Peripheral;
use esp_idf_hal::sys::EspError;

use crate::traits::{ThermistorAdc, Zone};

/// Both zone thermistors on a shared ADC1 driver.
///
/// # Example
///
/// ```ignore
/// use esp_idf_hal::adc::oneshot::AdcDriver;
/// use rs_fridge::hal::esp32::Esp32Thermistors;
/// use rs_fridge::traits::ThermistorAdc;
///
/// let peripherals = Peripherals::take()?;
/// let adc1 = AdcDriver::new(peripherals.adc1)?;
/// let mut ntc = Esp32Thermistors::new(&adc1, peripherals.pins.gpio33, peripherals.pins.gpio32)?;
/// let raw = ntc.read_pair()?;
/// ```
pub struct Esp32Thermistors<'d> {
    left: AdcChannelDriver<'d, Gpio33, &'d AdcDriver<'d, ADC1>>,
    right: AdcChannelDriver<'d, Gpio32, &'d AdcDriver<'d, ADC1>>,
}

impl<'d> Esp32Thermistors<'d> {
    /// Configure both channels on `adc`.
    pub fn new(
        adc: &'d AdcDriver<'d, ADC1>,
        left_pin: impl Peripheral<P = Gpio33> + 'd,
        right_pin: impl Peripheral<P = Gpio32> + 'd,
    ) -> Result<Self, EspError> {
        let config = AdcChannelConfig {
            attenuation: DB_11,
            ..Default::default()
        };
        Ok(Self {
            left: AdcChannelDriver::new(adc, left_pin, &config)?,
            right: AdcChannelDriver::new(adc, right_pin, &config)?,
        })
    }
}

impl ThermistorAdc for Esp32Thermistors<'_> {
    type Error = EspError;

    fn read_raw(&mut self, zone: Zone) -> Result<u16, EspError> {
        match zone {
            Zone::Left => self.left.read_raw(),
            Zone::Right => self.right.read_raw(),
        }
    }
}
