//! Digital outputs: compressor relay, zone valve and status LED.
//!
//! All three are plain push-pull GPIOs.
//!
//! | Output | Pin | High means |
//! |--------|-----|------------|
//! | Compressor relay | GPIO4 | compressor running |
//! | Zone valve (solenoid) | GPIO2 | refrigerant to the right zone |
//! | Status LED | GPIO5 | compressor running |

use esp_idf_hal::gpio::{AnyOutputPin, Output, OutputPin, PinDriver};
use esp_idf_hal::peripheral::Peripheral;
use esp_idf_hal::sys::EspError;

use crate::traits::{CompressorRelay, StatusIndicator, Zone, ZoneValve};

fn output<'d>(
    pin: impl Peripheral<P = impl OutputPin> + 'd,
) -> Result<PinDriver<'d, AnyOutputPin, Output>, EspError> {
    let mut driver = PinDriver::output(pin.into_ref().map_into::<AnyOutputPin>())?;
    driver.set_low()?;
    Ok(driver)
}

fn write(pin: &mut PinDriver<'_, AnyOutputPin, Output>, high: bool) -> Result<(), EspError> {
    if high {
        pin.set_high()
    } else {
        pin.set_low()
    }
}

/// Compressor relay driver. Starts released.
///
/// # Example
///
/// ```ignore
/// use rs_fridge::hal::esp32::Esp32Relay;
/// use rs_fridge::traits::CompressorRelay;
///
/// let peripherals = Peripherals::take()?;
/// let mut relay = Esp32Relay::new(peripherals.pins.gpio4)?;
/// relay.set_running(true)?;
/// ```
pub struct Esp32Relay<'d> {
    pin: PinDriver<'d, AnyOutputPin, Output>,
}

impl<'d> Esp32Relay<'d> {
    /// Claim the relay pin and drive it low.
    pub fn new(pin: impl Peripheral<P = impl OutputPin> + 'd) -> Result<Self, EspError> {
        Ok(Self { pin: output(pin)? })
    }
}

impl CompressorRelay for Esp32Relay<'_> {
    type Error = EspError;

    fn set_running(&mut self, on: bool) -> Result<(), EspError> {
        write(&mut self.pin, on)
    }
}

/// Zone valve (solenoid) driver. Starts on the left zone.
pub struct Esp32Valve<'d> {
    pin: PinDriver<'d, AnyOutputPin, Output>,
}

impl<'d> Esp32Valve<'d> {
    /// Claim the solenoid pin and route to the left zone.
    pub fn new(pin: impl Peripheral<P = impl OutputPin> + 'd) -> Result<Self, EspError> {
        Ok(Self { pin: output(pin)? })
    }
}

impl ZoneValve for Esp32Valve<'_> {
    type Error = EspError;

    fn select(&mut self, zone: Zone) -> Result<(), EspError> {
        write(&mut self.pin, zone == Zone::Right)
    }
}

/// Status LED, lit while the compressor runs.
pub struct Esp32Led<'d> {
    pin: PinDriver<'d, AnyOutputPin, Output>,
}

impl<'d> Esp32Led<'d> {
    /// Claim the LED pin, initially dark.
    pub fn new(pin: impl Peripheral<P = impl OutputPin> + 'd) -> Result<Self, EspError> {
        Ok(Self { pin: output(pin)? })
    }
}

impl StatusIndicator for Esp32Led<'_> {
    type Error = EspError;

    fn set_lit(&mut self, lit: bool) -> Result<(), EspError> {
        write(&mut self.pin, lit)
    }
}
