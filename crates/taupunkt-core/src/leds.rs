//! Traffic-light status outputs.

use embedded_hal::digital::OutputPin;
use embedded_hal_async::delay::DelayNs;

use crate::decision::VentilationStatus;

/// Flashes signalling a sensor-level fault.
pub const SENSOR_FAULT_FLASHES: u8 = 3;
/// Flashes signalling a display-level fault.
pub const DISPLAY_FAULT_FLASHES: u8 = 5;

const FLASH_INTERVAL_MS: u32 = 200;

/// The three mutually exclusive advisory LEDs.
pub struct StatusLeds<P> {
    red: P,
    yellow: P,
    green: P,
}

impl<P: OutputPin> StatusLeds<P> {
    pub fn new(red: P, yellow: P, green: P) -> Self {
        Self { red, yellow, green }
    }

    /// Light exactly the LED matching `status`.
    ///
    /// All three are cleared first so no intermediate state ever shows two
    /// lit at once.
    pub fn set(&mut self, status: VentilationStatus) -> Result<(), P::Error> {
        self.all_off()?;
        match status {
            VentilationStatus::Recommended => self.green.set_high(),
            VentilationStatus::Conditional => self.yellow.set_high(),
            VentilationStatus::NotRecommended => self.red.set_high(),
        }
    }

    pub fn all_off(&mut self) -> Result<(), P::Error> {
        self.red.set_low()?;
        self.yellow.set_low()?;
        self.green.set_low()
    }

    /// Flash the red LED `times` to flag a fault without latching a
    /// status. Leaves the red LED off.
    pub async fn flash_fault<D: DelayNs>(
        &mut self,
        delay: &mut D,
        times: u8,
    ) -> Result<(), P::Error> {
        for _ in 0..times {
            self.red.set_high()?;
            delay.delay_ms(FLASH_INTERVAL_MS).await;
            self.red.set_low()?;
            delay.delay_ms(FLASH_INTERVAL_MS).await;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::TestPin;
    use embassy_futures::block_on;
    use embedded_hal_mock::eh1::delay::NoopDelay;

    fn leds() -> (StatusLeds<TestPin>, TestPin, TestPin, TestPin) {
        let red = TestPin::new();
        let yellow = TestPin::new();
        let green = TestPin::new();
        (
            StatusLeds::new(red.clone(), yellow.clone(), green.clone()),
            red,
            yellow,
            green,
        )
    }

    #[test]
    fn exactly_one_led_per_status() {
        let (mut leds, red, yellow, green) = leds();

        leds.set(VentilationStatus::Recommended).unwrap();
        assert_eq!(
            (red.is_high(), yellow.is_high(), green.is_high()),
            (false, false, true)
        );

        leds.set(VentilationStatus::NotRecommended).unwrap();
        assert_eq!(
            (red.is_high(), yellow.is_high(), green.is_high()),
            (true, false, false)
        );

        leds.set(VentilationStatus::Conditional).unwrap();
        assert_eq!(
            (red.is_high(), yellow.is_high(), green.is_high()),
            (false, true, false)
        );
    }

    #[test]
    fn fault_flash_ends_dark() {
        let (mut leds, red, _, _) = leds();

        block_on(leds.flash_fault(&mut NoopDelay::new(), SENSOR_FAULT_FLASHES)).unwrap();
        assert!(!red.is_high());
    }
}
