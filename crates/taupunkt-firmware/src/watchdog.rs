//! RTC watchdog wrapper.

use esp_hal::rtc_cntl::{Rtc, RwdtStage};
use taupunkt_core::config::WATCHDOG_TIMEOUT_MS;
use taupunkt_core::monitor::Watchdog;

/// The RTC watchdog, armed at construction.
///
/// Once armed it is never disabled; the supervisory loop is the only
/// feeder, so a hung cycle resets the whole device.
pub struct RtcWatchdog {
    rtc: Rtc<'static>,
}

impl RtcWatchdog {
    pub fn new(mut rtc: Rtc<'static>) -> Self {
        rtc.rwdt.set_timeout(
            RwdtStage::Stage0,
            esp_hal::time::Duration::from_millis(WATCHDOG_TIMEOUT_MS),
        );
        rtc.rwdt.enable();
        Self { rtc }
    }
}

impl Watchdog for RtcWatchdog {
    fn feed(&mut self) {
        self.rtc.rwdt.feed();
    }
}
