//! Sensor drivers and the access-reliability layer around them.
//!
//! Each physical sensor gets its own protocol driver; all of them expose
//! the same capability through [`SensorReader`] and are composed by
//! [`CachedSensor`], which adds the time-bounded cache and the
//! recover-and-fall-back policy the supervisory loop relies on.

mod aht20;
mod bmp280;
mod cached;
pub mod crc;
mod sht41;

pub use aht20::Aht20;
pub use bmp280::{Bmp280, CalibrationCoefficients, FineTemperature, Measurement};
pub use cached::CachedSensor;
pub use sht41::{Precision, Sht41};

use thiserror_no_std::Error;

/// A temperature/humidity pair from one of the climate sensors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Climate {
    pub temperature_c: f32,
    pub humidity_pct: f32,
}

impl Climate {
    /// Sanity window for a reading that is about to drive the advisory.
    ///
    /// Humidity outside [0, 100] is physically meaningless but can occur
    /// legitimately near saturation on the SHT41, which reports unclamped;
    /// anything further out means the sample is garbage.
    pub fn is_plausible(&self) -> bool {
        self.temperature_c > -40.0
            && self.temperature_c < 80.0
            && self.humidity_pct >= 0.0
            && self.humidity_pct <= 100.0
    }
}

/// Failure classes a sensor read surfaces to the supervisory layer.
///
/// `NotReady` and `Calibration` only occur while constructing a driver and
/// are fatal for that sensor; the rest are per-read and recoverable.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// The bus transaction itself failed (NACK, timeout, arbitration loss).
    #[error("bus transaction failed")]
    Bus,
    /// A response block failed its checksum.
    #[error("response failed checksum validation")]
    Checksum,
    /// The sensor still reported busy after the bounded retries.
    #[error("sensor busy after retries")]
    Busy,
    /// The sensor never reported calibrated during initialization.
    #[error("sensor not ready")]
    NotReady,
    /// The factory calibration block could not be read.
    #[error("calibration data unavailable")]
    Calibration,
}

/// Capability interface over the protocol-specific drivers.
///
/// `read` takes one fresh measurement from the hardware; `recover` tries to
/// bring the transport back to a usable state after `read` failed. Both are
/// composed by [`CachedSensor`], never called directly by the loop.
pub trait SensorReader {
    type Reading: Copy;

    fn read(&mut self) -> impl Future<Output = Result<Self::Reading, SensorError>>;

    fn recover(&mut self) -> impl Future<Output = ()>;
}
