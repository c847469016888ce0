//! Compile-time configuration for the monitor.
//!
//! Everything here is fixed at startup; the device has no runtime
//! reconfiguration surface. Pin assignments live with the firmware.

use embassy_time::Duration;

/// I2C bus clock. The sensor protocols are timed for standard mode, and
/// recovery reinitializes the bus at this same rate.
pub const BUS_FREQUENCY_KHZ: u32 = 100;

/// Maximum age of a cached sensor reading before the bus is queried again.
pub const CACHE_WINDOW: Duration = Duration::from_secs(30);

/// Time between measurement cycles.
pub const MEASUREMENT_INTERVAL: Duration = Duration::from_secs(900);

/// Shortened sleep after a cycle that produced no usable data.
pub const RETRY_INTERVAL: Duration = Duration::from_secs(5);

/// How much drier (in °C of dew point) outdoor air has to be before
/// ventilating is recommended outright.
pub const DEWPOINT_DELTA: f32 = 2.0;

/// Hardware watchdog timeout in milliseconds. The watchdog is fed once per
/// cycle, so this must exceed `MEASUREMENT_INTERVAL` plus the worst-case
/// cycle time (sensor settle delays, busy polling, rendering).
pub const WATCHDOG_TIMEOUT_MS: u64 = 920_000;

/// Tunables consumed by the supervisory loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonitorConfig {
    pub interval: Duration,
    pub retry_interval: Duration,
    pub dewpoint_delta: f32,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval: MEASUREMENT_INTERVAL,
            retry_interval: RETRY_INTERVAL,
            dewpoint_delta: DEWPOINT_DELTA,
        }
    }
}
