//! The supervisory loop: one watchdog-fed cycle from sensors to outputs.

use embassy_time::{Duration, Instant, Timer};
use embedded_hal::digital::OutputPin;
use embedded_hal_async::delay::DelayNs;
use log::{error, info, warn};

use crate::config::MonitorConfig;
use crate::decision::decide;
use crate::dewpoint::dewpoint;
use crate::display::{DashboardFrame, RenderSurface};
use crate::leds::{DISPLAY_FAULT_FLASHES, SENSOR_FAULT_FLASHES, StatusLeds};
use crate::sensors::{CachedSensor, Climate, SensorReader};

/// Hardware watchdog feed hook.
///
/// Fed exactly once per cycle, at the very top. Anything that hangs after
/// that point — a wedged bus, a stuck render, even the sleep — is meant to
/// let the watchdog bite and reset the device.
pub trait Watchdog {
    fn feed(&mut self);
}

/// The most recent cycle in which every sensor produced a plausible value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReadingSet {
    pub indoor: Climate,
    pub outdoor: Climate,
    pub pressure_hpa: f32,
}

/// Owns every resource of the device and runs the measurement cycles.
///
/// Constructed once at startup from explicitly-passed hardware; there is
/// no ambient state anywhere below this struct.
pub struct Monitor<IN, OUT, PR, W, P, R, D>
where
    IN: SensorReader<Reading = Climate>,
    OUT: SensorReader<Reading = Climate>,
    PR: SensorReader<Reading = f32>,
    W: Watchdog,
    P: OutputPin,
    R: RenderSurface,
    D: DelayNs,
{
    indoor: CachedSensor<IN>,
    outdoor: CachedSensor<OUT>,
    pressure: CachedSensor<PR>,
    watchdog: W,
    leds: StatusLeds<P>,
    display: R,
    delay: D,
    config: MonitorConfig,
    last_good: Option<ReadingSet>,
}

impl<IN, OUT, PR, W, P, R, D> Monitor<IN, OUT, PR, W, P, R, D>
where
    IN: SensorReader<Reading = Climate>,
    OUT: SensorReader<Reading = Climate>,
    PR: SensorReader<Reading = f32>,
    W: Watchdog,
    P: OutputPin,
    R: RenderSurface,
    D: DelayNs,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        indoor: CachedSensor<IN>,
        outdoor: CachedSensor<OUT>,
        pressure: CachedSensor<PR>,
        watchdog: W,
        leds: StatusLeds<P>,
        display: R,
        delay: D,
        config: MonitorConfig,
    ) -> Self {
        Self {
            indoor,
            outdoor,
            pressure,
            watchdog,
            leds,
            display,
            delay,
            config,
            last_good: None,
        }
    }

    /// Run forever, sleeping whatever interval the last cycle asked for.
    pub async fn run(&mut self) -> ! {
        loop {
            let sleep = self.run_cycle().await;
            Timer::after(sleep).await;
        }
    }

    /// One full measurement cycle; returns how long to sleep before the
    /// next one.
    pub async fn run_cycle(&mut self) -> Duration {
        self.watchdog.feed();

        let set = match self.read_all().await {
            Some(set) => {
                self.last_good = Some(set);
                set
            }
            None => {
                if self
                    .leds
                    .flash_fault(&mut self.delay, SENSOR_FAULT_FLASHES)
                    .await
                    .is_err()
                {
                    error!("fault flash failed");
                }
                match self.last_good {
                    Some(stale) => {
                        warn!("sensor cycle incomplete, reusing last known good readings");
                        stale
                    }
                    None => {
                        error!("sensor cycle failed with no fallback available");
                        self.show_error("Sensor");
                        return self.config.retry_interval;
                    }
                }
            }
        };

        let dp_indoor = dewpoint(set.indoor.temperature_c, set.indoor.humidity_pct);
        let dp_outdoor = dewpoint(set.outdoor.temperature_c, set.outdoor.humidity_pct);
        let status = decide(dp_indoor, dp_outdoor, self.config.dewpoint_delta);

        if self.leds.set(status).is_err() {
            error!("status LED update failed");
        }

        let frame = DashboardFrame {
            indoor: set.indoor,
            outdoor: set.outdoor,
            pressure_hpa: set.pressure_hpa,
            dewpoint_indoor_c: dp_indoor,
            dewpoint_outdoor_c: dp_outdoor,
            status,
            uptime_s: Instant::now().as_secs(),
        };
        if let Err(e) = self.display.show_readings(&frame) {
            error!("dashboard render failed: {e:?}");
            if self
                .leds
                .flash_fault(&mut self.delay, DISPLAY_FAULT_FLASHES)
                .await
                .is_err()
            {
                error!("fault flash failed");
            }
            if self.display.reinit().is_err() {
                error!("display reinit failed");
            }
            self.show_error("Display");
        }

        info!(
            "indoor {:.1}C {:.1}% | outdoor {:.1}C {:.1}% | dew point {:.1}C/{:.1}C | {}",
            set.indoor.temperature_c,
            set.indoor.humidity_pct,
            set.outdoor.temperature_c,
            set.outdoor.humidity_pct,
            dp_indoor,
            dp_outdoor,
            status.label()
        );

        self.config.interval
    }

    /// All three sensors through their caches. `None` unless the complete,
    /// plausible set is available — partial data never reaches the
    /// decision.
    async fn read_all(&mut self) -> Option<ReadingSet> {
        let indoor = self.indoor.read().await;
        let outdoor = self.outdoor.read().await;
        let pressure = self.pressure.read().await;

        let (Some(indoor), Some(outdoor), Some(pressure_hpa)) = (indoor, outdoor, pressure) else {
            warn!("at least one sensor has never delivered a value");
            return None;
        };
        if !(indoor.is_plausible() && indoor.humidity_pct > 0.0) {
            warn!(
                "indoor reading implausible: {:.1}C {:.1}%",
                indoor.temperature_c, indoor.humidity_pct
            );
            return None;
        }
        if outdoor.humidity_pct <= 0.0 {
            warn!(
                "outdoor humidity non-positive: {:.1}%",
                outdoor.humidity_pct
            );
            return None;
        }
        Some(ReadingSet {
            indoor,
            outdoor,
            pressure_hpa,
        })
    }

    fn show_error(&mut self, what: &str) {
        if let Err(e) = self.display.show_error(what) {
            // The next watchdog feed must still happen, so this is as far
            // as a display fault is allowed to travel.
            error!("error screen failed too: {e:?}");
        }
    }
}
