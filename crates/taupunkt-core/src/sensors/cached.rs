//! Time-bounded caching and failure fallback around any sensor driver.

use embassy_time::{Duration, Instant};
use log::warn;

use super::SensorReader;

/// Decorates a [`SensorReader`] with a read cache and last-known-good
/// fallback, so one flaky transaction never leaves the control loop
/// empty-handed when it has a value it could reasonably reuse.
///
/// `None` from [`read`](Self::read) means the sensor has never produced a
/// value at all — distinguishable from every real reading.
pub struct CachedSensor<S: SensorReader> {
    driver: S,
    name: &'static str,
    window: Duration,
    value: Option<S::Reading>,
    taken_at: Instant,
}

impl<S: SensorReader> CachedSensor<S> {
    pub fn new(driver: S, name: &'static str, window: Duration) -> Self {
        Self {
            driver,
            name,
            window,
            value: None,
            taken_at: Instant::now(),
        }
    }

    /// The cached value if it is fresh enough, otherwise a fresh
    /// measurement.
    ///
    /// A failed fresh read triggers exactly one bus recovery and falls
    /// back to the previous cached value.
    pub async fn read(&mut self) -> Option<S::Reading> {
        if let Some(value) = self.value
            && Instant::now() - self.taken_at < self.window
        {
            return Some(value);
        }

        match self.driver.read().await {
            Ok(value) => {
                self.value = Some(value);
                self.taken_at = Instant::now();
                Some(value)
            }
            Err(err) => {
                warn!(
                    "{}: read failed ({err}), recovering bus and reusing previous value",
                    self.name
                );
                self.driver.recover().await;
                self.value
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::SensorError;
    use core::cell::Cell;
    use embassy_futures::block_on;
    use embassy_time::MockDriver;
    use serial_test::serial;
    use std::collections::VecDeque;
    use std::rc::Rc;

    struct ScriptedSensor {
        script: VecDeque<Result<f32, SensorError>>,
        reads: Rc<Cell<usize>>,
        recoveries: Rc<Cell<usize>>,
    }

    impl ScriptedSensor {
        fn new(script: &[Result<f32, SensorError>]) -> Self {
            Self {
                script: script.iter().copied().collect(),
                reads: Rc::new(Cell::new(0)),
                recoveries: Rc::new(Cell::new(0)),
            }
        }
    }

    impl SensorReader for ScriptedSensor {
        type Reading = f32;

        async fn read(&mut self) -> Result<f32, SensorError> {
            self.reads.set(self.reads.get() + 1);
            self.script.pop_front().expect("script exhausted")
        }

        async fn recover(&mut self) {
            self.recoveries.set(self.recoveries.get() + 1);
        }
    }

    const WINDOW: Duration = Duration::from_secs(3600);

    #[test]
    #[serial]
    fn reads_within_the_window_hit_the_cache() {
        let sensor = ScriptedSensor::new(&[Ok(21.5)]);
        let reads = Rc::clone(&sensor.reads);

        let mut cached = CachedSensor::new(sensor, "test", WINDOW);
        let first = block_on(cached.read()).unwrap();
        let second = block_on(cached.read()).unwrap();

        assert_eq!(first.to_bits(), second.to_bits());
        assert_eq!(reads.get(), 1);
    }

    #[test]
    #[serial]
    fn an_expired_window_forces_a_fresh_transaction() {
        let sensor = ScriptedSensor::new(&[Ok(21.5), Ok(22.0)]);
        let reads = Rc::clone(&sensor.reads);

        let mut cached = CachedSensor::new(sensor, "test", WINDOW);
        assert_eq!(block_on(cached.read()), Some(21.5));

        MockDriver::get().advance(WINDOW + Duration::from_millis(1));
        assert_eq!(block_on(cached.read()), Some(22.0));
        assert_eq!(reads.get(), 2);
    }

    #[test]
    #[serial]
    fn a_failed_read_recovers_once_and_returns_the_prior_value() {
        let sensor = ScriptedSensor::new(&[Ok(21.5), Err(SensorError::Bus)]);
        let recoveries = Rc::clone(&sensor.recoveries);

        let mut cached = CachedSensor::new(sensor, "test", WINDOW);
        assert_eq!(block_on(cached.read()), Some(21.5));

        MockDriver::get().advance(WINDOW + Duration::from_millis(1));
        assert_eq!(block_on(cached.read()), Some(21.5));
        assert_eq!(recoveries.get(), 1);
    }

    #[test]
    #[serial]
    fn no_value_until_a_read_ever_succeeds() {
        let sensor = ScriptedSensor::new(&[Err(SensorError::Bus), Err(SensorError::Checksum)]);
        let reads = Rc::clone(&sensor.reads);
        let recoveries = Rc::clone(&sensor.recoveries);

        let mut cached = CachedSensor::new(sensor, "test", Duration::from_millis(0));
        assert_eq!(block_on(cached.read()), None);
        assert_eq!(block_on(cached.read()), None);
        assert_eq!(reads.get(), 2);
        assert_eq!(recoveries.get(), 2);
    }
}
