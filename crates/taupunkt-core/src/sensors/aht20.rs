//! AHT20 temperature/humidity driver (busy-poll protocol).
//!
//! The AHT20 has no per-word checksums; its protocol is a calibration
//! handshake at startup and a busy bit in the status byte that gates every
//! measurement. Construction runs the full initialization sequence and
//! fails if the sensor never reports calibrated — a driver that skipped
//! that check would happily decode garbage.

use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;
use log::{error, warn};

use super::{Climate, SensorError, SensorReader};
use crate::bus::RecoverableI2c;

/// AHT20 I2C address.
pub const ADDRESS: u8 = 0x38;

/// Soft-reset command byte.
const CMD_SOFT_RESET: u8 = 0xBA;
/// Initialization / calibration-trigger command byte.
const CMD_INITIALIZE: u8 = 0xBE;
/// Trigger-measurement command with its two fixed parameter bytes.
const CMD_TRIGGER: [u8; 3] = [0xAC, 0x33, 0x00];

/// Status bit: measurement in progress.
const STATUS_BUSY: u8 = 0x80;
/// Status bit: factory calibration loaded.
const STATUS_CALIBRATED: u8 = 0x08;

const RESET_DELAY_MS: u32 = 20;
const CALIBRATION_POLLS: usize = 5;
const CALIBRATION_POLL_DELAY_MS: u32 = 20;
/// Conversion time before the first read attempt.
const MEASURE_DELAY_MS: u32 = 80;
const BUSY_POLLS: usize = 3;
const BUSY_POLL_DELAY_MS: u32 = 10;

/// Driver errors, generic over the bus error type.
#[derive(Debug, PartialEq, Eq)]
pub enum Error<E> {
    /// I2C bus error
    I2c(E),
    /// Calibration never came up during initialization
    NotCalibrated,
    /// No valid response within the bounded busy polls
    Busy,
}

impl<E> From<E> for Error<E> {
    fn from(e: E) -> Self {
        Self::I2c(e)
    }
}

/// An AHT20 on the I2C bus `I`, pacing its transactions with `D`.
pub struct Aht20<I, D> {
    i2c: I,
    delay: D,
    address: u8,
}

impl<I, D> Aht20<I, D>
where
    I: I2c,
    D: DelayNs,
{
    /// Bring the sensor up and verify it reports calibrated.
    ///
    /// The soft reset is allowed to fail (some parts NACK it); the
    /// initialization command and the calibration check are not. A sensor
    /// that never reports calibrated cannot be constructed.
    pub async fn new(i2c: I, delay: D) -> Result<Self, Error<I::Error>> {
        let mut sensor = Self {
            i2c,
            delay,
            address: ADDRESS,
        };
        sensor.init().await?;
        Ok(sensor)
    }

    async fn init(&mut self) -> Result<(), Error<I::Error>> {
        if self.i2c.write(self.address, &[CMD_SOFT_RESET]).await.is_err() {
            warn!("AHT20: soft reset not acknowledged, continuing");
        }
        self.delay.delay_ms(RESET_DELAY_MS).await;

        self.i2c.write(self.address, &[CMD_INITIALIZE]).await?;
        self.delay.delay_ms(RESET_DELAY_MS).await;

        for _ in 0..CALIBRATION_POLLS {
            if self.status().await? & STATUS_CALIBRATED != 0 {
                return Ok(());
            }
            self.delay.delay_ms(CALIBRATION_POLL_DELAY_MS).await;
        }
        Err(Error::NotCalibrated)
    }

    async fn status(&mut self) -> Result<u8, Error<I::Error>> {
        let mut status = [0u8; 1];
        self.i2c.read(self.address, &mut status).await?;
        Ok(status[0])
    }

    /// Whether the calibration bit is currently set.
    pub async fn is_calibrated(&mut self) -> Result<bool, Error<I::Error>> {
        Ok(self.status().await? & STATUS_CALIBRATED != 0)
    }

    /// Soft-reset the sensor.
    pub async fn reset(&mut self) -> Result<(), Error<I::Error>> {
        self.i2c.write(self.address, &[CMD_SOFT_RESET]).await?;
        self.delay.delay_ms(RESET_DELAY_MS).await;
        Ok(())
    }

    /// Trigger one measurement and poll until the busy bit clears.
    ///
    /// A transient NACK while the sensor is mid-conversion counts as one
    /// failed poll, same as a busy status; only the bounded attempt count
    /// turns it into an error.
    pub async fn measure(&mut self) -> Result<Climate, Error<I::Error>> {
        self.i2c.write(self.address, &CMD_TRIGGER).await?;
        self.delay.delay_ms(MEASURE_DELAY_MS).await;

        for _ in 0..BUSY_POLLS {
            let mut data = [0u8; 6];
            match self.i2c.read(self.address, &mut data).await {
                Ok(()) if data[0] & STATUS_BUSY == 0 => return Ok(Self::decode(&data)),
                Ok(()) => {}
                Err(_) => warn!("AHT20: read NACKed while polling, retrying"),
            }
            self.delay.delay_ms(BUSY_POLL_DELAY_MS).await;
        }
        Err(Error::Busy)
    }

    /// Unpack the two 20-bit fields straddling byte 3.
    fn decode(data: &[u8; 6]) -> Climate {
        let raw_h = ((data[1] as u32) << 16 | (data[2] as u32) << 8 | data[3] as u32) >> 4;
        let raw_t = ((data[3] & 0x0F) as u32) << 16 | (data[4] as u32) << 8 | data[5] as u32;
        Climate {
            humidity_pct: raw_h as f32 * 100.0 / 1_048_576.0,
            temperature_c: raw_t as f32 * 200.0 / 1_048_576.0 - 50.0,
        }
    }
}

impl<I, D> SensorReader for Aht20<I, D>
where
    I: RecoverableI2c,
    D: DelayNs,
{
    type Reading = Climate;

    async fn read(&mut self) -> Result<Climate, SensorError> {
        self.measure().await.map_err(|e| match e {
            Error::Busy => {
                error!("AHT20: still busy after all poll attempts");
                SensorError::Busy
            }
            Error::NotCalibrated => {
                error!("AHT20: lost calibration");
                SensorError::NotReady
            }
            Error::I2c(_) => {
                error!("AHT20: bus transaction failed");
                SensorError::Bus
            }
        })
    }

    async fn recover(&mut self) {
        self.i2c.recover().await;
    }
}
