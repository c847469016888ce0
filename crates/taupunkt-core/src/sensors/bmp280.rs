//! BMP280 pressure/temperature driver with fixed-point compensation.
//!
//! The sensor free-runs in normal mode; reading is a plain register fetch.
//! What makes it interesting is the compensation pipeline: twelve factory
//! trim values are read once at construction, and every raw sample goes
//! through Bosch's integer arithmetic — temperature first, because the
//! pressure formula consumes the fine-temperature intermediate from the
//! same sample.

use embedded_hal_async::i2c::I2c;
use log::error;

use super::{SensorError, SensorReader};
use crate::bus::RecoverableI2c;

/// BMP280 I2C address (SDO pulled low).
pub const ADDRESS: u8 = 0x76;

const REG_CTRL_MEAS: u8 = 0xF4;
const REG_CONFIG: u8 = 0xF5;
const REG_CALIBRATION: u8 = 0x88;
const REG_DATA: u8 = 0xF7;

/// Normal mode, x1 oversampling for both temperature and pressure.
const CTRL_MEAS: u8 = 0x27;
/// 1000 ms standby between conversions, IIR filter configuration.
const CONFIG: u8 = 0xA0;

/// Factory trim values, register order: three temperature terms, then the
/// nine pressure terms. Read once before the driver exists; no compensated
/// value can be produced without them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalibrationCoefficients {
    dig_t1: u16,
    dig_t2: i16,
    dig_t3: i16,
    dig_p1: u16,
    dig_p2: i16,
    dig_p3: i16,
    dig_p4: i16,
    dig_p5: i16,
    dig_p6: i16,
    dig_p7: i16,
    dig_p8: i16,
    dig_p9: i16,
}

impl CalibrationCoefficients {
    fn decode(raw: &[u8; 24]) -> Self {
        let unsigned = |i: usize| u16::from_le_bytes([raw[i], raw[i + 1]]);
        let signed = |i: usize| i16::from_le_bytes([raw[i], raw[i + 1]]);
        Self {
            dig_t1: unsigned(0),
            dig_t2: signed(2),
            dig_t3: signed(4),
            dig_p1: unsigned(6),
            dig_p2: signed(8),
            dig_p3: signed(10),
            dig_p4: signed(12),
            dig_p5: signed(14),
            dig_p6: signed(16),
            dig_p7: signed(18),
            dig_p8: signed(20),
            dig_p9: signed(22),
        }
    }
}

/// Fine-temperature intermediate consumed by pressure compensation.
///
/// Only valid together with the raw pressure code from the same sample;
/// feeding pressure compensation a fine temperature held over from an
/// earlier sample is a contract violation, not a tolerated shortcut.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FineTemperature(i32);

/// One compensated sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    pub temperature_c: f32,
    pub pressure_hpa: f32,
}

/// Driver errors, generic over the bus error type.
#[derive(Debug, PartialEq, Eq)]
pub enum Error<E> {
    /// I2C bus error
    I2c(E),
}

impl<E> From<E> for Error<E> {
    fn from(e: E) -> Self {
        Self::I2c(e)
    }
}

/// A BMP280 on the I2C bus `I`.
pub struct Bmp280<I> {
    i2c: I,
    address: u8,
    calibration: CalibrationCoefficients,
}

impl<I> Bmp280<I>
where
    I: I2c,
{
    /// Configure the sensor and pull its factory calibration block.
    ///
    /// Any failure here is fatal for the driver: without the trim values
    /// the raw ADC codes are meaningless.
    pub async fn new(mut i2c: I) -> Result<Self, Error<I::Error>> {
        i2c.write(ADDRESS, &[REG_CTRL_MEAS, CTRL_MEAS]).await?;
        i2c.write(ADDRESS, &[REG_CONFIG, CONFIG]).await?;

        let mut raw = [0u8; 24];
        i2c.write_read(ADDRESS, &[REG_CALIBRATION], &mut raw).await?;

        Ok(Self {
            i2c,
            address: ADDRESS,
            calibration: CalibrationCoefficients::decode(&raw),
        })
    }

    /// Read the raw 20-bit ADC codes as `(temperature, pressure)`.
    pub async fn read_raw(&mut self) -> Result<(i32, i32), Error<I::Error>> {
        let mut data = [0u8; 6];
        self.i2c
            .write_read(self.address, &[REG_DATA], &mut data)
            .await?;
        let adc_p = (data[0] as i32) << 12 | (data[1] as i32) << 4 | (data[2] as i32) >> 4;
        let adc_t = (data[3] as i32) << 12 | (data[4] as i32) << 4 | (data[5] as i32) >> 4;
        Ok((adc_t, adc_p))
    }

    /// Compensate a raw temperature code into °C, also yielding the
    /// fine-temperature state pressure compensation needs.
    pub fn compensate_temperature(&self, adc_t: i32) -> (f32, FineTemperature) {
        let c = &self.calibration;
        let adc_t = adc_t as i64;
        let t1 = c.dig_t1 as i64;

        let var1 = (((adc_t >> 3) - (t1 << 1)) * c.dig_t2 as i64) >> 11;
        let var2 = ((((adc_t >> 4) - t1) * ((adc_t >> 4) - t1) >> 12) * c.dig_t3 as i64) >> 14;
        let t_fine = (var1 + var2) as i32;

        let t = (t_fine as i64 * 5 + 128) >> 8;
        (t as f32 / 100.0, FineTemperature(t_fine))
    }

    /// Compensate a raw pressure code into hPa.
    ///
    /// `t_fine` must come from [`Self::compensate_temperature`] on the
    /// same raw sample. Returns 0.0 as the invalid-reading sentinel when
    /// the trim-derived denominator collapses to zero.
    pub fn compensate_pressure(&self, adc_p: i32, t_fine: FineTemperature) -> f32 {
        let c = &self.calibration;

        let mut var1 = t_fine.0 as i64 - 128_000;
        let mut var2 = var1 * var1 * c.dig_p6 as i64;
        var2 += (var1 * c.dig_p5 as i64) << 17;
        var2 += (c.dig_p4 as i64) << 35;
        var1 = ((var1 * var1 * c.dig_p3 as i64) >> 8) + ((var1 * c.dig_p2 as i64) << 12);
        var1 = (((1i64 << 47) + var1) * c.dig_p1 as i64) >> 33;
        if var1 == 0 {
            return 0.0;
        }

        let mut p = 1_048_576 - adc_p as i64;
        p = ((p << 31) - var2) * 3125 / var1;
        var1 = ((c.dig_p9 as i64) * (p >> 13) * (p >> 13)) >> 25;
        var2 = ((c.dig_p8 as i64) * p) >> 19;
        p = ((p + var1 + var2) >> 8) + ((c.dig_p7 as i64) << 4);

        p as f32 / 25_600.0
    }

    /// One compensated measurement. Temperature is always compensated
    /// before pressure so the fine temperature matches the sample.
    pub async fn measure(&mut self) -> Result<Measurement, Error<I::Error>> {
        let (adc_t, adc_p) = self.read_raw().await?;
        let (temperature_c, t_fine) = self.compensate_temperature(adc_t);
        let pressure_hpa = self.compensate_pressure(adc_p, t_fine);
        Ok(Measurement {
            temperature_c,
            pressure_hpa,
        })
    }
}

impl<I> SensorReader for Bmp280<I>
where
    I: RecoverableI2c,
{
    type Reading = f32;

    async fn read(&mut self) -> Result<f32, SensorError> {
        let measurement = self.measure().await.map_err(|Error::I2c(_)| {
            error!("BMP280: bus transaction failed");
            SensorError::Bus
        })?;
        Ok(measurement.pressure_hpa)
    }

    async fn recover(&mut self) {
        self.i2c.recover().await;
    }
}
