//! SHT41 temperature/humidity driver (single-shot, CRC-protected protocol).
//!
//! Every measurement is one command/response transaction: a single command
//! byte selects the repeatability, the sensor converts during a fixed
//! settle delay, and six bytes come back — two big-endian words each
//! followed by its own CRC-8. A failed checksum rejects the whole sample;
//! no half-validated values ever leave this module.

use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;
use log::error;

use super::crc::crc8;
use super::{Climate, SensorError, SensorReader};
use crate::bus::{RecoverableI2c, command_response};

/// SHT41 I2C address.
pub const ADDRESS: u8 = 0x44;

/// Soft-reset command byte.
const CMD_RESET: u8 = 0x94;
/// Serial-number read command byte.
const CMD_SERIAL: u8 = 0x89;

/// Settle time after a measurement command. The high-repeatability
/// conversion needs just over 8 ms; 10 ms covers all three commands.
const MEASURE_DELAY_MS: u32 = 10;

/// Repeatability of a single-shot measurement, one command byte each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    High,
    Medium,
    Low,
}

impl Precision {
    const fn command(self) -> u8 {
        match self {
            Self::High => 0xFD,
            Self::Medium => 0xF6,
            Self::Low => 0xE0,
        }
    }
}

/// Driver errors, generic over the bus error type.
#[derive(Debug, PartialEq, Eq)]
pub enum Error<E> {
    /// I2C bus error
    I2c(E),
    /// One of the response words failed its CRC check
    Checksum,
}

impl<E> From<E> for Error<E> {
    fn from(e: E) -> Self {
        Self::I2c(e)
    }
}

/// An SHT41 on the I2C bus `I`, pacing its transactions with `D`.
pub struct Sht41<I, D> {
    i2c: I,
    delay: D,
    address: u8,
}

impl<I, D> Sht41<I, D>
where
    I: I2c,
    D: DelayNs,
{
    pub fn new(i2c: I, delay: D) -> Self {
        Self {
            i2c,
            delay,
            address: ADDRESS,
        }
    }

    /// Take one single-shot measurement.
    ///
    /// Humidity is reported unclamped and can leave [0, 100] slightly near
    /// saturation; callers that care must tolerate that.
    pub async fn measure(&mut self, precision: Precision) -> Result<Climate, Error<I::Error>> {
        let block = self.checked_read(precision.command()).await?;
        let raw_t = u16::from_be_bytes([block[0], block[1]]) as f32;
        let raw_h = u16::from_be_bytes([block[3], block[4]]) as f32;
        Ok(Climate {
            temperature_c: -45.0 + 175.0 * raw_t / 65535.0,
            humidity_pct: 100.0 * raw_h / 65535.0,
        })
    }

    /// Soft-reset the sensor.
    pub async fn reset(&mut self) -> Result<(), Error<I::Error>> {
        self.i2c.write(self.address, &[CMD_RESET]).await?;
        self.delay.delay_ms(MEASURE_DELAY_MS).await;
        Ok(())
    }

    /// Read the factory serial number.
    pub async fn serial_number(&mut self) -> Result<u32, Error<I::Error>> {
        let block = self.checked_read(CMD_SERIAL).await?;
        Ok(u32::from_be_bytes([block[0], block[1], block[3], block[4]]))
    }

    /// One command/response transaction with CRC validation of both words.
    async fn checked_read(&mut self, command: u8) -> Result<[u8; 6], Error<I::Error>> {
        let mut block = [0u8; 6];
        command_response(
            &mut self.i2c,
            &mut self.delay,
            self.address,
            &[command],
            MEASURE_DELAY_MS,
            &mut block,
        )
        .await?;
        if crc8(&block[0..2]) != block[2] || crc8(&block[3..5]) != block[5] {
            return Err(Error::Checksum);
        }
        Ok(block)
    }
}

impl<I, D> SensorReader for Sht41<I, D>
where
    I: RecoverableI2c,
    D: DelayNs,
{
    type Reading = Climate;

    async fn read(&mut self) -> Result<Climate, SensorError> {
        self.measure(Precision::High).await.map_err(|e| match e {
            Error::Checksum => {
                error!("SHT41: checksum mismatch in measurement response");
                SensorError::Checksum
            }
            Error::I2c(_) => {
                error!("SHT41: bus transaction failed");
                SensorError::Bus
            }
        })
    }

    async fn recover(&mut self) {
        self.i2c.recover().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::RecoveringBus;
    use embassy_futures::block_on;
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTransaction};

    /// Raw temperature 0x6666 (25.0 °C) and humidity 0x8000 (50.0 %),
    /// each followed by its checksum.
    fn measurement_frame() -> Vec<u8> {
        let mut frame = vec![0x66, 0x66, 0, 0x80, 0x00, 0];
        frame[2] = crc8(&frame[0..2]);
        frame[5] = crc8(&frame[3..5]);
        frame
    }

    #[test]
    fn measure_decodes_a_valid_frame() {
        let expectations = [
            I2cTransaction::write(ADDRESS, vec![0xFD]),
            I2cTransaction::read(ADDRESS, measurement_frame()),
        ];
        let mut i2c = I2cMock::new(&expectations);

        let mut sht = Sht41::new(i2c.clone(), NoopDelay::new());
        let climate = block_on(sht.measure(Precision::High)).unwrap();
        assert!((climate.temperature_c - 25.0).abs() < 0.01);
        assert!((climate.humidity_pct - 50.0).abs() < 0.01);

        i2c.done();
    }

    #[test]
    fn precision_selects_the_command_byte() {
        let expectations = [
            I2cTransaction::write(ADDRESS, vec![0xE0]),
            I2cTransaction::read(ADDRESS, measurement_frame()),
        ];
        let mut i2c = I2cMock::new(&expectations);

        let mut sht = Sht41::new(i2c.clone(), NoopDelay::new());
        block_on(sht.measure(Precision::Low)).unwrap();

        i2c.done();
    }

    #[test]
    fn corrupted_temperature_word_is_rejected() {
        let mut frame = measurement_frame();
        frame[1] ^= 0x01;
        let expectations = [
            I2cTransaction::write(ADDRESS, vec![0xFD]),
            I2cTransaction::read(ADDRESS, frame),
        ];
        let mut i2c = I2cMock::new(&expectations);

        let mut sht = Sht41::new(i2c.clone(), NoopDelay::new());
        assert_eq!(
            block_on(sht.measure(Precision::High)),
            Err(Error::Checksum)
        );

        i2c.done();
    }

    #[test]
    fn corrupted_humidity_crc_is_rejected() {
        let mut frame = measurement_frame();
        frame[5] ^= 0x80;
        let expectations = [
            I2cTransaction::write(ADDRESS, vec![0xFD]),
            I2cTransaction::read(ADDRESS, frame),
        ];
        let mut i2c = I2cMock::new(&expectations);

        let mut sht = Sht41::new(i2c.clone(), NoopDelay::new());
        assert_eq!(
            block_on(sht.measure(Precision::High)),
            Err(Error::Checksum)
        );

        i2c.done();
    }

    #[test]
    fn reset_sends_the_single_command_byte() {
        let expectations = [I2cTransaction::write(ADDRESS, vec![CMD_RESET])];
        let mut i2c = I2cMock::new(&expectations);

        let mut sht = Sht41::new(i2c.clone(), NoopDelay::new());
        block_on(sht.reset()).unwrap();

        i2c.done();
    }

    #[test]
    fn serial_number_is_crc_checked() {
        let mut frame = vec![0x0F, 0xBA, 0, 0x7C, 0x32, 0];
        frame[2] = crc8(&frame[0..2]);
        frame[5] = crc8(&frame[3..5]);
        let expectations = [
            I2cTransaction::write(ADDRESS, vec![CMD_SERIAL]),
            I2cTransaction::read(ADDRESS, frame),
        ];
        let mut i2c = I2cMock::new(&expectations);

        let mut sht = Sht41::new(i2c.clone(), NoopDelay::new());
        assert_eq!(block_on(sht.serial_number()).unwrap(), 0x0FBA_7C32);

        i2c.done();
    }

    #[test]
    fn reader_maps_checksum_and_bus_failures() {
        let mut frame = measurement_frame();
        frame[0] ^= 0x10;
        let expectations = [
            I2cTransaction::write(ADDRESS, vec![0xFD]),
            I2cTransaction::read(ADDRESS, frame),
            I2cTransaction::write(ADDRESS, vec![0xFD])
                .with_error(embedded_hal::i2c::ErrorKind::Other),
        ];
        let mock = I2cMock::new(&expectations);
        let bus = RecoveringBus::new(mock.clone());

        let mut sht = Sht41::new(bus, NoopDelay::new());
        assert_eq!(block_on(sht.read()), Err(SensorError::Checksum));
        assert_eq!(block_on(sht.read()), Err(SensorError::Bus));

        mock.clone().done();
    }
}
