//! Shared-bus plumbing and the raw transaction shape the sensor protocols
//! are built from.
//!
//! All three sensors sit on one I2C bus. The bus is wrapped in an Embassy
//! async mutex so every driver holds its own [`SharedI2c`] handle while a
//! transaction in flight is never interleaved with another — the protocols'
//! settle delays and busy polling are not re-entrant.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::{ErrorType, I2c, Operation};

/// Reinitialization hook for a wedged bus.
///
/// A stuck SDA/SCL line or a sensor hung mid-transaction leaves every
/// subsequent transaction failing with a NACK or timeout. Dropping and
/// re-applying the peripheral configuration (at the fixed 100 kHz rate)
/// is the way out short of a power cycle. The platform bus wrapper in the
/// firmware crate implements this; test doubles just count the calls.
pub trait BusRecovery {
    fn reinit(&mut self);
}

/// Bus access with a recovery escape hatch.
///
/// Sensor drivers require this in their [`SensorReader`] impls so the
/// cached-reading layer can trigger recovery after a failed read without
/// knowing anything about the platform.
///
/// [`SensorReader`]: crate::sensors::SensorReader
pub trait RecoverableI2c: I2c {
    fn recover(&mut self) -> impl Future<Output = ()>;
}

/// Bus-sharing device handle, one per driver.
///
/// Locks the shared bus for the duration of a single I2C operation. With
/// the single supervisory task this serialization is already guaranteed,
/// but the mutex keeps the exclusivity invariant if tasks are ever added.
pub struct SharedI2c<'a, T> {
    bus: &'a Mutex<CriticalSectionRawMutex, T>,
}

impl<'a, T> SharedI2c<'a, T> {
    #[inline]
    pub const fn new(bus: &'a Mutex<CriticalSectionRawMutex, T>) -> Self {
        Self { bus }
    }
}

impl<T> ErrorType for SharedI2c<'_, T>
where
    T: ErrorType,
{
    type Error = T::Error;
}

impl<T> I2c for SharedI2c<'_, T>
where
    T: I2c,
{
    #[inline]
    async fn read(&mut self, address: u8, read: &mut [u8]) -> Result<(), Self::Error> {
        let mut bus = self.bus.lock().await;
        bus.read(address, read).await
    }

    #[inline]
    async fn write(&mut self, address: u8, write: &[u8]) -> Result<(), Self::Error> {
        let mut bus = self.bus.lock().await;
        bus.write(address, write).await
    }

    #[inline]
    async fn write_read(
        &mut self,
        address: u8,
        write: &[u8],
        read: &mut [u8],
    ) -> Result<(), Self::Error> {
        let mut bus = self.bus.lock().await;
        bus.write_read(address, write, read).await
    }

    #[inline]
    async fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        let mut bus = self.bus.lock().await;
        bus.transaction(address, operations).await
    }
}

impl<T> RecoverableI2c for SharedI2c<'_, T>
where
    T: I2c + BusRecovery,
{
    async fn recover(&mut self) {
        let mut bus = self.bus.lock().await;
        bus.reinit();
    }
}

/// Write `command`, give the device `settle_ms` to convert, then read the
/// complete response into `response`.
///
/// The delay is not optional: these sensors NACK reads that arrive before
/// conversion finishes. Bus failures surface as `Err` for the caller to
/// map into its own retry or giving-up policy.
pub async fn command_response<I, D>(
    i2c: &mut I,
    delay: &mut D,
    address: u8,
    command: &[u8],
    settle_ms: u32,
    response: &mut [u8],
) -> Result<(), I::Error>
where
    I: I2c,
    D: DelayNs,
{
    i2c.write(address, command).await?;
    delay.delay_ms(settle_ms).await;
    i2c.read(address, response).await
}
