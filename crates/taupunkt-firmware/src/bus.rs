//! The ESP32-S3 I2C master with the recovery hook the core layer needs.

use embedded_hal_async::i2c::{ErrorType, I2c as I2cBus, Operation};
use esp_hal::Async;
use esp_hal::i2c::master::{Config, Error, I2c};
use log::warn;
use taupunkt_core::bus::BusRecovery;

/// The physical bus plus the configuration needed to rebuild it.
///
/// Recovery re-applies the stored configuration, which resets the
/// peripheral state machine and re-clocks the bus at its fixed rate —
/// the cure for a sensor left hanging mid-transaction.
pub struct MonitorBus {
    i2c: I2c<'static, Async>,
    config: Config,
}

impl MonitorBus {
    pub fn new(i2c: I2c<'static, Async>, config: Config) -> Self {
        Self { i2c, config }
    }
}

impl ErrorType for MonitorBus {
    type Error = Error;
}

impl I2cBus for MonitorBus {
    async fn read(&mut self, address: u8, read: &mut [u8]) -> Result<(), Error> {
        I2cBus::read(&mut self.i2c, address, read).await
    }

    async fn write(&mut self, address: u8, write: &[u8]) -> Result<(), Error> {
        I2cBus::write(&mut self.i2c, address, write).await
    }

    async fn write_read(
        &mut self,
        address: u8,
        write: &[u8],
        read: &mut [u8],
    ) -> Result<(), Error> {
        I2cBus::write_read(&mut self.i2c, address, write, read).await
    }

    async fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Error> {
        I2cBus::transaction(&mut self.i2c, address, operations).await
    }
}

impl BusRecovery for MonitorBus {
    fn reinit(&mut self) {
        if self.i2c.apply_config(&self.config).is_err() {
            warn!("I2C reconfiguration failed, bus left as-is");
        }
    }
}
