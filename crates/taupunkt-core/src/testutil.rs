//! Shared test doubles for the host-side test suite.

use core::cell::Cell;
use std::rc::Rc;

use embedded_hal_async::i2c::{ErrorType, I2c, Operation};
use embedded_hal_mock::eh1::i2c::Mock as I2cMock;

use crate::bus::{BusRecovery, RecoverableI2c};

/// An I2C mock that also counts bus recoveries, so driver tests can assert
/// the recovery path without a real peripheral to reinitialize.
pub(crate) struct RecoveringBus {
    pub(crate) inner: I2cMock,
    recoveries: Rc<Cell<usize>>,
}

impl RecoveringBus {
    pub(crate) fn new(inner: I2cMock) -> Self {
        Self {
            inner,
            recoveries: Rc::new(Cell::new(0)),
        }
    }

    /// Handle onto the recovery counter, usable after the bus has been
    /// moved into a driver.
    pub(crate) fn recoveries(&self) -> Rc<Cell<usize>> {
        Rc::clone(&self.recoveries)
    }
}

impl ErrorType for RecoveringBus {
    type Error = embedded_hal::i2c::ErrorKind;
}

impl I2c for RecoveringBus {
    async fn read(&mut self, address: u8, read: &mut [u8]) -> Result<(), Self::Error> {
        self.inner.read(address, read).await
    }

    async fn write(&mut self, address: u8, write: &[u8]) -> Result<(), Self::Error> {
        self.inner.write(address, write).await
    }

    async fn write_read(
        &mut self,
        address: u8,
        write: &[u8],
        read: &mut [u8],
    ) -> Result<(), Self::Error> {
        self.inner.write_read(address, write, read).await
    }

    async fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        self.inner.transaction(address, operations).await
    }
}

impl BusRecovery for RecoveringBus {
    fn reinit(&mut self) {
        self.recoveries.set(self.recoveries.get() + 1);
    }
}

impl RecoverableI2c for RecoveringBus {
    async fn recover(&mut self) {
        self.reinit();
    }
}

/// A GPIO stand-in that records its level.
#[derive(Clone)]
pub(crate) struct TestPin {
    state: Rc<Cell<bool>>,
}

impl TestPin {
    pub(crate) fn new() -> Self {
        Self {
            state: Rc::new(Cell::new(false)),
        }
    }

    pub(crate) fn is_high(&self) -> bool {
        self.state.get()
    }
}

impl embedded_hal::digital::ErrorType for TestPin {
    type Error = core::convert::Infallible;
}

impl embedded_hal::digital::OutputPin for TestPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.state.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.state.set(true);
        Ok(())
    }
}
