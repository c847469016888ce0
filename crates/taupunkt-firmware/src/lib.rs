//! Board support for the taupunkt monitor.
//!
//! Everything chip-specific lives here: the I2C master with its recovery
//! hook and the RTC watchdog wrapper. The binary in `src/bin/main.rs`
//! wires these into the hardware-independent `taupunkt-core` monitor.

#![no_std]

pub mod bus;
pub mod watchdog;
