//! Hardware-independent core library for the taupunkt dew-point monitor
//!
//! This crate contains everything about the device that is not tied to a
//! particular chip: the I2C transaction and recovery plumbing, the three
//! sensor protocol drivers, the cached-reading layer, dew point and
//! ventilation-decision math, the dashboard renderer, and the supervisory
//! loop that ties them together.
//!
//! It is generic over the `embedded-hal-async` I2C and delay traits so it
//! compiles both for the ESP32-S3 firmware and for the host, where the
//! protocol and policy logic is exercised against mock buses.

#![cfg_attr(not(test), no_std)]

pub mod bus;
pub mod config;
pub mod decision;
pub mod dewpoint;
pub mod display;
pub mod leds;
pub mod monitor;
pub mod sensors;

#[cfg(test)]
pub(crate) mod testutil;
