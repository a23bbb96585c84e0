//! Mock platform implementation for testing
//!
//! This module provides mock implementations of platform traits that can be used
//! for unit testing without requiring actual hardware.
//!
//! - [`MockI2c`] records framed transactions for driver-level tests.
//! - [`SimBus`] simulates the two electrical lines of a bus, including an
//!   AHT21 peer and injectable line faults, for transport and recovery tests.
//!
//! # Feature Gate
//!
//! This module is available in two contexts:
//! - During test builds (`#[cfg(test)]`)
//! - When the `mock` feature is enabled
//!
//! # Example
//!
//! ```
//! use aht_node::platform::mock::{PeerConfig, SimBus};
//! use aht_node::platform::traits::OpenDrainPin;
//!
//! let bus = SimBus::new(PeerConfig::default());
//! let (mut data, _clock) = bus.pins();
//! data.drive_low().unwrap();
//! assert!(!bus.data_level());
//! ```

#![cfg(any(test, feature = "mock"))]

mod bus;
mod gpio;
mod i2c;

pub use bus::{BusEvent, DataFault, PeerConfig, SimBus};
pub use gpio::SimPin;
pub use i2c::{I2cTransaction, MockI2c};
