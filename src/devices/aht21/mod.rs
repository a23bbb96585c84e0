//! AHT21 temperature and humidity sensor
//!
//! ## Features
//!
//! - Fixed 7-bit address 0x38
//! - 20-bit humidity and 20-bit temperature per measurement
//! - Status byte first on every read (busy, calibrated)
//! - Works over any [`I2cInterface`](crate::platform::traits::I2cInterface),
//!   in particular the software-timed transport
//!
//! ## Usage
//!
//! ```ignore
//! use aht_node::devices::aht21::Aht21;
//!
//! let mut sensor = Aht21::new(&mut wire, clock, 0x38, DeviceTiming::default());
//! sensor.init()?;
//! let reading = sensor.read()?;
//! ```

mod driver;

pub use driver::Aht21;
