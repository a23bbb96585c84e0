//! Device drivers
//!
//! This module contains the bus transport and device drivers that use the
//! platform abstraction traits.
//!
//! ## Modules
//!
//! - `softwire`: Software-timed two-wire transport over two GPIOs
//! - `aht21`: AHT21 temperature and humidity sensor driver

pub mod aht21;
pub mod softwire;
