//! Platform abstraction traits
//!
//! This module defines the traits that platform implementations must provide.

pub mod gpio;
pub mod i2c;

// Re-export trait interfaces
pub use gpio::{LineMode, OpenDrainPin};
pub use i2c::I2cInterface;
