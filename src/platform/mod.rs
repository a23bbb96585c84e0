//! Platform abstraction layer
//!
//! This module provides hardware abstraction for the pins and framed
//! transports the sensor stack runs on. All platform-specific code is
//! isolated here.

pub mod error;
pub mod traits;

// Platform implementations (feature-gated)
#[cfg(feature = "pico2_w")]
pub mod rp2350;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export commonly used types
pub use error::{GpioError, PlatformError, Result};
pub use traits::{I2cInterface, LineMode, OpenDrainPin};
