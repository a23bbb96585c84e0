//! Platform error types
//!
//! This module defines error types for platform operations.

use core::fmt;

use aht_node_core::bus::BusError;

/// Result type for platform operations
pub type Result<T> = core::result::Result<T, PlatformError>;

/// Platform-level errors
///
/// All platform implementations map their HAL-specific errors to these variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "pico2_w", derive(defmt::Format))]
pub enum PlatformError {
    /// GPIO operation failed
    Gpio(GpioError),
}

/// GPIO-specific errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "pico2_w", derive(defmt::Format))]
pub enum GpioError {
    /// Invalid mode for operation
    InvalidMode,
    /// Hardware reported a fault
    HardwareError,
}

impl fmt::Display for PlatformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlatformError::Gpio(e) => write!(f, "GPIO error: {:?}", e),
        }
    }
}

impl From<PlatformError> for BusError {
    fn from(_: PlatformError) -> Self {
        BusError::Pin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_subsystem() {
        let error = PlatformError::Gpio(GpioError::InvalidMode);
        assert_eq!(format!("{}", error), "GPIO error: InvalidMode");
    }

    #[test]
    fn pin_faults_become_bus_errors() {
        let error: BusError = PlatformError::Gpio(GpioError::HardwareError).into();
        assert_eq!(error, BusError::Pin);
    }
}
