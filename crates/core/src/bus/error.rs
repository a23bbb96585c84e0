//! Bus and read error types

use core::fmt;

/// Errors raised by the transport, the device driver and the plausibility gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusError {
    /// Address or data byte not acknowledged; the session was closed
    NoAck,
    /// Clock-stretch release or busy poll exceeded its bound
    Timeout,
    /// Decoded value outside the physical plausibility bounds
    OutOfRange,
    /// Recovery could not bring both lines back high
    BusLocked,
    /// Calibration did not complete; measurement may still be attempted
    NotCalibrated,
    /// Start requested while a session is already open
    SessionActive,
    /// Pin backend refused an operation
    Pin,
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusError::NoAck => write!(f, "no acknowledge from device"),
            BusError::Timeout => write!(f, "bus operation timed out"),
            BusError::OutOfRange => write!(f, "reading outside plausible range"),
            BusError::BusLocked => write!(f, "bus locked"),
            BusError::NotCalibrated => write!(f, "sensor not calibrated"),
            BusError::SessionActive => write!(f, "session already open"),
            BusError::Pin => write!(f, "pin backend fault"),
        }
    }
}

/// Terminal outcome of a failed orchestrated read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReadError {
    /// Every attempt failed
    Exhausted {
        /// Attempts made
        attempts: u8,
        /// Error of the final attempt
        last: BusError,
    },
    /// Bus could not be returned to idle; needs supervisory intervention
    BusLocked,
}

impl fmt::Display for ReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadError::Exhausted { attempts, last } => {
                write!(f, "read failed after {} attempts: {}", attempts, last)
            }
            ReadError::BusLocked => write!(f, "bus locked, recovery failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;
    use std::format;

    use super::*;

    #[test]
    fn read_error_display() {
        let error = ReadError::Exhausted {
            attempts: 3,
            last: BusError::NoAck,
        };
        assert_eq!(
            format!("{}", error),
            "read failed after 3 attempts: no acknowledge from device"
        );
        assert_eq!(
            format!("{}", ReadError::BusLocked),
            "bus locked, recovery failed"
        );
    }
}
