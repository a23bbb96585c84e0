//! Per-bus identity, errors and health bookkeeping

pub mod error;
pub mod health;

use core::fmt;

pub use error::{BusError, ReadError};
pub use health::{BusHealth, BusStatus, FailureCounters};

/// Identifier of one logical two-wire bus (one sensor location).
///
/// Displayed zero-padded (`001`), the way deployments label their sensors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BusId(pub u8);

impl fmt::Display for BusId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03}", self.0)
    }
}
