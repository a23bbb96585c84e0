//! Software-timed two-wire bus
//!
//! A bit-banged controller for two open-drain GPIO lines. Any pair of pins
//! can carry a bus, so one node drives as many independent sensor buses as
//! it has spare GPIOs.
//!
//! - [`PinDriver`]: line primitives (drive low, release, read, bounded wait)
//! - [`SoftWire`]: START/STOP, byte transfer with ACK, framed transactions

pub mod pins;
pub mod transport;

pub use pins::{Line, PinDriver};
pub use transport::{SessionState, SoftWire, MAX_SCAN_RESULTS};
