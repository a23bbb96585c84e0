//! AHT21 sensor protocol types
//!
//! Commands, the status byte, and decoding of the 7-byte measurement frame.
//! Nothing here touches a bus; the driver in the root crate moves these
//! bytes over the wire.

pub mod command;
pub mod reading;
pub mod status;

pub use command::{Command, DEFAULT_ADDRESS};
pub use reading::{
    RawReading, SensorReading, FRAME_LEN, MAX_HUMIDITY_PCT, MAX_TEMPERATURE_C, MIN_HUMIDITY_PCT,
    MIN_TEMPERATURE_C,
};
pub use status::StatusFlags;
