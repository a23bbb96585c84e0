//! Core traits for platform-agnostic sensor-node functionality.
//!
//! # Design
//!
//! - Trait definitions are pure and have no platform dependencies
//! - Mock implementations are always available for host testing
//! - Platform implementations (Embassy) live in the root crate

pub mod telemetry;
pub mod time;

pub use telemetry::{RecordingSink, Sample, TelemetrySink};
pub use time::{Clock, MockClock};
