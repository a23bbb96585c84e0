//! Subsystems
//!
//! Bus-level behaviour built on the transport and the AHT21 driver.
//!
//! ## Modules
//!
//! - `handle`: Per-bus state (transport, health, counters)
//! - `recovery`: Clock-pulse recovery of a stuck bus
//! - `orchestrator`: Bounded retry of one sensor read with recovery between attempts
//! - `report`: Health summary across all buses
//! - `sampler`: Sampling cycle over every configured bus

pub mod handle;
pub mod orchestrator;
pub mod recovery;
pub mod report;
pub mod sampler;

pub use handle::BusHandle;
pub use orchestrator::ReadOrchestrator;
pub use recovery::{recover, RecoveryOutcome};
pub use report::{BusSummary, HealthReport};
pub use sampler::{CycleReport, Sampler};
