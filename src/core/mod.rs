//! Core systems
//!
//! Logging macros live here; platform-agnostic logic is re-exported from
//! `aht_node_core` so firmware code has a single import root.

pub mod logging;

pub use aht_node_core::{bus, config, escalation, sensor, traits, wait};
