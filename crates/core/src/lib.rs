//! aht_node_core - Pure no_std logic for the multi-bus AHT21 sensor node
//!
//! This crate contains platform-agnostic types and algorithms that can be
//! tested on host without any hardware or embassy dependencies.
//!
//! # Design Principles
//!
//! - **Pure no_std**: No std library dependencies
//! - **Trait abstractions**: Clock and telemetry injected via traits
//! - **Only optional cfg**: `defmt` derives behind the `defmt` feature
//!
//! # Modules
//!
//! - [`traits`]: Clock and telemetry sink abstractions (with mocks)
//! - [`wait`]: Bounded wait primitive shared by every peer-dependent wait
//! - [`sensor`]: AHT21 commands, status flags, frame decoding, plausibility gate
//! - [`bus`]: Bus identity, error taxonomy, health state, failure counters
//! - [`config`]: Explicit node, bus, timing and retry configuration
//! - [`escalation`]: Reference escalation policy over health and counters

#![no_std]

pub mod bus;
pub mod config;
pub mod escalation;
pub mod sensor;
pub mod traits;
pub mod wait;
