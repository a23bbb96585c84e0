#![cfg_attr(not(any(test, feature = "mock")), no_std)]

//! aht_node - Multi-bus AHT21 sensor node for Raspberry Pi Pico 2 W
//!
//! This library provides a software-timed two-wire transport over plain GPIOs,
//! an AHT21 driver, bus recovery and bounded read orchestration, so one node
//! can serve several sensors on independent (and possibly long) cables.

// Platform abstraction layer: open-drain lines, framed transport seam
pub mod platform;

// Transport and device drivers using platform abstraction
pub mod devices;

// Core systems: logging, plus the pure logic re-exported from aht_node_core
pub mod core;

// Recovery, read orchestration, sampling cycle
pub mod subsystems;
