//! RP2350 platform implementation for Raspberry Pi Pico 2 W
//!
//! Provides open-drain lines on plain GPIOs (via `embassy_rp::gpio::Flex`)
//! and a blocking clock backed by the Embassy time driver. Together they
//! let any pair of GPIOs carry a software-timed bus.
//!
//! # Feature Gate
//!
//! This module is only available when the `pico2_w` feature is enabled:
//!
//! ```toml
//! [dependencies]
//! aht_node = { version = "0.1", features = ["pico2_w"] }
//! ```
//!
//! # Example
//!
//! ```no_run
//! use aht_node::platform::rp2350::{EmbassyClock, FlexLine};
//!
//! let p = embassy_rp::init(Default::default());
//! let sda = FlexLine::new(p.PIN_16);
//! let scl = FlexLine::new(p.PIN_4);
//! let clock = EmbassyClock;
//! ```

mod gpio;
mod timer;

pub use gpio::FlexLine;
pub use timer::EmbassyClock;
