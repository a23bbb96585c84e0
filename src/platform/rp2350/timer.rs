//! RP2350 clock
//!
//! The RP2350 timer is a 64-bit microsecond counter, exposed through the
//! Embassy time driver. Delays busy-wait: bit timing must not yield to the
//! executor mid-byte.

use embassy_time::{block_for, Duration, Instant};

use crate::core::traits::Clock;

/// Blocking clock backed by the Embassy time driver
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbassyClock;

impl Clock for EmbassyClock {
    fn now_us(&self) -> u64 {
        Instant::now().as_micros()
    }

    fn delay_us(&self, us: u32) {
        block_for(Duration::from_micros(us as u64));
    }
}
