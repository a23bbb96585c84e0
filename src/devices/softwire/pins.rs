//! Line primitives of a software-timed bus
//!
//! Owns the data and clock pins of one bus. All higher layers manipulate the
//! lines through this type so the open-drain discipline (never drive high,
//! track the mode explicitly) is enforced in one place.

use crate::core::traits::Clock;
use crate::core::wait::wait_until;
use crate::platform::traits::{LineMode, OpenDrainPin};
use aht_node_core::bus::BusError;

/// One of the two lines of a bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "pico2_w", derive(defmt::Format))]
pub enum Line {
    Data,
    Clock,
}

/// Data and clock pins of one bus
pub struct PinDriver<SDA, SCL> {
    sda: SDA,
    scl: SCL,
}

impl<SDA, SCL> PinDriver<SDA, SCL>
where
    SDA: OpenDrainPin,
    SCL: OpenDrainPin,
{
    /// Take ownership of both pins without touching them.
    pub fn new(sda: SDA, scl: SCL) -> Self {
        Self { sda, scl }
    }

    /// Switch `line` to output and pull it low.
    pub fn drive_low(&mut self, line: Line) -> Result<(), BusError> {
        match line {
            Line::Data => self.sda.drive_low()?,
            Line::Clock => self.scl.drive_low()?,
        }
        Ok(())
    }

    /// Switch `line` to input with pull-up.
    pub fn release(&mut self, line: Line) -> Result<(), BusError> {
        match line {
            Line::Data => self.sda.release()?,
            Line::Clock => self.scl.release()?,
        }
        Ok(())
    }

    /// Instantaneous level of `line`; `true` is high.
    pub fn read_level(&self, line: Line) -> bool {
        match line {
            Line::Data => self.sda.is_high(),
            Line::Clock => self.scl.is_high(),
        }
    }

    pub fn mode(&self, line: Line) -> LineMode {
        match line {
            Line::Data => self.sda.mode(),
            Line::Clock => self.scl.mode(),
        }
    }

    /// Wait for `line` to read high, polling every `poll_us`.
    ///
    /// Returns `false` if it was still low after `timeout_us`.
    pub fn wait_while_low<C: Clock>(
        &self,
        line: Line,
        clock: &C,
        poll_us: u32,
        timeout_us: u32,
    ) -> bool {
        wait_until(clock, poll_us, timeout_us, || self.read_level(line))
    }

    /// Release both lines, data first.
    pub fn release_all(&mut self) -> Result<(), BusError> {
        self.release(Line::Data)?;
        self.release(Line::Clock)
    }

    /// Both lines read high.
    pub fn lines_high(&self) -> bool {
        self.read_level(Line::Data) && self.read_level(Line::Clock)
    }

    /// Give the pins back.
    pub fn into_pins(self) -> (SDA, SCL) {
        (self.sda, self.scl)
    }
}
