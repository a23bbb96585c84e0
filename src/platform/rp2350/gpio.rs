//! RP2350 open-drain line
//!
//! The RP2350 has no per-pin open-drain mode, so open-drain is emulated the
//! usual way: the output latch stays low and only the direction changes.
//! Releasing the line switches to input with the internal pull-up; external
//! pull-ups are still recommended for cable runs.

use embassy_rp::gpio::{Flex, Pin, Pull};
use embassy_rp::Peripheral;

use crate::platform::{
    traits::{LineMode, OpenDrainPin},
    Result,
};

/// RP2350 open-drain line
///
/// Wraps an `embassy_rp` flexible pin to implement the `OpenDrainPin` trait.
pub struct FlexLine<'d> {
    pin: Flex<'d>,
    mode: LineMode,
}

impl<'d> FlexLine<'d> {
    /// Claim a GPIO and leave it released (input, pulled up).
    pub fn new(pin: impl Peripheral<P = impl Pin> + 'd) -> Self {
        let mut pin = Flex::new(pin);
        pin.set_pull(Pull::Up);
        pin.set_low();
        pin.set_as_input();
        Self {
            pin,
            mode: LineMode::InputPullUp,
        }
    }
}

impl OpenDrainPin for FlexLine<'_> {
    fn drive_low(&mut self) -> Result<()> {
        // Latch low before enabling the driver so the line never glitches high.
        self.pin.set_low();
        self.pin.set_as_output();
        self.mode = LineMode::OutputLow;
        Ok(())
    }

    fn release(&mut self) -> Result<()> {
        self.pin.set_as_input();
        self.pin.set_pull(Pull::Up);
        self.mode = LineMode::InputPullUp;
        Ok(())
    }

    fn is_high(&self) -> bool {
        self.pin.is_high()
    }

    fn mode(&self) -> LineMode {
        self.mode
    }
}
