//! Open-drain line interface
//!
//! Two-wire buses are wired-AND: a line is either actively pulled low by
//! someone or floats high through a pull-up. Controllers must never drive a
//! line high, so the interface only offers "drive low" and "release".

use crate::platform::Result;

/// Electrical mode of one line, tracked explicitly so protocol code can
/// assert it before every sensitive transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "pico2_w", derive(defmt::Format))]
pub enum LineMode {
    /// Input with pull-up: reads high unless a peer holds the line low
    InputPullUp,
    /// Output driving the line low
    OutputLow,
}

/// One open-drain line of a software-timed bus
///
/// # Safety Invariants
///
/// - Only one owner per pin instance
/// - No concurrent access to the same pin from multiple contexts
/// - Every operation completes in bounded (microsecond-scale) time
pub trait OpenDrainPin {
    /// Switch to output and drive the line low.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Gpio` if the pin cannot be reconfigured.
    fn drive_low(&mut self) -> Result<()>;

    /// Switch to input with pull-up, letting the line float high.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Gpio` if the pin cannot be reconfigured.
    fn release(&mut self) -> Result<()>;

    /// Instantaneous logic level of the line.
    ///
    /// Valid in both modes; in `OutputLow` it reads low.
    fn is_high(&self) -> bool;

    /// Current mode of the pin
    fn mode(&self) -> LineMode;

    fn is_low(&self) -> bool {
        !self.is_high()
    }
}
