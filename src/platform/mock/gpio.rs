//! Simulated open-drain pin

use std::cell::RefCell;
use std::rc::Rc;

use crate::platform::{
    Result,
    error::{GpioError, PlatformError},
    traits::{LineMode, OpenDrainPin},
};

use super::bus::{SimLine, SimState};

/// Controller pin wired to a [`SimBus`](super::SimBus)
///
/// Tracks its own drive through the shared bus state so the bus can
/// resolve line levels and protocol events.
#[derive(Debug)]
pub struct SimPin {
    bus: Rc<RefCell<SimState>>,
    line: SimLine,
}

impl SimPin {
    pub(super) fn new(bus: Rc<RefCell<SimState>>, line: SimLine) -> Self {
        Self { bus, line }
    }

    fn set(&mut self, low: bool) -> Result<()> {
        let mut bus = self.bus.borrow_mut();
        if bus.pin_fault() {
            return Err(PlatformError::Gpio(GpioError::HardwareError));
        }
        bus.drive(self.line, low);
        Ok(())
    }
}

impl OpenDrainPin for SimPin {
    fn drive_low(&mut self) -> Result<()> {
        self.set(true)
    }

    fn release(&mut self) -> Result<()> {
        self.set(false)
    }

    fn is_high(&self) -> bool {
        self.bus.borrow_mut().sample(self.line)
    }

    fn mode(&self) -> LineMode {
        if self.bus.borrow().controller_low(self.line) {
            LineMode::OutputLow
        } else {
            LineMode::InputPullUp
        }
    }
}
