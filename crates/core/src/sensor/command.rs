//! AHT21 command set
//!
//! | Command     | Bytes              | Settle                         |
//! |-------------|--------------------|--------------------------------|
//! | SoftReset   | `BA`               | 20 ms                          |
//! | Calibrate   | `E1 08 00`         | 10 ms, then busy poll          |
//! | Trigger     | `AC 33 00`         | 80 ms conversion, then busy poll |
//!
//! Status is not a command on this chip: any read returns the status byte
//! first.

/// Factory 7-bit address of the AHT10/20/21 family.
pub const DEFAULT_ADDRESS: u8 = 0x38;

/// Commands understood by the sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    SoftReset,
    Calibrate,
    TriggerMeasurement,
}

impl Command {
    const SOFT_RESET: [u8; 1] = [0xBA];
    const CALIBRATE: [u8; 3] = [0xE1, 0x08, 0x00];
    const TRIGGER: [u8; 3] = [0xAC, 0x33, 0x00];

    /// Wire encoding of the command, opcode first.
    pub const fn bytes(self) -> &'static [u8] {
        match self {
            Command::SoftReset => &Self::SOFT_RESET,
            Command::Calibrate => &Self::CALIBRATE,
            Command::TriggerMeasurement => &Self::TRIGGER,
        }
    }

    /// Map an opcode back to its command.
    pub const fn from_opcode(opcode: u8) -> Option<Self> {
        match opcode {
            0xBA => Some(Command::SoftReset),
            0xE1 => Some(Command::Calibrate),
            0xAC => Some(Command::TriggerMeasurement),
            _ => None,
        }
    }
}
