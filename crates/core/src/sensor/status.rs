//! Status byte

use bitflags::bitflags;

bitflags! {
    /// Flags of the sensor status byte (first byte of every read)
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct StatusFlags: u8 {
        /// Measurement or calibration in progress
        const BUSY = 0b1000_0000;
        /// Calibration coefficients loaded
        const CALIBRATED = 0b0000_1000;
    }
}

impl StatusFlags {
    /// Interpret a raw status byte, keeping bits this crate does not name.
    pub const fn from_byte(byte: u8) -> Self {
        Self::from_bits_retain(byte)
    }

    pub fn is_busy(self) -> bool {
        self.contains(Self::BUSY)
    }

    pub fn is_calibrated(self) -> bool {
        self.contains(Self::CALIBRATED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_calibrated_status() {
        let status = StatusFlags::from_byte(0x18);
        assert!(!status.is_busy());
        assert!(status.is_calibrated());
        assert_eq!(status.bits(), 0x18);
    }

    #[test]
    fn busy_uncalibrated_status() {
        let status = StatusFlags::from_byte(0x80);
        assert!(status.is_busy());
        assert!(!status.is_calibrated());
    }

    #[test]
    fn failed_read_sentinel_looks_busy() {
        assert!(StatusFlags::from_byte(0xFF).is_busy());
    }
}
