//! Framed two-wire transport interface
//!
//! Device drivers talk to this trait rather than to pins, so they can be
//! exercised against a transaction-recording mock and run unchanged on the
//! software-timed transport.

use aht_node_core::bus::BusError;

/// Blocking two-wire transport
///
/// # Safety Invariants
///
/// - Only one owner per bus instance
/// - Address must be 7-bit (valid range: 0x00..=0x7F)
/// - Every call is one complete session: a STOP is emitted even on failure
pub trait I2cInterface {
    /// Write data to a device
    ///
    /// Performs a complete transaction:
    /// START - ADDR(W) - DATA - STOP
    ///
    /// # Errors
    ///
    /// - `BusError::NoAck` if the address or any data byte is not acknowledged
    /// - `BusError::Timeout` if a peer holds the clock beyond the stretch bound
    fn write(&mut self, addr: u8, data: &[u8]) -> Result<(), BusError>;

    /// Read data from a device
    ///
    /// Performs a complete transaction:
    /// START - ADDR(R) - DATA (ACK all but last) - STOP
    ///
    /// # Errors
    ///
    /// - `BusError::NoAck` if the address is not acknowledged
    /// - `BusError::Timeout` if a peer holds the clock beyond the stretch bound
    fn read(&mut self, addr: u8, buffer: &mut [u8]) -> Result<(), BusError>;

    /// Check whether a device acknowledges its write address.
    ///
    /// Performs START - ADDR(W) - STOP with no side effect on the device.
    fn probe(&mut self, addr: u8) -> Result<bool, BusError>;
}

impl<T: I2cInterface + ?Sized> I2cInterface for &mut T {
    fn write(&mut self, addr: u8, data: &[u8]) -> Result<(), BusError> {
        (**self).write(addr, data)
    }

    fn read(&mut self, addr: u8, buffer: &mut [u8]) -> Result<(), BusError> {
        (**self).read(addr, buffer)
    }

    fn probe(&mut self, addr: u8) -> Result<bool, BusError> {
        (**self).probe(addr)
    }
}
