//! Mock framed transport for testing

use aht_node_core::bus::BusError;
use std::collections::VecDeque;
use std::vec::Vec;

use crate::platform::traits::I2cInterface;

/// Transaction type for logging
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum I2cTransaction {
    /// Write transaction
    Write { addr: u8, data: Vec<u8> },
    /// Read transaction
    Read { addr: u8, len: usize },
    /// Presence check
    Probe { addr: u8 },
}

/// Mock two-wire transport
///
/// Records all transactions for test verification and allows
/// pre-programming read data and failures.
#[derive(Debug)]
pub struct MockI2c {
    transactions: Vec<I2cTransaction>,
    read_data: VecDeque<u8>,
    idle_byte: u8,
    absent: Vec<u8>,
    failures: VecDeque<BusError>,
}

impl Default for MockI2c {
    fn default() -> Self {
        Self::new()
    }
}

impl MockI2c {
    /// Create a new mock transport
    ///
    /// Reads beyond the programmed data return `0x18` (calibrated, not busy).
    pub fn new() -> Self {
        Self {
            transactions: Vec::new(),
            read_data: VecDeque::new(),
            idle_byte: 0x18,
            absent: Vec::new(),
            failures: VecDeque::new(),
        }
    }

    /// Get transaction log (for test verification)
    pub fn transactions(&self) -> &[I2cTransaction] {
        &self.transactions
    }

    /// Append data to return for read operations
    pub fn queue_read(&mut self, data: &[u8]) {
        self.read_data.extend(data.iter().copied());
    }

    /// Byte returned once the programmed read data is exhausted
    pub fn set_idle_byte(&mut self, byte: u8) {
        self.idle_byte = byte;
    }

    /// Make `addr` answer every transaction with `NoAck`
    pub fn remove_device(&mut self, addr: u8) {
        self.absent.push(addr);
    }

    /// Fail the next transaction with `error`
    pub fn fail_next(&mut self, error: BusError) {
        self.failures.push_back(error);
    }

    /// Opcodes of every write, in order
    pub fn written_commands(&self) -> Vec<u8> {
        self.transactions
            .iter()
            .filter_map(|t| match t {
                I2cTransaction::Write { data, .. } => data.first().copied(),
                _ => None,
            })
            .collect()
    }

    fn check(&mut self, addr: u8) -> Result<(), BusError> {
        if let Some(error) = self.failures.pop_front() {
            return Err(error);
        }
        if self.absent.contains(&addr) {
            return Err(BusError::NoAck);
        }
        Ok(())
    }
}

impl I2cInterface for MockI2c {
    fn write(&mut self, addr: u8, data: &[u8]) -> Result<(), BusError> {
        self.transactions.push(I2cTransaction::Write {
            addr,
            data: data.to_vec(),
        });
        self.check(addr)
    }

    fn read(&mut self, addr: u8, buffer: &mut [u8]) -> Result<(), BusError> {
        self.transactions.push(I2cTransaction::Read {
            addr,
            len: buffer.len(),
        });
        self.check(addr)?;

        for slot in buffer.iter_mut() {
            *slot = self.read_data.pop_front().unwrap_or(self.idle_byte);
        }
        Ok(())
    }

    fn probe(&mut self, addr: u8) -> Result<bool, BusError> {
        self.transactions.push(I2cTransaction::Probe { addr });
        match self.check(addr) {
            Ok(()) => Ok(true),
            Err(BusError::NoAck) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_i2c_write() {
        let mut i2c = MockI2c::new();
        i2c.write(0x38, &[0xAC, 0x33, 0x00]).unwrap();

        assert_eq!(
            i2c.transactions(),
            &[I2cTransaction::Write {
                addr: 0x38,
                data: vec![0xAC, 0x33, 0x00]
            }]
        );
        assert_eq!(i2c.written_commands(), vec![0xAC]);
    }

    #[test]
    fn test_mock_i2c_read_falls_back_to_idle_byte() {
        let mut i2c = MockI2c::new();
        i2c.queue_read(&[0xAA, 0xBB]);

        let mut buffer = [0u8; 3];
        i2c.read(0x38, &mut buffer).unwrap();

        assert_eq!(buffer, [0xAA, 0xBB, 0x18]);
        assert_eq!(i2c.transactions(), &[I2cTransaction::Read { addr: 0x38, len: 3 }]);
    }

    #[test]
    fn test_mock_i2c_absent_device() {
        let mut i2c = MockI2c::new();
        i2c.remove_device(0x38);

        assert_eq!(i2c.probe(0x38), Ok(false));
        assert_eq!(i2c.write(0x38, &[0xBA]), Err(BusError::NoAck));
        assert_eq!(i2c.probe(0x39), Ok(true));
    }

    #[test]
    fn test_mock_i2c_injected_failure_is_one_shot() {
        let mut i2c = MockI2c::new();
        i2c.fail_next(BusError::Timeout);

        let mut buffer = [0u8; 1];
        assert_eq!(i2c.read(0x38, &mut buffer), Err(BusError::Timeout));
        assert_eq!(i2c.read(0x38, &mut buffer), Ok(()));
    }
}
