//! AHT21 driver implementation
//!
//! Command sequencing and busy polling. Framing, acknowledges and clock
//! stretching belong to the transport underneath.

use crate::core::config::DeviceTiming;
use crate::core::traits::Clock;
use crate::core::wait::try_wait_until;
use crate::platform::traits::I2cInterface;
use crate::{log_debug, log_warn};
use aht_node_core::bus::BusError;
use aht_node_core::sensor::{Command, RawReading, SensorReading, StatusFlags, FRAME_LEN};

fn read_status<I2C: I2cInterface>(i2c: &mut I2C, address: u8) -> Result<StatusFlags, BusError> {
    let mut byte = [0u8; 1];
    i2c.read(address, &mut byte)?;
    Ok(StatusFlags::from_byte(byte[0]))
}

/// AHT21 driver
///
/// # Type Parameters
///
/// * `I2C` - Framed transport (often `&mut SoftWire<..>`)
/// * `C` - Clock used for settle delays and busy polling
pub struct Aht21<I2C, C> {
    i2c: I2C,
    clock: C,
    address: u8,
    timing: DeviceTiming,
}

impl<I2C, C> Aht21<I2C, C>
where
    I2C: I2cInterface,
    C: Clock,
{
    pub fn new(i2c: I2C, clock: C, address: u8, timing: DeviceTiming) -> Self {
        Self {
            i2c,
            clock,
            address,
            timing,
        }
    }

    fn send(&mut self, command: Command) -> Result<(), BusError> {
        self.i2c.write(self.address, command.bytes())
    }

    /// Read the status byte.
    pub fn status(&mut self) -> Result<StatusFlags, BusError> {
        read_status(&mut self.i2c, self.address)
    }

    /// Poll the status byte until the busy flag clears.
    ///
    /// Returns the first non-busy status, or `BusError::Timeout` once the
    /// busy-poll budget is spent.
    pub fn wait_ready(&mut self) -> Result<StatusFlags, BusError> {
        let Self {
            i2c,
            clock,
            address,
            timing,
        } = self;
        let mut last = StatusFlags::empty();
        let ready = try_wait_until(
            &*clock,
            timing.busy_poll_interval_ms.saturating_mul(1000),
            timing.busy_poll_timeout_ms.saturating_mul(1000),
            || -> Result<bool, BusError> {
                last = read_status(i2c, *address)?;
                Ok(!last.is_busy())
            },
        )?;

        if ready {
            Ok(last)
        } else {
            Err(BusError::Timeout)
        }
    }

    pub fn soft_reset(&mut self) -> Result<(), BusError> {
        self.send(Command::SoftReset)?;
        self.clock.delay_ms(self.timing.soft_reset_ms);
        Ok(())
    }

    /// Load calibration coefficients and confirm the calibrated flag.
    ///
    /// # Errors
    ///
    /// `BusError::NotCalibrated` if the sensor stays busy past the poll
    /// budget or reports not calibrated afterwards.
    pub fn calibrate(&mut self) -> Result<(), BusError> {
        self.send(Command::Calibrate)?;
        self.clock.delay_ms(self.timing.calibrate_settle_ms);

        let status = match self.wait_ready() {
            Ok(status) => status,
            Err(BusError::Timeout) => {
                log_warn!("AHT21 calibration did not finish");
                return Err(BusError::NotCalibrated);
            }
            Err(e) => return Err(e),
        };

        if status.is_calibrated() {
            Ok(())
        } else {
            log_warn!("AHT21 not calibrated (status {:#x})", status.bits());
            Err(BusError::NotCalibrated)
        }
    }

    /// Initialize the sensor
    ///
    /// This performs the full initialization sequence:
    /// 1. Power-up settle
    /// 2. Soft reset
    /// 3. Status read (confirms the device answers)
    /// 4. Wait for the reset to finish
    /// 5. Calibrate
    ///
    /// `BusError::NotCalibrated` is advisory: a measurement may still succeed.
    pub fn init(&mut self) -> Result<(), BusError> {
        self.clock.delay_ms(self.timing.power_up_ms);
        self.soft_reset()?;

        #[allow(unused_variables)] // status only feeds log macros
        let status = self.status()?;
        log_debug!("AHT21 status after reset: {:#x}", status.bits());

        // Calibration polls again, so a slow reset is not fatal here
        match self.wait_ready() {
            Ok(_) => {}
            Err(BusError::Timeout) => log_warn!("AHT21 still busy after reset"),
            Err(e) => return Err(e),
        }

        self.calibrate()
    }

    /// Start a conversion.
    pub fn trigger(&mut self) -> Result<(), BusError> {
        self.send(Command::TriggerMeasurement)
    }

    /// Read the full 7-byte frame.
    pub fn read_raw(&mut self) -> Result<RawReading, BusError> {
        let mut frame = [0u8; FRAME_LEN];
        self.i2c.read(self.address, &mut frame)?;
        Ok(RawReading::new(frame))
    }

    /// Trigger a conversion, wait for it and read the frame.
    ///
    /// # Errors
    ///
    /// `BusError::Timeout` if the sensor is still busy after the poll budget;
    /// the frame is not read in that case.
    pub fn measure(&mut self) -> Result<RawReading, BusError> {
        self.trigger()?;
        self.clock.delay_ms(self.timing.measurement_ms);
        self.wait_ready()?;
        self.read_raw()
    }

    /// Measure and decode. No plausibility check is applied here.
    pub fn read(&mut self) -> Result<SensorReading, BusError> {
        Ok(self.measure()?.decode())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::traits::MockClock;
    use crate::platform::mock::{I2cTransaction, MockI2c};
    use aht_node_core::sensor::DEFAULT_ADDRESS;

    fn sensor<'a>(
        i2c: &'a mut MockI2c,
        clock: &'a MockClock,
    ) -> Aht21<&'a mut MockI2c, &'a MockClock> {
        Aht21::new(i2c, clock, DEFAULT_ADDRESS, DeviceTiming::default())
    }

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 0.01
    }

    #[test]
    fn init_resets_then_calibrates() {
        let mut i2c = MockI2c::new();
        let clock = MockClock::new();

        sensor(&mut i2c, &clock).init().unwrap();

        assert_eq!(i2c.written_commands(), vec![0xBA, 0xE1]);
        assert_eq!(
            i2c.transactions()[3],
            I2cTransaction::Write {
                addr: DEFAULT_ADDRESS,
                data: vec![0xE1, 0x08, 0x00]
            }
        );
        assert!(clock.now_ms() >= 70);
    }

    #[test]
    fn init_reports_missing_calibration() {
        let mut i2c = MockI2c::new();
        i2c.set_idle_byte(0x10);
        let clock = MockClock::new();

        assert_eq!(sensor(&mut i2c, &clock).init(), Err(BusError::NotCalibrated));
    }

    #[test]
    fn calibration_stuck_busy_is_bounded() {
        let mut i2c = MockI2c::new();
        i2c.set_idle_byte(0x98);
        let clock = MockClock::new();

        assert_eq!(sensor(&mut i2c, &clock).init(), Err(BusError::NotCalibrated));
        // power-up, reset, two busy budgets, calibrate settle
        assert_eq!(clock.now_ms(), 40 + 20 + 1000 + 10 + 1000);
    }

    #[test]
    fn measure_polls_until_not_busy() {
        let mut i2c = MockI2c::new();
        i2c.queue_read(&[0x98, 0x98, 0x18]);
        i2c.queue_read(&[0x18, 0x5A, 0x3C, 0x91, 0x27, 0xB4, 0x00]);
        let clock = MockClock::new();

        let raw = sensor(&mut i2c, &clock).measure().unwrap();

        assert_eq!(raw.as_bytes(), &[0x18, 0x5A, 0x3C, 0x91, 0x27, 0xB4, 0x00]);
        assert_eq!(clock.now_ms(), 80 + 2 * 10);
        let reads = i2c
            .transactions()
            .iter()
            .filter(|t| matches!(t, I2cTransaction::Read { len: 1, .. }))
            .count();
        assert_eq!(reads, 3);
    }

    #[test]
    fn measure_times_out_without_reading_frame() {
        let mut i2c = MockI2c::new();
        i2c.set_idle_byte(0x98);
        let clock = MockClock::new();

        assert_eq!(sensor(&mut i2c, &clock).measure(), Err(BusError::Timeout));
        assert!(!i2c
            .transactions()
            .iter()
            .any(|t| matches!(t, I2cTransaction::Read { len: 7, .. })));
    }

    #[test]
    fn read_decodes_frame() {
        let mut i2c = MockI2c::new();
        i2c.queue_read(&[0x18]);
        i2c.queue_read(&[0x18, 0x5A, 0x3C, 0x91, 0x27, 0xB4, 0x00]);
        let clock = MockClock::new();

        let reading = sensor(&mut i2c, &clock).read().unwrap();

        assert!(close(reading.humidity_pct, 35.249));
        assert!(close(reading.temperature_c, -35.561));
    }

    #[test]
    fn transport_errors_propagate() {
        let mut i2c = MockI2c::new();
        i2c.fail_next(BusError::NoAck);
        let clock = MockClock::new();

        assert_eq!(sensor(&mut i2c, &clock).read(), Err(BusError::NoAck));
        assert_eq!(clock.now_ms(), 0);
    }
}
