//! Bit-timed transport
//!
//! Drives the two-wire protocol over a [`PinDriver`]: START and STOP
//! conditions, MSB-first byte transfer with the ninth-clock acknowledge, and
//! framed write/read/probe transactions on top of them.
//!
//! # Timing
//!
//! Every line transition is followed by one half period of settle time
//! (5 µs by default, roughly 100 kHz). After a fallback teardown the
//! transport runs at the reduced half period for the rest of its life.
//! Whenever the clock is released the transport waits for it to actually
//! read high, so peers may stretch the clock up to
//! `TimingConfig::clock_stretch_timeout_us`.
//!
//! # Sessions
//!
//! A session is bracketed by START and STOP. The framed operations always
//! emit the STOP, even when a byte inside the session fails, so a failed
//! transaction never leaves a peer mid-frame.

use heapless::Vec;

use super::pins::{Line, PinDriver};
use crate::core::config::TimingConfig;
use crate::core::traits::Clock;
use crate::platform::traits::{I2cInterface, LineMode, OpenDrainPin};
use crate::{log_debug, log_info, log_trace, log_warn};
use aht_node_core::bus::BusError;

/// Most addresses a scan reports
pub const MAX_SCAN_RESULTS: usize = 16;

/// Session state of the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "pico2_w", derive(defmt::Format))]
pub enum SessionState {
    /// Both lines released, no session open
    Idle,
    /// START issued, clock held low by the controller
    Started,
}

/// Software-timed two-wire controller for one bus
pub struct SoftWire<SDA, SCL, C> {
    pins: PinDriver<SDA, SCL>,
    clock: C,
    timing: TimingConfig,
    half_period_us: u32,
    session: SessionState,
}

fn address_byte(addr: u8, read: bool) -> u8 {
    (addr << 1) | read as u8
}

impl<SDA, SCL, C> SoftWire<SDA, SCL, C>
where
    SDA: OpenDrainPin,
    SCL: OpenDrainPin,
    C: Clock,
{
    /// Create a transport over two pins. The pins are not touched until the
    /// first operation.
    pub fn new(sda: SDA, scl: SCL, clock: C, timing: TimingConfig) -> Self {
        Self {
            pins: PinDriver::new(sda, scl),
            clock,
            half_period_us: timing.half_period_us.max(1),
            timing,
            session: SessionState::Idle,
        }
    }

    pub fn session(&self) -> SessionState {
        self.session
    }

    pub fn half_period_us(&self) -> u32 {
        self.half_period_us
    }

    pub fn set_half_period_us(&mut self, us: u32) {
        self.half_period_us = us.max(1);
    }

    /// Switch to the reduced bit rate used after a fallback teardown.
    pub fn use_reduced_speed(&mut self) {
        self.set_half_period_us(self.timing.reduced_half_period_us);
    }

    pub fn timing(&self) -> &TimingConfig {
        &self.timing
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn pins(&self) -> &PinDriver<SDA, SCL> {
        &self.pins
    }

    pub fn pins_mut(&mut self) -> &mut PinDriver<SDA, SCL> {
        &mut self.pins
    }

    /// Both lines currently read high.
    pub fn lines_idle(&self) -> bool {
        self.pins.lines_high()
    }

    /// Abandon any open session and release both lines.
    ///
    /// No STOP is generated; use this to hand the lines to recovery or to
    /// start an attempt from a known state.
    pub fn release_lines(&mut self) -> Result<(), BusError> {
        self.session = SessionState::Idle;
        self.pins.release_all()
    }

    /// Give the pins back.
    pub fn into_pins(self) -> (SDA, SCL) {
        self.pins.into_pins()
    }

    fn settle(&self) {
        self.clock.delay_us(self.half_period_us);
    }

    /// Release the clock and wait for the peer to let it rise.
    fn raise_clock(&mut self) -> Result<(), BusError> {
        self.pins.release(Line::Clock)?;
        let timeout_us = self.timing.clock_stretch_timeout_us;
        if self
            .pins
            .wait_while_low(Line::Clock, &self.clock, self.timing.stretch_poll_us, timeout_us)
        {
            Ok(())
        } else {
            log_warn!("Clock held low for more than {} us", timeout_us);
            Err(BusError::Timeout)
        }
    }

    /// Issue a START condition.
    ///
    /// # Errors
    ///
    /// - `BusError::SessionActive` if a session is already open
    /// - `BusError::Timeout` if either line does not rise when released
    pub fn start(&mut self) -> Result<(), BusError> {
        if self.session == SessionState::Started {
            return Err(BusError::SessionActive);
        }

        self.pins.release(Line::Data)?;
        self.settle();
        self.raise_clock()?;
        let data_free = self.pins.wait_while_low(
            Line::Data,
            &self.clock,
            self.timing.stretch_poll_us,
            self.timing.clock_stretch_timeout_us,
        );
        if !data_free {
            log_warn!("Data line held low, cannot start");
            return Err(BusError::Timeout);
        }
        self.settle();

        // Data falls while the clock is high
        self.pins.drive_low(Line::Data)?;
        self.settle();
        self.pins.drive_low(Line::Clock)?;
        self.settle();

        self.session = SessionState::Started;
        Ok(())
    }

    /// Issue a STOP condition. The session is closed even if this fails.
    pub fn stop(&mut self) -> Result<(), BusError> {
        self.session = SessionState::Idle;
        let result = self.emit_stop();
        if result.is_err() {
            // Never leave a line driven after a failed STOP
            let _ = self.pins.release_all();
        }
        result
    }

    fn emit_stop(&mut self) -> Result<(), BusError> {
        // Data may only change while the clock is low
        if self.pins.mode(Line::Clock) != LineMode::OutputLow {
            self.pins.drive_low(Line::Clock)?;
            self.settle();
        }
        self.pins.drive_low(Line::Data)?;
        self.settle();
        self.raise_clock()?;
        self.settle();

        // Data rises while the clock is high
        self.pins.release(Line::Data)?;
        self.settle();
        Ok(())
    }

    /// Clock one byte out, MSB first, and sample the acknowledge.
    ///
    /// Returns `true` if the peer pulled data low on the ninth clock.
    pub fn write_byte(&mut self, byte: u8) -> Result<bool, BusError> {
        debug_assert_eq!(self.session, SessionState::Started);

        for bit in (0..8).rev() {
            debug_assert_eq!(self.pins.mode(Line::Clock), LineMode::OutputLow);
            if byte & (1 << bit) != 0 {
                self.pins.release(Line::Data)?;
            } else {
                self.pins.drive_low(Line::Data)?;
            }
            self.settle();
            self.raise_clock()?;
            self.settle();
            self.pins.drive_low(Line::Clock)?;
            self.settle();
        }

        self.pins.release(Line::Data)?;
        self.settle();
        self.raise_clock()?;
        self.settle();
        let acked = !self.pins.read_level(Line::Data);
        self.pins.drive_low(Line::Clock)?;
        self.settle();

        Ok(acked)
    }

    /// Clock one byte in, MSB first, then answer ACK (`ack == true`) or NACK.
    pub fn read_byte(&mut self, ack: bool) -> Result<u8, BusError> {
        debug_assert_eq!(self.session, SessionState::Started);

        self.pins.release(Line::Data)?;
        let mut byte = 0u8;
        for bit in (0..8).rev() {
            self.settle();
            self.raise_clock()?;
            self.settle();
            if self.pins.read_level(Line::Data) {
                byte |= 1 << bit;
            }
            self.pins.drive_low(Line::Clock)?;
        }

        debug_assert_eq!(self.pins.mode(Line::Clock), LineMode::OutputLow);
        if ack {
            self.pins.drive_low(Line::Data)?;
        } else {
            self.pins.release(Line::Data)?;
        }
        self.settle();
        self.raise_clock()?;
        self.settle();
        self.pins.drive_low(Line::Clock)?;
        self.settle();
        self.pins.release(Line::Data)?;

        Ok(byte)
    }

    /// Run `body` inside a START/STOP pair.
    ///
    /// The STOP is emitted whatever `body` returns; the body's error wins
    /// over a STOP error.
    fn transaction<T>(
        &mut self,
        body: impl FnOnce(&mut Self) -> Result<T, BusError>,
    ) -> Result<T, BusError> {
        self.start()?;
        let result = body(self);
        let stopped = self.stop();
        let value = result?;
        stopped?;
        Ok(value)
    }

    /// Probe every 7-bit address and collect the ones that acknowledge.
    ///
    /// Diagnostic only. Addresses beyond [`MAX_SCAN_RESULTS`] are dropped.
    pub fn scan(&mut self) -> Result<Vec<u8, MAX_SCAN_RESULTS>, BusError> {
        let mut found = Vec::new();
        for addr in 0x01..0x7F {
            log_trace!("Probing {:#x}", addr);
            if self.probe(addr)? {
                log_info!("Device found at {:#x}", addr);
                if found.push(addr).is_err() {
                    log_warn!("Scan result table full");
                    break;
                }
            }
            self.clock.delay_ms(self.timing.scan_spacing_ms);
        }
        if found.is_empty() {
            log_warn!("Scan found no devices");
        }
        Ok(found)
    }
}

impl<SDA, SCL, C> I2cInterface for SoftWire<SDA, SCL, C>
where
    SDA: OpenDrainPin,
    SCL: OpenDrainPin,
    C: Clock,
{
    fn write(&mut self, addr: u8, data: &[u8]) -> Result<(), BusError> {
        self.transaction(|wire| {
            if !wire.write_byte(address_byte(addr, false))? {
                log_debug!("No ACK for write address {:#x}", addr);
                return Err(BusError::NoAck);
            }
            for &byte in data {
                if !wire.write_byte(byte)? {
                    log_debug!("No ACK for data byte {:#x}", byte);
                    return Err(BusError::NoAck);
                }
            }
            Ok(())
        })
    }

    fn read(&mut self, addr: u8, buffer: &mut [u8]) -> Result<(), BusError> {
        self.transaction(|wire| {
            if !wire.write_byte(address_byte(addr, true))? {
                log_debug!("No ACK for read address {:#x}", addr);
                return Err(BusError::NoAck);
            }
            let last = buffer.len().saturating_sub(1);
            for (i, slot) in buffer.iter_mut().enumerate() {
                *slot = wire.read_byte(i < last)?;
            }
            Ok(())
        })
    }

    fn probe(&mut self, addr: u8) -> Result<bool, BusError> {
        self.transaction(|wire| wire.write_byte(address_byte(addr, false)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::traits::MockClock;
    use crate::platform::mock::{BusEvent, DataFault, PeerConfig, SimBus, SimPin};
    use aht_node_core::sensor::{RawReading, DEFAULT_ADDRESS};

    fn wire<'a>(bus: &SimBus, clock: &'a MockClock) -> SoftWire<SimPin, SimPin, &'a MockClock> {
        let (sda, scl) = bus.pins();
        SoftWire::new(sda, scl, clock, TimingConfig::default())
    }

    #[test]
    fn start_twice_is_rejected() {
        let bus = SimBus::new(PeerConfig::default());
        let clock = MockClock::new();
        let mut wire = wire(&bus, &clock);

        wire.start().unwrap();
        assert_eq!(wire.start(), Err(BusError::SessionActive));
        wire.stop().unwrap();
        assert_eq!(wire.session(), SessionState::Idle);
        assert!(wire.lines_idle());
        assert_eq!(bus.events(), vec![BusEvent::Start, BusEvent::Stop]);
    }

    #[test]
    fn write_frames_command_between_start_and_stop() {
        let bus = SimBus::new(PeerConfig::default());
        let clock = MockClock::new();
        let mut wire = wire(&bus, &clock);

        wire.write(DEFAULT_ADDRESS, &[0xAC, 0x33, 0x00]).unwrap();

        assert_eq!(
            bus.events(),
            vec![
                BusEvent::Start,
                BusEvent::Write { byte: 0x70, acked: true },
                BusEvent::Write { byte: 0xAC, acked: true },
                BusEvent::Write { byte: 0x33, acked: true },
                BusEvent::Write { byte: 0x00, acked: true },
                BusEvent::Stop,
            ]
        );
        assert_eq!(bus.commands(), vec![0xAC]);
    }

    #[test]
    fn nack_still_closes_the_session() {
        let bus = SimBus::empty();
        let clock = MockClock::new();
        let mut wire = wire(&bus, &clock);

        assert_eq!(wire.write(DEFAULT_ADDRESS, &[0xBA]), Err(BusError::NoAck));

        assert_eq!(bus.events().last(), Some(&BusEvent::Stop));
        assert_eq!(wire.session(), SessionState::Idle);
        assert!(wire.lines_idle());
        assert!(bus.commands().is_empty());
    }

    #[test]
    fn nack_on_data_byte_aborts_with_stop() {
        let bus = SimBus::new(PeerConfig {
            rejected_byte: Some(0x33),
            ..PeerConfig::default()
        });
        let clock = MockClock::new();
        let mut wire = wire(&bus, &clock);

        assert_eq!(
            wire.write(DEFAULT_ADDRESS, &[0xAC, 0x33, 0x00]),
            Err(BusError::NoAck)
        );

        // Nothing after the refused byte is clocked out
        assert_eq!(
            bus.events(),
            vec![
                BusEvent::Start,
                BusEvent::Write { byte: 0x70, acked: true },
                BusEvent::Write { byte: 0xAC, acked: true },
                BusEvent::Write { byte: 0x33, acked: false },
                BusEvent::Stop,
            ]
        );
        assert_eq!(wire.session(), SessionState::Idle);
        assert!(wire.lines_idle());
        assert!(bus.commands().is_empty());
    }

    #[test]
    fn read_returns_status_and_frame() {
        let frame = *RawReading::synthesize(23.0, 55.0).as_bytes();
        let bus = SimBus::new(PeerConfig {
            frame,
            ..PeerConfig::default()
        });
        let clock = MockClock::new();
        let mut wire = wire(&bus, &clock);

        let mut buffer = [0u8; 7];
        wire.read(DEFAULT_ADDRESS, &mut buffer).unwrap();

        assert_eq!(&buffer[1..], &frame[1..]);
        let events = bus.events();
        assert_eq!(
            events[events.len() - 2],
            BusEvent::Read {
                byte: frame[6],
                acked: false
            }
        );
        assert!(matches!(events[2], BusEvent::Read { acked: true, .. }));
    }

    #[test]
    fn probe_reports_presence() {
        let clock = MockClock::new();

        let present = SimBus::new(PeerConfig::default());
        assert_eq!(wire(&present, &clock).probe(DEFAULT_ADDRESS), Ok(true));

        let absent = SimBus::empty();
        assert_eq!(wire(&absent, &clock).probe(DEFAULT_ADDRESS), Ok(false));
        assert!(absent.commands().is_empty());

        // Unplugged and replugged between transfers
        let mut replugged = wire(&present, &clock);
        present.set_nack_address(true);
        assert_eq!(replugged.probe(DEFAULT_ADDRESS), Ok(false));
        present.set_nack_address(false);
        assert_eq!(replugged.probe(DEFAULT_ADDRESS), Ok(true));
    }

    #[test]
    fn held_clock_times_out_and_releases_lines() {
        let bus = SimBus::new(PeerConfig::default());
        let clock = MockClock::new();
        let mut wire = wire(&bus, &clock);
        bus.hold_clock(true);

        assert_eq!(wire.probe(DEFAULT_ADDRESS), Err(BusError::Timeout));
        assert_eq!(wire.session(), SessionState::Idle);
        assert_eq!(wire.pins().mode(Line::Data), LineMode::InputPullUp);
        assert_eq!(wire.pins().mode(Line::Clock), LineMode::InputPullUp);
        assert!(clock.now_us() >= 10_000);
    }

    #[test]
    fn clock_stretch_within_bound_is_tolerated() {
        let bus = SimBus::new(PeerConfig::default());
        let clock = MockClock::new();
        let mut wire = wire(&bus, &clock);
        bus.stretch_clock(500);

        assert_eq!(wire.probe(DEFAULT_ADDRESS), Ok(true));
    }

    #[test]
    fn stuck_data_prevents_start() {
        let bus = SimBus::new(PeerConfig::default());
        let clock = MockClock::new();
        let mut wire = wire(&bus, &clock);
        bus.set_data_fault(DataFault::StuckLow);

        assert_eq!(wire.start(), Err(BusError::Timeout));
        assert_eq!(wire.session(), SessionState::Idle);
        assert!(bus.events().is_empty());
    }

    #[test]
    fn scan_finds_the_sensor() {
        let bus = SimBus::new(PeerConfig::default());
        let clock = MockClock::new();
        let mut wire = wire(&bus, &clock);

        let found = wire.scan().unwrap();
        assert_eq!(found.as_slice(), &[DEFAULT_ADDRESS]);
        assert!(bus.commands().is_empty());
    }

    #[test]
    fn reduced_speed_stretches_every_transition() {
        let clock = MockClock::new();
        let bus = SimBus::new(PeerConfig::default());
        let mut fast = wire(&bus, &clock);
        fast.probe(DEFAULT_ADDRESS).unwrap();
        let fast_us = clock.total_delay_us();

        let slow_clock = MockClock::new();
        let mut slow = wire(&bus, &slow_clock);
        slow.use_reduced_speed();
        assert_eq!(slow.half_period_us(), 50);
        slow.probe(DEFAULT_ADDRESS).unwrap();

        assert_eq!(slow_clock.total_delay_us(), fast_us * 10);
    }
}
