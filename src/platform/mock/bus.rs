//! Simulated two-wire bus
//!
//! Models the wired-AND lines of one bus shared by the controller pins, an
//! AHT21 peer and injectable faults. Every controller transition is
//! evaluated immediately: START/STOP are detected on data edges while the
//! clock is high, the peer samples on clock rising edges and changes its
//! own data drive only on clock falling edges, exactly as a real device
//! would.
//!
//! The peer understands the AHT21 command set and answers reads with a
//! status byte followed by the programmed measurement frame.

use std::cell::RefCell;
use std::rc::Rc;
use std::vec::Vec;

use aht_node_core::sensor::{Command, RawReading, StatusFlags, DEFAULT_ADDRESS, FRAME_LEN};

use super::gpio::SimPin;

/// Which of the two lines a simulated pin is wired to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum SimLine {
    Data,
    Clock,
}

/// Protocol-level events observed on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusEvent {
    Start,
    Stop,
    /// Byte clocked from controller to peer and the peer's answer
    Write { byte: u8, acked: bool },
    /// Byte clocked from peer to controller and the controller's answer
    Read { byte: u8, acked: bool },
}

/// Fault holding the data line low independently of the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataFault {
    #[default]
    None,
    /// Held low forever
    StuckLow,
    /// Held low until this many clock pulses have been seen
    StuckFor { pulses: u32 },
}

impl DataFault {
    fn holds_low(&self) -> bool {
        !matches!(self, DataFault::None)
    }
}

/// Behaviour of the simulated AHT21
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeerConfig {
    /// 7-bit address the peer answers to
    pub address: u8,
    /// Refuse to acknowledge the address (absent or dead device)
    pub nack_address: bool,
    /// Data byte the peer refuses to acknowledge (unsupported opcode)
    pub rejected_byte: Option<u8>,
    /// Frame returned by a read; the status byte is rewritten from peer state
    pub frame: [u8; FRAME_LEN],
    /// Status reads reporting busy after each calibrate or trigger command
    pub busy_polls: u32,
    /// Calibration bit at power-up
    pub calibrated: bool,
    /// Whether a calibrate command sets the calibration bit
    pub calibrates: bool,
}

impl Default for PeerConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS,
            nack_address: false,
            rejected_byte: None,
            frame: *RawReading::synthesize(21.5, 48.0).as_bytes(),
            busy_polls: 0,
            calibrated: true,
            calibrates: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AfterAck {
    Receive,
    Transmit,
    Ignore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Receive { address: bool, shift: u8, bits: u8 },
    /// Byte complete; peer answers on the next falling edge
    AckPending { ack: bool, next: AfterAck },
    /// Ninth clock in progress
    Ack { next: AfterAck },
    /// Peer shifting out `byte`; `sent` bits presented so far
    Transmit { byte: u8, sent: u8 },
    /// Waiting for the controller's answer to `byte`
    AwaitAck { byte: u8, acked: bool },
    /// Not addressed or NACKed; wait for the next condition
    Ignore,
}

#[derive(Debug)]
pub(super) struct SimState {
    peer: PeerConfig,
    controller_data_low: bool,
    controller_clock_low: bool,
    peer_data_low: bool,
    fault: DataFault,
    clock_held: bool,
    stretch_reads: u32,
    pin_fault: bool,
    phase: Phase,
    written: Vec<u8>,
    tx_index: usize,
    busy_reads: u32,
    reporting_busy: bool,
    calibrated: bool,
    events: Vec<BusEvent>,
    commands: Vec<u8>,
    transitions: u32,
    clock_pulses: u32,
}

impl SimState {
    fn new(peer: PeerConfig) -> Self {
        Self {
            peer,
            controller_data_low: false,
            controller_clock_low: false,
            peer_data_low: false,
            fault: DataFault::None,
            clock_held: false,
            stretch_reads: 0,
            pin_fault: false,
            phase: Phase::Idle,
            written: Vec::new(),
            tx_index: 0,
            busy_reads: 0,
            reporting_busy: false,
            calibrated: peer.calibrated,
            events: Vec::new(),
            commands: Vec::new(),
            transitions: 0,
            clock_pulses: 0,
        }
    }

    pub(super) fn pin_fault(&self) -> bool {
        self.pin_fault
    }

    pub(super) fn controller_low(&self, line: SimLine) -> bool {
        match line {
            SimLine::Data => self.controller_data_low,
            SimLine::Clock => self.controller_clock_low,
        }
    }

    fn data_level(&self) -> bool {
        !(self.controller_data_low || self.peer_data_low || self.fault.holds_low())
    }

    fn clock_level(&self) -> bool {
        !(self.controller_clock_low || self.clock_held)
    }

    /// Level seen by a pin read; a pending stretch consumes one read.
    pub(super) fn sample(&mut self, line: SimLine) -> bool {
        match line {
            SimLine::Data => self.data_level(),
            SimLine::Clock => {
                if self.clock_level() && self.stretch_reads > 0 {
                    self.stretch_reads -= 1;
                    return false;
                }
                self.clock_level()
            }
        }
    }

    /// Apply one controller transition and let the peer react to it.
    pub(super) fn drive(&mut self, line: SimLine, low: bool) {
        self.transitions += 1;
        let data_before = self.data_level();
        let clock_before = self.clock_level();

        match line {
            SimLine::Data => self.controller_data_low = low,
            SimLine::Clock => self.controller_clock_low = low,
        }

        let clock_after = self.clock_level();
        if clock_before != clock_after {
            if clock_after {
                self.on_clock_rise();
            } else {
                self.on_clock_fall();
            }
        } else if clock_after {
            let data_after = self.data_level();
            if data_before && !data_after {
                self.on_start();
            } else if !data_before && data_after {
                self.on_stop();
            }
        }
    }

    fn on_start(&mut self) {
        self.events.push(BusEvent::Start);
        self.peer_data_low = false;
        self.written.clear();
        self.phase = Phase::Receive {
            address: true,
            shift: 0,
            bits: 0,
        };
    }

    fn on_stop(&mut self) {
        self.events.push(BusEvent::Stop);
        self.peer_data_low = false;
        self.apply_command();
        self.phase = Phase::Idle;
    }

    fn on_clock_rise(&mut self) {
        self.clock_pulses += 1;
        if let DataFault::StuckFor { pulses } = self.fault {
            self.fault = if pulses <= 1 {
                DataFault::None
            } else {
                DataFault::StuckFor { pulses: pulses - 1 }
            };
        }

        let bit = self.data_level();
        match self.phase {
            Phase::Receive {
                address,
                shift,
                bits,
            } => {
                let shift = (shift << 1) | bit as u8;
                self.phase = if bits + 1 < 8 {
                    Phase::Receive {
                        address,
                        shift,
                        bits: bits + 1,
                    }
                } else {
                    self.accept_byte(address, shift)
                };
            }
            Phase::AwaitAck { byte, .. } => {
                let acked = !bit;
                self.events.push(BusEvent::Read { byte, acked });
                self.phase = Phase::AwaitAck { byte, acked };
            }
            _ => {}
        }
    }

    fn on_clock_fall(&mut self) {
        match self.phase {
            Phase::AckPending { ack, next } => {
                self.peer_data_low = ack;
                self.phase = Phase::Ack { next };
            }
            Phase::Ack { next } => {
                self.peer_data_low = false;
                self.phase = match next {
                    AfterAck::Receive => Phase::Receive {
                        address: false,
                        shift: 0,
                        bits: 0,
                    },
                    AfterAck::Transmit => self.load_next_byte(),
                    AfterAck::Ignore => Phase::Ignore,
                };
            }
            Phase::Transmit { byte, sent } => {
                if sent < 8 {
                    self.present_bit(byte, sent);
                    self.phase = Phase::Transmit {
                        byte,
                        sent: sent + 1,
                    };
                } else {
                    self.peer_data_low = false;
                    self.phase = Phase::AwaitAck { byte, acked: false };
                }
            }
            Phase::AwaitAck { acked, .. } => {
                self.phase = if acked {
                    self.load_next_byte()
                } else {
                    Phase::Ignore
                };
            }
            Phase::Idle | Phase::Receive { .. } | Phase::Ignore => {}
        }
    }

    fn accept_byte(&mut self, address: bool, byte: u8) -> Phase {
        if !address {
            let ack = self.peer.rejected_byte != Some(byte);
            self.events.push(BusEvent::Write { byte, acked: ack });
            if !ack {
                // A refused command is never executed
                self.written.clear();
                return Phase::AckPending {
                    ack: false,
                    next: AfterAck::Ignore,
                };
            }
            self.written.push(byte);
            return Phase::AckPending {
                ack: true,
                next: AfterAck::Receive,
            };
        }

        let ack = byte >> 1 == self.peer.address && !self.peer.nack_address;
        self.events.push(BusEvent::Write { byte, acked: ack });
        if !ack {
            return Phase::AckPending {
                ack: false,
                next: AfterAck::Ignore,
            };
        }

        if byte & 1 == 1 {
            self.tx_index = 0;
            self.reporting_busy = self.busy_reads > 0;
            self.busy_reads = self.busy_reads.saturating_sub(1);
            Phase::AckPending {
                ack: true,
                next: AfterAck::Transmit,
            }
        } else {
            Phase::AckPending {
                ack: true,
                next: AfterAck::Receive,
            }
        }
    }

    fn load_next_byte(&mut self) -> Phase {
        let byte = self.tx_byte(self.tx_index);
        self.tx_index += 1;
        self.present_bit(byte, 0);
        Phase::Transmit { byte, sent: 1 }
    }

    fn present_bit(&mut self, byte: u8, index: u8) {
        self.peer_data_low = byte & (0x80 >> index) == 0;
    }

    fn tx_byte(&self, index: usize) -> u8 {
        if index == 0 {
            let mut status = StatusFlags::from_byte(self.peer.frame[0]);
            status.set(StatusFlags::BUSY, self.reporting_busy);
            status.set(StatusFlags::CALIBRATED, self.calibrated);
            return status.bits();
        }
        self.peer.frame.get(index).copied().unwrap_or(0xFF)
    }

    fn apply_command(&mut self) {
        let Some(&opcode) = self.written.first() else {
            return;
        };
        self.written.clear();
        self.commands.push(opcode);

        match Command::from_opcode(opcode) {
            Some(Command::SoftReset) => self.busy_reads = 0,
            Some(Command::Calibrate) => {
                self.busy_reads = self.peer.busy_polls;
                if self.peer.calibrates {
                    self.calibrated = true;
                }
            }
            Some(Command::TriggerMeasurement) => self.busy_reads = self.peer.busy_polls,
            None => {}
        }
    }
}

/// Handle to one simulated bus
///
/// Cloning yields another handle to the same wires.
#[derive(Debug, Clone)]
pub struct SimBus {
    state: Rc<RefCell<SimState>>,
}

impl SimBus {
    pub fn new(peer: PeerConfig) -> Self {
        Self {
            state: Rc::new(RefCell::new(SimState::new(peer))),
        }
    }

    /// Bus with no device answering at the default address
    pub fn empty() -> Self {
        Self::new(PeerConfig {
            nack_address: true,
            ..PeerConfig::default()
        })
    }

    /// Controller pins wired to this bus: `(data, clock)`
    pub fn pins(&self) -> (SimPin, SimPin) {
        (
            SimPin::new(self.state.clone(), SimLine::Data),
            SimPin::new(self.state.clone(), SimLine::Clock),
        )
    }

    pub fn events(&self) -> Vec<BusEvent> {
        self.state.borrow().events.clone()
    }

    pub fn clear_events(&self) {
        self.state.borrow_mut().events.clear();
    }

    /// Opcodes of the commands the peer executed, in order
    pub fn commands(&self) -> Vec<u8> {
        self.state.borrow().commands.clone()
    }

    /// Controller pin operations performed so far
    pub fn transitions(&self) -> u32 {
        self.state.borrow().transitions
    }

    /// Clock rising edges seen so far
    pub fn clock_pulses(&self) -> u32 {
        self.state.borrow().clock_pulses
    }

    pub fn data_level(&self) -> bool {
        self.state.borrow().data_level()
    }

    pub fn clock_level(&self) -> bool {
        self.state.borrow().clock_level()
    }

    pub fn set_data_fault(&self, fault: DataFault) {
        self.state.borrow_mut().fault = fault;
    }

    /// Peer holds the clock low until told otherwise
    pub fn hold_clock(&self, held: bool) {
        self.state.borrow_mut().clock_held = held;
    }

    /// Next `reads` reads of a released clock line report low
    pub fn stretch_clock(&self, reads: u32) {
        self.state.borrow_mut().stretch_reads = reads;
    }

    /// Make every pin operation fail at the backend
    pub fn set_pin_fault(&self, fault: bool) {
        self.state.borrow_mut().pin_fault = fault;
    }

    pub fn set_nack_address(&self, nack: bool) {
        self.state.borrow_mut().peer.nack_address = nack;
    }

    pub fn set_frame(&self, frame: [u8; FRAME_LEN]) {
        self.state.borrow_mut().peer.frame = frame;
    }
}
