//! Node configuration
//!
//! Configuration is passed explicitly to every component; nothing about the
//! wiring is compiled in. Defaults reproduce the timing the deployed
//! firmware settled on for long cable runs.

use core::fmt;

use crate::bus::BusId;
use crate::escalation::EscalationConfig;
use crate::sensor::DEFAULT_ADDRESS;

/// Maximum number of buses a node drives
pub const MAX_BUSES: usize = 8;

/// Wiring of one bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BusConfig {
    /// Label used in logs and telemetry
    pub id: BusId,
    /// GPIO number of the data line
    pub data_pin: u8,
    /// GPIO number of the clock line
    pub clock_pin: u8,
    /// 7-bit device address
    pub address: u8,
}

impl BusConfig {
    pub const fn new(id: u8, data_pin: u8, clock_pin: u8) -> Self {
        Self {
            id: BusId(id),
            data_pin,
            clock_pin,
            address: DEFAULT_ADDRESS,
        }
    }
}

/// Bit timing and recovery timing of the software transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimingConfig {
    /// Settle delay between line transitions (µs)
    pub half_period_us: u32,
    /// Half period after a fallback teardown (µs)
    pub reduced_half_period_us: u32,
    /// Longest a peer may hold the clock low (µs)
    pub clock_stretch_timeout_us: u32,
    /// Poll interval while waiting for clock release (µs)
    pub stretch_poll_us: u32,
    /// Half period of recovery clock pulses (µs)
    pub recovery_half_period_us: u32,
    /// Clock pulses issued while the data line is held low
    pub recovery_max_pulses: u8,
    /// Minimum spacing between recoveries on one bus (ms)
    pub recovery_cooldown_ms: u32,
    /// Settle after recovery releases the lines (ms)
    pub recovery_settle_ms: u32,
    /// Settle after lines are released at the start of an attempt (ms)
    pub init_settle_ms: u32,
    /// Settle of the fallback teardown (ms)
    pub teardown_settle_ms: u32,
    /// Spacing between probes of a bus scan (ms)
    pub scan_spacing_ms: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            half_period_us: 5,
            reduced_half_period_us: 50,
            clock_stretch_timeout_us: 10_000,
            stretch_poll_us: 1,
            recovery_half_period_us: 100,
            recovery_max_pulses: 20,
            recovery_cooldown_ms: 1000,
            recovery_settle_ms: 100,
            init_settle_ms: 50,
            teardown_settle_ms: 200,
            scan_spacing_ms: 1,
        }
    }
}

/// Sensor-side delays and busy-poll budget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceTiming {
    pub power_up_ms: u32,
    pub soft_reset_ms: u32,
    pub calibrate_settle_ms: u32,
    pub measurement_ms: u32,
    pub busy_poll_interval_ms: u32,
    pub busy_poll_timeout_ms: u32,
}

impl Default for DeviceTiming {
    fn default() -> Self {
        Self {
            power_up_ms: 40,
            soft_reset_ms: 20,
            calibrate_settle_ms: 10,
            measurement_ms: 80,
            busy_poll_interval_ms: 10,
            busy_poll_timeout_ms: 1000,
        }
    }
}

/// Attempt budget of one orchestrated read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RetryConfig {
    pub max_attempts: u8,
    /// Delay between a failed attempt and the next one (ms)
    pub attempt_settle_ms: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            attempt_settle_ms: 100,
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// No bus configured
    NoBuses,
    /// More than [`MAX_BUSES`] buses
    TooManyBuses,
    /// A pin is used twice (within one bus or across buses)
    SharedPin { pin: u8 },
    /// Two buses carry the same identifier
    DuplicateId { id: BusId },
    /// Device address does not fit in 7 bits
    InvalidAddress { address: u8 },
    /// Attempt budget of zero
    ZeroAttempts,
    /// Half period of zero
    ZeroHalfPeriod,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NoBuses => write!(f, "no bus configured"),
            ConfigError::TooManyBuses => write!(f, "more than {} buses", MAX_BUSES),
            ConfigError::SharedPin { pin } => write!(f, "GPIO {} assigned twice", pin),
            ConfigError::DuplicateId { id } => write!(f, "bus id {} used twice", id),
            ConfigError::InvalidAddress { address } => {
                write!(f, "address {:#x} is not a 7-bit address", address)
            }
            ConfigError::ZeroAttempts => write!(f, "max_attempts must be at least 1"),
            ConfigError::ZeroHalfPeriod => write!(f, "half period must be non-zero"),
        }
    }
}

/// Complete node configuration
#[derive(Debug, Clone, PartialEq)]
pub struct NodeConfig {
    pub buses: heapless::Vec<BusConfig, MAX_BUSES>,
    pub timing: TimingConfig,
    pub device: DeviceTiming,
    pub retry: RetryConfig,
    pub escalation: EscalationConfig,
    /// Period of the sampling cycle (ms)
    pub sample_interval_ms: u32,
    /// Pause between buses within one cycle (ms)
    pub inter_bus_delay_ms: u32,
    /// Run the diagnostic address scan before each initialization
    pub scan_on_init: bool,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            buses: heapless::Vec::new(),
            timing: TimingConfig::default(),
            device: DeviceTiming::default(),
            retry: RetryConfig::default(),
            escalation: EscalationConfig::default(),
            sample_interval_ms: 10_000,
            inter_bus_delay_ms: 400,
            scan_on_init: false,
        }
    }
}

impl NodeConfig {
    /// Append a bus, rejecting it if the table is full.
    pub fn add_bus(&mut self, bus: BusConfig) -> Result<(), ConfigError> {
        self.buses.push(bus).map_err(|_| ConfigError::TooManyBuses)
    }

    /// Builder form of [`NodeConfig::add_bus`].
    pub fn with_bus(mut self, bus: BusConfig) -> Result<Self, ConfigError> {
        self.add_bus(bus)?;
        Ok(self)
    }

    /// Check wiring and budgets before any pin is touched.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.buses.is_empty() {
            return Err(ConfigError::NoBuses);
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::ZeroAttempts);
        }
        if self.timing.half_period_us == 0 || self.timing.reduced_half_period_us == 0 {
            return Err(ConfigError::ZeroHalfPeriod);
        }

        let mut pins: heapless::Vec<u8, { MAX_BUSES * 2 }> = heapless::Vec::new();
        for (index, bus) in self.buses.iter().enumerate() {
            if bus.address > 0x7F {
                return Err(ConfigError::InvalidAddress {
                    address: bus.address,
                });
            }
            for pin in [bus.data_pin, bus.clock_pin] {
                if pins.contains(&pin) {
                    return Err(ConfigError::SharedPin { pin });
                }
                pins.push(pin).map_err(|_| ConfigError::TooManyBuses)?;
            }
            if self.buses[..index].iter().any(|other| other.id == bus.id) {
                return Err(ConfigError::DuplicateId { id: bus.id });
            }
        }
        Ok(())
    }
}
