//! Read orchestrator
//!
//! Turns "give me a reading from this bus" into a bounded sequence of
//! attempts. Each attempt starts from released lines and runs the whole
//! sensor conversation (presence check, initialization, measurement,
//! plausibility gate). Between failed attempts the bus is recovered; when
//! recovery is refused or fails, the transport is torn down and continues at
//! the reduced bit rate. Recovery never runs after the final attempt.
//!
//! The request ends early as locked only when recovery actually ran, failed,
//! and the teardown still finds a line low. A refused recovery moves on to
//! the next attempt.
//!
//! A failed request never produces a reading, so callers cannot mistake a
//! failure for a measured value.

use crate::core::bus::{BusError, ReadError};
use crate::core::config::{DeviceTiming, NodeConfig, RetryConfig};
use crate::core::sensor::SensorReading;
use crate::core::traits::Clock;
use crate::devices::aht21::Aht21;
use crate::platform::traits::{I2cInterface, OpenDrainPin};
use crate::{log_debug, log_error, log_info, log_warn};

use super::handle::BusHandle;
use super::recovery::{recover, RecoveryOutcome};

/// Retry/recovery policy for orchestrated reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadOrchestrator {
    retry: RetryConfig,
    device: DeviceTiming,
    scan_on_init: bool,
}

impl ReadOrchestrator {
    pub const fn new(retry: RetryConfig, device: DeviceTiming) -> Self {
        Self {
            retry,
            device,
            scan_on_init: false,
        }
    }

    pub fn from_config(config: &NodeConfig) -> Self {
        Self::new(config.retry, config.device).with_scan(config.scan_on_init)
    }

    /// Run the diagnostic address scan at the start of every attempt.
    pub const fn with_scan(mut self, scan_on_init: bool) -> Self {
        self.scan_on_init = scan_on_init;
        self
    }

    pub fn retry(&self) -> &RetryConfig {
        &self.retry
    }

    /// Read one validated measurement from `bus`.
    ///
    /// # Errors
    ///
    /// - `ReadError::Exhausted` once every attempt has failed
    /// - `ReadError::BusLocked` if the bus cannot be returned to idle
    ///
    /// Both count as one consecutive failure of the bus.
    pub fn read<SDA, SCL, C>(
        &self,
        bus: &mut BusHandle<SDA, SCL, C>,
    ) -> Result<SensorReading, ReadError>
    where
        SDA: OpenDrainPin,
        SCL: OpenDrainPin,
        C: Clock + Copy,
    {
        #[allow(unused_variables)] // id only feeds log macros (compiled out on host)
        let id = bus.config.id;
        let max_attempts = self.retry.max_attempts.max(1);
        let mut last = BusError::NoAck;

        for attempt in 1..=max_attempts {
            log_debug!("Bus {} attempt {}/{}", id, attempt, max_attempts);

            match self.attempt(bus) {
                Ok(reading) => {
                    bus.failures.record_success();
                    if bus.health.is_locked() {
                        bus.health.mark_recovered();
                    }
                    log_info!(
                        "Bus {}: {} C, {} %",
                        id,
                        reading.temperature_c,
                        reading.humidity_pct
                    );
                    return Ok(reading);
                }
                Err(e) => {
                    bus.health.record_error();
                    last = e;
                    log_warn!(
                        "Bus {} attempt {}/{} failed: {}",
                        id,
                        attempt,
                        max_attempts,
                        e
                    );
                }
            }

            if attempt == max_attempts {
                break;
            }

            match recover(&mut bus.wire, &mut bus.health) {
                RecoveryOutcome::Recovered => {}
                RecoveryOutcome::Skipped => {
                    // No pulses were sent, so a busy line proves nothing yet
                    if !self.teardown(bus) {
                        log_warn!("Bus {} still busy, recovery in cooldown", id);
                    }
                }
                RecoveryOutcome::Locked => {
                    if !self.teardown(bus) {
                        bus.failures.record_failure();
                        log_error!("Bus {} locked, giving up", id);
                        return Err(ReadError::BusLocked);
                    }
                }
            }

            bus.wire.clock().delay_ms(self.retry.attempt_settle_ms);
        }

        bus.failures.record_failure();
        log_error!(
            "Bus {} failed after {} attempts ({} in a row)",
            id,
            max_attempts,
            bus.failures.consecutive()
        );
        Err(ReadError::Exhausted {
            attempts: max_attempts,
            last,
        })
    }

    /// One complete sensor conversation from released lines.
    fn attempt<SDA, SCL, C>(
        &self,
        bus: &mut BusHandle<SDA, SCL, C>,
    ) -> Result<SensorReading, BusError>
    where
        SDA: OpenDrainPin,
        SCL: OpenDrainPin,
        C: Clock + Copy,
    {
        let address = bus.config.address;
        let clock = *bus.wire.clock();

        // Step 1: start from released lines
        bus.wire.release_lines()?;
        clock.delay_ms(bus.wire.timing().init_settle_ms);

        // Step 2: presence check
        if !bus.wire.probe(address)? {
            log_debug!("No device at {:#x}", address);
            return Err(BusError::NoAck);
        }

        // Step 3: optional diagnostic scan
        if self.scan_on_init {
            #[allow(unused_variables)] // count only feeds log macros
            let found = bus.wire.scan()?;
            log_info!("Bus {} scan: {} device(s)", bus.config.id, found.len());
        }

        // Step 4: initialization; missing calibration is only a warning
        let mut sensor = Aht21::new(&mut bus.wire, clock, address, self.device);
        match sensor.init() {
            Ok(()) => {}
            Err(BusError::NotCalibrated) => log_warn!("Sensor not calibrated, measuring anyway"),
            Err(e) => return Err(e),
        }

        // Step 5: measure and gate
        let reading = sensor.read()?;
        reading.validate().map_err(|e| {
            log_warn!(
                "Implausible reading: {} C, {} %",
                reading.temperature_c,
                reading.humidity_pct
            );
            e
        })
    }

    /// Release everything and continue at the reduced bit rate.
    ///
    /// Returns whether the lines read idle afterwards.
    fn teardown<SDA, SCL, C>(&self, bus: &mut BusHandle<SDA, SCL, C>) -> bool
    where
        SDA: OpenDrainPin,
        SCL: OpenDrainPin,
        C: Clock + Copy,
    {
        log_warn!("Bus {}: fallback teardown at reduced speed", bus.config.id);
        let clock = *bus.wire.clock();
        let timing = *bus.wire.timing();

        if bus.wire.release_lines().is_err() {
            return false;
        }
        clock.delay_ms(timing.teardown_settle_ms);
        bus.wire.use_reduced_speed();
        clock.delay_ms(timing.recovery_settle_ms);

        bus.wire.lines_idle()
    }
}
