//! Bus handle
//!
//! Everything the node knows about one bus: its wiring, its transport and
//! the health bookkeeping that survives between reads. Handles share no
//! state, so buses never influence each other.

use crate::core::bus::{BusHealth, BusId, FailureCounters};
use crate::core::config::{BusConfig, TimingConfig};
use crate::core::traits::Clock;
use crate::devices::softwire::SoftWire;
use crate::platform::traits::OpenDrainPin;

use super::recovery::{recover, RecoveryOutcome};
use super::report::BusSummary;

/// One sensor bus and its health
pub struct BusHandle<SDA, SCL, C> {
    pub(crate) config: BusConfig,
    pub(crate) wire: SoftWire<SDA, SCL, C>,
    pub(crate) health: BusHealth,
    pub(crate) failures: FailureCounters,
}

impl<SDA, SCL, C> BusHandle<SDA, SCL, C>
where
    SDA: OpenDrainPin,
    SCL: OpenDrainPin,
    C: Clock,
{
    pub fn new(config: BusConfig, sda: SDA, scl: SCL, clock: C, timing: TimingConfig) -> Self {
        Self {
            config,
            wire: SoftWire::new(sda, scl, clock, timing),
            health: BusHealth::new(),
            failures: FailureCounters::new(),
        }
    }

    pub fn id(&self) -> BusId {
        self.config.id
    }

    pub fn config(&self) -> &BusConfig {
        &self.config
    }

    pub fn health(&self) -> &BusHealth {
        &self.health
    }

    pub fn failures(&self) -> &FailureCounters {
        &self.failures
    }

    pub fn wire(&self) -> &SoftWire<SDA, SCL, C> {
        &self.wire
    }

    /// Run the recovery sequence on this bus.
    pub fn recover(&mut self) -> RecoveryOutcome {
        recover(&mut self.wire, &mut self.health)
    }

    pub fn summary(&self) -> BusSummary {
        BusSummary {
            bus: self.config.id,
            status: self.health.status(),
            error_count: self.health.error_count(),
            recovery_requests: self.health.recovery_requests(),
            consecutive_failures: self.failures.consecutive(),
            successes: self.failures.successes(),
        }
    }
}
