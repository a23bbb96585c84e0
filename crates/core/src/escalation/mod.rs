//! Escalation policy
//!
//! The core never restarts anything. After each orchestrated read the host
//! hands the bus health and failure counters to an [`EscalationPolicy`] and
//! acts on the returned [`Escalation`] itself (typically a full process
//! restart once a sensor has failed too many requests in a row).

use crate::bus::{BusHealth, BusId, FailureCounters};

/// Thresholds of the reference policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EscalationConfig {
    /// Consecutive failed requests that warrant a restart
    pub max_consecutive_failures: u32,
    /// Treat a locked bus as restart-worthy instead of attention-only
    pub restart_on_lock: bool,
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            max_consecutive_failures: 5,
            restart_on_lock: false,
        }
    }
}

/// Why a restart is being requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RestartReason {
    ConsecutiveFailures { count: u32 },
    BusLocked,
}

/// Decision returned to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Escalation {
    /// Nothing to do
    None,
    /// Bus is locked; report it but keep running
    Attention { bus: BusId },
    /// Host should restart the node
    Restart { bus: BusId, reason: RestartReason },
}

impl Escalation {
    fn severity(&self) -> u8 {
        match self {
            Escalation::None => 0,
            Escalation::Attention { .. } => 1,
            Escalation::Restart { .. } => 2,
        }
    }

    /// Keep the more severe of two decisions (the first one on a tie).
    pub fn most_severe(self, other: Escalation) -> Escalation {
        if other.severity() > self.severity() {
            other
        } else {
            self
        }
    }

    pub fn requires_restart(&self) -> bool {
        matches!(self, Escalation::Restart { .. })
    }
}

/// Threshold-based reference policy
#[derive(Debug, Clone, Copy, Default)]
pub struct EscalationPolicy {
    config: EscalationConfig,
}

impl EscalationPolicy {
    pub const fn new(config: EscalationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EscalationConfig {
        &self.config
    }

    /// Decide for one bus.
    pub fn evaluate(
        &self,
        bus: BusId,
        health: &BusHealth,
        failures: &FailureCounters,
    ) -> Escalation {
        let count = failures.consecutive();
        if self.config.max_consecutive_failures > 0 && count >= self.config.max_consecutive_failures
        {
            return Escalation::Restart {
                bus,
                reason: RestartReason::ConsecutiveFailures { count },
            };
        }
        if health.is_locked() {
            if self.config.restart_on_lock {
                return Escalation::Restart {
                    bus,
                    reason: RestartReason::BusLocked,
                };
            }
            return Escalation::Attention { bus };
        }
        Escalation::None
    }
}
