//! Health report
//!
//! Snapshot of every bus, logged once per sampling cycle.

use heapless::Vec;

use crate::core::bus::{BusId, BusStatus};
use crate::core::config::MAX_BUSES;
use crate::{log_info, log_warn};

/// Health of one bus at the end of a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "pico2_w", derive(defmt::Format))]
pub struct BusSummary {
    pub bus: BusId,
    pub status: BusStatus,
    pub error_count: u32,
    pub recovery_requests: u32,
    pub consecutive_failures: u32,
    pub successes: u32,
}

/// Health of every bus of the node
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HealthReport {
    buses: Vec<BusSummary, MAX_BUSES>,
}

impl HealthReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a bus; ignored once `MAX_BUSES` summaries are held.
    pub fn push(&mut self, summary: BusSummary) {
        let _ = self.buses.push(summary);
    }

    pub fn buses(&self) -> &[BusSummary] {
        &self.buses
    }

    pub fn get(&self, bus: BusId) -> Option<&BusSummary> {
        self.buses.iter().find(|s| s.bus == bus)
    }

    pub fn locked_count(&self) -> usize {
        self.buses
            .iter()
            .filter(|s| s.status == BusStatus::Locked)
            .count()
    }

    /// Errors summed over all buses
    pub fn total_errors(&self) -> u32 {
        self.buses
            .iter()
            .fold(0u32, |acc, s| acc.saturating_add(s.error_count))
    }

    pub fn log(&self) {
        log_info!(
            "Health: {} buses, {} errors, {} locked",
            self.buses.len(),
            self.total_errors(),
            self.locked_count()
        );
        for s in self.buses.iter() {
            if s.status == BusStatus::Locked {
                log_warn!(
                    "  bus {}: LOCKED, errors {}, recoveries {}, failing {}",
                    s.bus,
                    s.error_count,
                    s.recovery_requests,
                    s.consecutive_failures
                );
            } else {
                log_info!(
                    "  bus {}: OK, errors {}, recoveries {}, failing {}",
                    s.bus,
                    s.error_count,
                    s.recovery_requests,
                    s.consecutive_failures
                );
            }
        }
    }
}
