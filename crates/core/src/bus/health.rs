//! Bus health state and failure counters
//!
//! Both live inside the bus handle. Only the recovery controller and the
//! read orchestrator mutate them; escalation policy reads them after every
//! orchestrated read.

/// Electrical state verdict of a bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusStatus {
    #[default]
    Ok,
    /// Last recovery left a line held low
    Locked,
}

/// Health bookkeeping for one bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BusHealth {
    status: BusStatus,
    error_count: u32,
    last_recovery_ms: Option<u64>,
    recovery_requests: u32,
}

impl BusHealth {
    pub const fn new() -> Self {
        Self {
            status: BusStatus::Ok,
            error_count: 0,
            last_recovery_ms: None,
            recovery_requests: 0,
        }
    }

    pub fn status(&self) -> BusStatus {
        self.status
    }

    pub fn is_locked(&self) -> bool {
        self.status == BusStatus::Locked
    }

    /// Total errors observed on this bus. Never decreases.
    pub fn error_count(&self) -> u32 {
        self.error_count
    }

    /// Timestamp of the last recovery that actually ran.
    pub fn last_recovery_ms(&self) -> Option<u64> {
        self.last_recovery_ms
    }

    /// Number of times recovery was asked for, including skipped requests.
    pub fn recovery_requests(&self) -> u32 {
        self.recovery_requests
    }

    pub fn record_error(&mut self) {
        self.error_count = self.error_count.saturating_add(1);
    }

    pub fn record_recovery_request(&mut self) {
        self.recovery_requests = self.recovery_requests.saturating_add(1);
    }

    /// True while a new recovery would fall inside the cooldown window.
    pub fn in_cooldown(&self, now_ms: u64, cooldown_ms: u32) -> bool {
        match self.last_recovery_ms {
            Some(last) => now_ms.saturating_sub(last) < cooldown_ms as u64,
            None => false,
        }
    }

    /// Stamp the start of a recovery that is going to run.
    pub fn begin_recovery(&mut self, now_ms: u64) {
        self.last_recovery_ms = Some(now_ms);
    }

    pub fn mark_recovered(&mut self) {
        self.status = BusStatus::Ok;
    }

    /// Lines stayed low: lock the bus and count the failure.
    pub fn mark_locked(&mut self) {
        self.status = BusStatus::Locked;
        self.record_error();
    }
}

/// Per-bus read outcome counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FailureCounters {
    consecutive: u32,
    successes: u32,
    failures: u32,
}

impl FailureCounters {
    pub const fn new() -> Self {
        Self {
            consecutive: 0,
            successes: 0,
            failures: 0,
        }
    }

    /// Requests that ended without a reading since the last success.
    pub fn consecutive(&self) -> u32 {
        self.consecutive
    }

    pub fn successes(&self) -> u32 {
        self.successes
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    pub fn record_success(&mut self) {
        self.consecutive = 0;
        self.successes = self.successes.saturating_add(1);
    }

    pub fn record_failure(&mut self) {
        self.consecutive = self.consecutive.saturating_add(1);
        self.failures = self.failures.saturating_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_bus_is_healthy() {
        let health = BusHealth::new();
        assert_eq!(health.status(), BusStatus::Ok);
        assert_eq!(health.error_count(), 0);
        assert_eq!(health.last_recovery_ms(), None);
        assert!(!health.in_cooldown(0, 1000));
    }

    #[test]
    fn cooldown_window() {
        let mut health = BusHealth::new();
        health.begin_recovery(5_000);

        assert!(health.in_cooldown(5_000, 1000));
        assert!(health.in_cooldown(5_999, 1000));
        assert!(!health.in_cooldown(6_000, 1000));
    }

    #[test]
    fn lock_and_recover() {
        let mut health = BusHealth::new();
        health.mark_locked();
        assert!(health.is_locked());
        assert_eq!(health.error_count(), 1);

        health.mark_recovered();
        assert_eq!(health.status(), BusStatus::Ok);
        // Error count is monotonic.
        assert_eq!(health.error_count(), 1);
    }

    #[test]
    fn consecutive_failures_reset_on_success() {
        let mut counters = FailureCounters::new();
        counters.record_failure();
        counters.record_failure();
        assert_eq!(counters.consecutive(), 2);

        counters.record_success();
        assert_eq!(counters.consecutive(), 0);
        assert_eq!(counters.failures(), 2);
        assert_eq!(counters.successes(), 1);
    }
}
