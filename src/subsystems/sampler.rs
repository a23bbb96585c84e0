//! Sampling cycle
//!
//! Reads every configured bus once per cycle, in order, with a pause between
//! buses. Successful readings go to the telemetry sink; failures only move
//! the health counters. After each bus the escalation policy is consulted
//! and the most severe decision of the cycle is handed back to the host,
//! which alone decides whether to restart.

use heapless::Vec;

use crate::core::config::{ConfigError, NodeConfig, MAX_BUSES};
use crate::core::escalation::{Escalation, EscalationPolicy};
use crate::core::traits::{Clock, Sample, TelemetrySink};
use crate::platform::traits::OpenDrainPin;
use crate::{log_info, log_warn};

use super::handle::BusHandle;
use super::orchestrator::ReadOrchestrator;
use super::report::HealthReport;

/// Outcome of one pass over all buses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "pico2_w", derive(defmt::Format))]
pub struct CycleReport {
    pub succeeded: u8,
    pub failed: u8,
    /// Most severe escalation decision of the cycle
    pub escalation: Escalation,
}

/// Periodic reader over every bus of the node
pub struct Sampler<SDA, SCL, C, S> {
    buses: Vec<BusHandle<SDA, SCL, C>, MAX_BUSES>,
    orchestrator: ReadOrchestrator,
    policy: EscalationPolicy,
    sink: S,
    clock: C,
    inter_bus_delay_ms: u32,
    sample_interval_ms: u32,
}

impl<SDA, SCL, C, S> Sampler<SDA, SCL, C, S>
where
    SDA: OpenDrainPin,
    SCL: OpenDrainPin,
    C: Clock + Copy,
    S: TelemetrySink,
{
    pub fn new(config: &NodeConfig, clock: C, sink: S) -> Self {
        Self {
            buses: Vec::new(),
            orchestrator: ReadOrchestrator::from_config(config),
            policy: EscalationPolicy::new(config.escalation),
            sink,
            clock,
            inter_bus_delay_ms: config.inter_bus_delay_ms,
            sample_interval_ms: config.sample_interval_ms,
        }
    }

    /// Append a bus to the cycle.
    pub fn add_bus(&mut self, bus: BusHandle<SDA, SCL, C>) -> Result<(), ConfigError> {
        self.buses.push(bus).map_err(|_| ConfigError::TooManyBuses)
    }

    pub fn buses(&self) -> &[BusHandle<SDA, SCL, C>] {
        &self.buses
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Period the host loop should wait between cycles (ms)
    pub fn sample_interval_ms(&self) -> u32 {
        self.sample_interval_ms
    }

    /// Read every bus once.
    pub fn run_cycle(&mut self) -> CycleReport {
        let mut report = CycleReport {
            succeeded: 0,
            failed: 0,
            escalation: Escalation::None,
        };
        let count = self.buses.len();

        for (index, bus) in self.buses.iter_mut().enumerate() {
            match self.orchestrator.read(bus) {
                Ok(reading) => {
                    self.sink.publish(&Sample {
                        bus: bus.id(),
                        timestamp_ms: self.clock.now_ms(),
                        temperature_c: reading.temperature_c,
                        humidity_pct: reading.humidity_pct,
                    });
                    report.succeeded += 1;
                }
                Err(_e) => {
                    log_warn!("Bus {}: no reading ({})", bus.id(), _e);
                    report.failed += 1;
                }
            }

            let decision = self.policy.evaluate(bus.id(), bus.health(), bus.failures());
            report.escalation = report.escalation.most_severe(decision);

            if index + 1 < count {
                self.clock.delay_ms(self.inter_bus_delay_ms);
            }
        }

        log_info!(
            "Cycle done: {} ok, {} failed",
            report.succeeded,
            report.failed
        );
        self.health_report().log();
        report
    }

    pub fn health_report(&self) -> HealthReport {
        let mut report = HealthReport::new();
        for bus in self.buses.iter() {
            report.push(bus.summary());
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::bus::BusId;
    use crate::core::config::BusConfig;
    use crate::core::escalation::RestartReason;
    use crate::core::traits::{MockClock, RecordingSink};
    use crate::platform::mock::{PeerConfig, SimBus, SimPin};

    type TestSampler<'a> = Sampler<SimPin, SimPin, &'a MockClock, RecordingSink<16>>;

    fn sampler<'a>(
        config: &NodeConfig,
        clock: &'a MockClock,
        buses: &[SimBus],
    ) -> TestSampler<'a> {
        let mut sampler = Sampler::new(config, clock, RecordingSink::new());
        for (i, sim) in buses.iter().enumerate() {
            let (sda, scl) = sim.pins();
            let wiring = BusConfig::new(i as u8 + 1, 2 * i as u8, 2 * i as u8 + 1);
            sampler
                .add_bus(BusHandle::new(wiring, sda, scl, clock, config.timing))
                .unwrap();
        }
        sampler
    }

    #[test]
    fn only_successes_reach_the_sink() {
        let config = NodeConfig::default();
        let clock = MockClock::new();
        let buses = [SimBus::new(PeerConfig::default()), SimBus::empty()];
        let mut sampler = sampler(&config, &clock, &buses);

        let report = sampler.run_cycle();

        assert_eq!(report.succeeded, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.escalation, Escalation::None);
        assert_eq!(sampler.sink().len(), 1);
        let sample = sampler.sink().iter().next().copied().unwrap();
        assert_eq!(sample.bus, BusId(1));

        let health = sampler.health_report();
        assert_eq!(health.get(BusId(2)).map(|s| s.consecutive_failures), Some(1));
    }

    #[test]
    fn repeated_failures_request_restart() {
        let config = NodeConfig::default();
        let clock = MockClock::new();
        let buses = [SimBus::empty()];
        let mut sampler = sampler(&config, &clock, &buses);

        for _ in 0..4 {
            assert_eq!(sampler.run_cycle().escalation, Escalation::None);
            clock.advance(10_000_000);
        }
        assert_eq!(
            sampler.run_cycle().escalation,
            Escalation::Restart {
                bus: BusId(1),
                reason: RestartReason::ConsecutiveFailures { count: 5 }
            }
        );
    }

    #[test]
    fn bus_table_is_bounded() {
        let config = NodeConfig::default();
        let clock = MockClock::new();
        let sims: std::vec::Vec<SimBus> = (0..MAX_BUSES).map(|_| SimBus::empty()).collect();
        let mut sampler = sampler(&config, &clock, &sims);

        let (sda, scl) = SimBus::empty().pins();
        let extra = BusHandle::new(BusConfig::new(99, 40, 41), sda, scl, &clock, config.timing);
        assert_eq!(sampler.add_bus(extra), Err(ConfigError::TooManyBuses));
    }
}
