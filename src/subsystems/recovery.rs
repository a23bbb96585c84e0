//! Bus recovery
//!
//! A peer that lost track of a transfer (for example because the controller
//! reset mid-byte) can keep the data line low forever, waiting for clock
//! pulses that never come. Recovery supplies them:
//!
//! 1. Abandon the open session and release both lines
//! 2. Drive the clock, leave data released (input with pull-up)
//! 3. Pulse the clock (default up to 20 times at 100 µs) until data reads high
//! 4. Synthesize a STOP (data rises while the clock is high)
//! 5. Release both lines and settle
//!
//! The bus is recovered only if both lines then read high. Requests closer
//! than the cooldown to the previous recovery on the same bus are refused
//! without touching the pins.

use crate::core::bus::{BusError, BusHealth};
use crate::core::config::TimingConfig;
use crate::core::traits::Clock;
use crate::devices::softwire::{Line, SoftWire};
use crate::platform::traits::OpenDrainPin;
use crate::{log_error, log_info, log_warn};

/// Verdict of one recovery request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "pico2_w", derive(defmt::Format))]
pub enum RecoveryOutcome {
    /// Both lines read high afterwards
    Recovered,
    /// A line stayed low; the bus is marked locked
    Locked,
    /// Refused: inside the cooldown window, pins untouched
    Skipped,
}

/// Try to return a stuck bus to idle.
///
/// Updates `health`: every request is counted; a run stamps the recovery
/// time and sets the bus status; a locked verdict also counts as an error.
pub fn recover<SDA, SCL, C>(
    wire: &mut SoftWire<SDA, SCL, C>,
    health: &mut BusHealth,
) -> RecoveryOutcome
where
    SDA: OpenDrainPin,
    SCL: OpenDrainPin,
    C: Clock,
{
    health.record_recovery_request();

    let timing = *wire.timing();
    let now_ms = wire.clock().now_ms();
    if health.in_cooldown(now_ms, timing.recovery_cooldown_ms) {
        log_warn!(
            "Recovery skipped: cooldown of {} ms not elapsed",
            timing.recovery_cooldown_ms
        );
        return RecoveryOutcome::Skipped;
    }
    health.begin_recovery(now_ms);
    log_warn!("Starting bus recovery");

    match pulse_and_stop(wire, &timing) {
        Ok(true) => {
            health.mark_recovered();
            log_info!("Bus recovery succeeded");
            RecoveryOutcome::Recovered
        }
        Ok(false) => {
            health.mark_locked();
            log_error!(
                "Bus recovery failed: data {}, clock {}",
                wire.pins().read_level(Line::Data),
                wire.pins().read_level(Line::Clock)
            );
            RecoveryOutcome::Locked
        }
        Err(_e) => {
            let _ = wire.release_lines();
            health.mark_locked();
            log_error!("Bus recovery aborted: {}", _e);
            RecoveryOutcome::Locked
        }
    }
}

/// Run the pin sequence. Returns whether both lines ended high.
fn pulse_and_stop<SDA, SCL, C>(
    wire: &mut SoftWire<SDA, SCL, C>,
    timing: &TimingConfig,
) -> Result<bool, BusError>
where
    SDA: OpenDrainPin,
    SCL: OpenDrainPin,
    C: Clock,
{
    let half = timing.recovery_half_period_us;

    wire.release_lines()?;
    wire.clock().delay_us(half);

    wire.pins_mut().drive_low(Line::Clock)?;
    wire.clock().delay_us(half);

    let mut pulses = 0u8;
    while pulses < timing.recovery_max_pulses && !wire.pins().read_level(Line::Data) {
        wire.pins_mut().release(Line::Clock)?;
        wire.clock().delay_us(half);
        wire.pins_mut().drive_low(Line::Clock)?;
        wire.clock().delay_us(half);
        pulses += 1;
    }
    if pulses > 0 {
        if wire.pins().read_level(Line::Data) {
            log_info!("Data line released after {} pulses", pulses);
        } else {
            log_warn!("Data line still low after {} pulses", pulses);
        }
    }

    // STOP: data low, clock high, then data high
    wire.pins_mut().drive_low(Line::Data)?;
    wire.clock().delay_us(half);
    wire.pins_mut().release(Line::Clock)?;
    wire.clock().delay_us(half);
    wire.pins_mut().release(Line::Data)?;
    wire.clock().delay_us(half);

    wire.release_lines()?;
    wire.clock().delay_ms(timing.recovery_settle_ms);

    Ok(wire.lines_idle())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::bus::BusStatus;
    use crate::core::traits::MockClock;
    use crate::devices::softwire::SessionState;
    use crate::platform::mock::{BusEvent, DataFault, PeerConfig, SimBus, SimPin};

    fn wire<'a>(bus: &SimBus, clock: &'a MockClock) -> SoftWire<SimPin, SimPin, &'a MockClock> {
        let (sda, scl) = bus.pins();
        SoftWire::new(sda, scl, clock, TimingConfig::default())
    }

    #[test]
    fn idle_bus_recovers_without_pulses() {
        let bus = SimBus::new(PeerConfig::default());
        let clock = MockClock::new();
        let mut wire = wire(&bus, &clock);
        let mut health = BusHealth::new();

        assert_eq!(recover(&mut wire, &mut health), RecoveryOutcome::Recovered);
        assert_eq!(health.status(), BusStatus::Ok);
        assert_eq!(health.error_count(), 0);
        assert_eq!(health.last_recovery_ms(), Some(0));
        // only the synthesized STOP raises the clock
        assert_eq!(bus.clock_pulses(), 1);
        assert_eq!(bus.events(), vec![BusEvent::Stop]);
    }

    #[test]
    fn pulses_free_a_stuck_data_line() {
        let bus = SimBus::new(PeerConfig::default());
        let clock = MockClock::new();
        let mut wire = wire(&bus, &clock);
        let mut health = BusHealth::new();
        bus.set_data_fault(DataFault::StuckFor { pulses: 9 });

        assert_eq!(recover(&mut wire, &mut health), RecoveryOutcome::Recovered);
        assert_eq!(bus.clock_pulses(), 9 + 1);
        assert!(wire.lines_idle());
        assert_eq!(wire.session(), SessionState::Idle);
    }

    #[test]
    fn permanently_stuck_line_locks_the_bus() {
        let bus = SimBus::new(PeerConfig::default());
        let clock = MockClock::new();
        let mut wire = wire(&bus, &clock);
        let mut health = BusHealth::new();
        bus.set_data_fault(DataFault::StuckLow);

        assert_eq!(recover(&mut wire, &mut health), RecoveryOutcome::Locked);
        assert_eq!(health.status(), BusStatus::Locked);
        assert_eq!(health.error_count(), 1);
        assert_eq!(bus.clock_pulses(), 20 + 1);
    }

    #[test]
    fn second_request_within_cooldown_is_pin_silent() {
        let bus = SimBus::new(PeerConfig::default());
        let clock = MockClock::new();
        let mut wire = wire(&bus, &clock);
        let mut health = BusHealth::new();

        recover(&mut wire, &mut health);
        let transitions = bus.transitions();
        clock.advance(500_000);

        assert_eq!(recover(&mut wire, &mut health), RecoveryOutcome::Skipped);
        assert_eq!(bus.transitions(), transitions);
        assert_eq!(health.recovery_requests(), 2);

        clock.advance(1_000_000);
        assert_eq!(recover(&mut wire, &mut health), RecoveryOutcome::Recovered);
        assert_eq!(health.recovery_requests(), 3);
    }

    #[test]
    fn pin_fault_is_reported_as_locked() {
        let bus = SimBus::new(PeerConfig::default());
        let clock = MockClock::new();
        let mut wire = wire(&bus, &clock);
        let mut health = BusHealth::new();
        bus.set_pin_fault(true);

        assert_eq!(recover(&mut wire, &mut health), RecoveryOutcome::Locked);
        assert!(health.is_locked());
    }
}
