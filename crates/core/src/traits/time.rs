//! Clock abstraction for timing-sensitive bus operations.
//!
//! All protocol timing in this workspace is synchronous: bit periods,
//! settle delays and busy polls block the calling thread. The `Clock` trait
//! bundles a monotonic time source with a blocking delay so that the same
//! code runs against the Embassy time driver on target and against
//! [`MockClock`] on the host.

use core::cell::Cell;

/// Monotonic time source with blocking delays.
///
/// Implementations:
/// - `EmbassyClock` (root crate, `pico2_w`) for RP2350 targets
/// - [`MockClock`] for host testing with simulated time
///
/// Methods take `&self` so a single clock can be shared by reference between
/// the transport, the device driver and the orchestrator of one bus.
///
/// # Example
///
/// ```
/// use aht_node_core::traits::{Clock, MockClock};
///
/// let clock = MockClock::new();
/// let start = clock.now_us();
/// clock.delay_ms(20);
/// assert_eq!(clock.elapsed_since(start), 20_000);
/// ```
pub trait Clock {
    /// Returns current time in microseconds since system start.
    fn now_us(&self) -> u64;

    /// Blocks for at least `us` microseconds.
    fn delay_us(&self, us: u32);

    /// Returns current time in milliseconds since system start.
    fn now_ms(&self) -> u64 {
        self.now_us() / 1000
    }

    /// Blocks for at least `ms` milliseconds.
    fn delay_ms(&self, ms: u32) {
        self.delay_us(ms.saturating_mul(1000));
    }

    /// Returns elapsed time in microseconds since a reference point.
    ///
    /// Uses saturating subtraction to handle potential overflow.
    fn elapsed_since(&self, reference_us: u64) -> u64 {
        self.now_us().saturating_sub(reference_us)
    }
}

impl<T: Clock + ?Sized> Clock for &T {
    fn now_us(&self) -> u64 {
        (**self).now_us()
    }

    fn delay_us(&self, us: u32) {
        (**self).delay_us(us)
    }
}

// ============================================================================
// Mock Implementation (always available for testing)
// ============================================================================

/// Simulated clock for deterministic host tests.
///
/// Delays advance simulated time instantly. Share one instance by reference
/// (`&MockClock` is itself a [`Clock`]) so every component of a bus observes
/// the same timeline.
///
/// # Example
///
/// ```
/// use aht_node_core::traits::{Clock, MockClock};
///
/// let clock = MockClock::new();
/// clock.delay_us(1500);
/// assert_eq!(clock.now_us(), 1500);
///
/// clock.advance(500);
/// assert_eq!(clock.now_ms(), 2);
/// ```
#[derive(Debug, Default)]
pub struct MockClock {
    current_us: Cell<u64>,
    total_delay_us: Cell<u64>,
}

impl MockClock {
    /// Creates a new `MockClock` starting at time 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new `MockClock` starting at the specified time.
    pub fn with_initial(us: u64) -> Self {
        Self {
            current_us: Cell::new(us),
            total_delay_us: Cell::new(0),
        }
    }

    /// Sets the current time to an absolute value.
    pub fn set(&self, us: u64) {
        self.current_us.set(us);
    }

    /// Advances the current time without counting it as a delay.
    pub fn advance(&self, us: u64) {
        self.current_us.set(self.current_us.get() + us);
    }

    /// Total time spent inside `delay_us` since creation.
    pub fn total_delay_us(&self) -> u64 {
        self.total_delay_us.get()
    }
}

impl Clock for MockClock {
    fn now_us(&self) -> u64 {
        self.current_us.get()
    }

    fn delay_us(&self, us: u32) {
        self.advance(us as u64);
        self.total_delay_us
            .set(self.total_delay_us.get() + us as u64);
    }
}
