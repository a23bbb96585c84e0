//! Bounded waiting.
//!
//! Clock-stretch release and busy-flag polling both reduce to "poll a
//! predicate every `interval` until it holds or `timeout` elapses". Every
//! peer-dependent wait in the workspace goes through these two functions so
//! no wait can block forever.

use core::convert::Infallible;

use crate::traits::Clock;

/// Poll `ready` until it returns `true` or `timeout_us` elapses.
///
/// The predicate is evaluated once before any delay, so an already satisfied
/// condition costs no time. Returns `true` if the condition was observed
/// before the deadline.
pub fn wait_until<C, F>(clock: &C, interval_us: u32, timeout_us: u32, mut ready: F) -> bool
where
    C: Clock + ?Sized,
    F: FnMut() -> bool,
{
    match try_wait_until(clock, interval_us, timeout_us, || Ok::<_, Infallible>(ready())) {
        Ok(done) => done,
        Err(never) => match never {},
    }
}

/// Fallible variant of [`wait_until`]: a predicate error aborts the wait
/// immediately and is returned to the caller.
pub fn try_wait_until<C, F, E>(
    clock: &C,
    interval_us: u32,
    timeout_us: u32,
    mut ready: F,
) -> Result<bool, E>
where
    C: Clock + ?Sized,
    F: FnMut() -> Result<bool, E>,
{
    let start = clock.now_us();
    loop {
        if ready()? {
            return Ok(true);
        }
        if clock.elapsed_since(start) >= timeout_us as u64 {
            return Ok(false);
        }
        // A zero interval would spin without advancing a simulated clock.
        clock.delay_us(interval_us.max(1));
    }
}
