//! Bounded polling
//!
//! Every hardware handshake in the driver is a busy-wait on a status bit.
//! [`PollBudget`] turns a timeout into a fixed number of checks separated
//! by [`DelayNs`] waits, so the time spent is accounted to whatever delay
//! provider the caller injected (a hardware timer on target, a counting
//! mock in tests).

use embedded_hal::delay::DelayNs;

/// Timeout expressed as a total budget and a poll interval
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PollBudget {
    /// Total time allowed in microseconds
    pub timeout_us: u32,
    /// Delay between checks in microseconds
    pub interval_us: u32,
}

impl PollBudget {
    /// Budget of `timeout_us` checked every `interval_us`
    pub const fn new(timeout_us: u32, interval_us: u32) -> Self {
        Self {
            timeout_us,
            interval_us,
        }
    }

    /// Budget of `timeout_ms` checked every `interval_us`
    pub const fn from_ms(timeout_ms: u32, interval_us: u32) -> Self {
        Self::new(timeout_ms.saturating_mul(1000), interval_us)
    }

    /// Number of checks performed before giving up (at least one)
    pub const fn max_iterations(&self) -> u32 {
        let interval = if self.interval_us == 0 { 1 } else { self.interval_us };
        let n = self.timeout_us / interval;
        if n == 0 { 1 } else { n }
    }

    /// Poll `done` until it returns true or the budget runs out
    ///
    /// Returns `true` if the condition was met.
    pub fn wait<D, F>(&self, delay: &mut D, mut done: F) -> bool
    where
        D: DelayNs + ?Sized,
        F: FnMut() -> bool,
    {
        for _ in 0..self.max_iterations() {
            if done() {
                return true;
            }
            delay.delay_us(self.interval_us);
        }
        false
    }
}
