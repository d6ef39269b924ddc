//! Time helpers on top of [`Clock`]

use embedded_hal::delay::DelayNs;
use lumen_hal::Clock;

/// `DelayNs` adapter over a [`Clock`]
///
/// Lets panel bring-up and power sequencing wait through the same clock the
/// render loop measures with, so a watchdog serviced in
/// [`Clock::pause_us`] keeps being fed during long settle times.
pub struct ClockDelay<'a, K: Clock>(pub &'a mut K);

impl<K: Clock> DelayNs for ClockDelay<'_, K> {
    fn delay_ns(&mut self, ns: u32) {
        self.0.pause_us(ns.div_ceil(1_000));
    }

    fn delay_us(&mut self, us: u32) {
        self.0.pause_us(us);
    }

    fn delay_ms(&mut self, ms: u32) {
        // Pause in 1 ms steps so a long settle never starves the watchdog
        for _ in 0..ms {
            self.0.pause_us(1_000);
        }
    }
}

/// Measure one interval
pub struct Stopwatch {
    start_us: u64,
}

impl Stopwatch {
    /// Start timing now
    pub fn start<K: Clock>(clock: &K) -> Self {
        Self {
            start_us: clock.now_us(),
        }
    }

    /// Elapsed microseconds, saturated to u32
    pub fn elapsed_us<K: Clock>(&self, clock: &K) -> u32 {
        clock.elapsed_us(self.start_us).min(u32::MAX as u64) as u32
    }
}
