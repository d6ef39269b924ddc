//! Monotonic time source
//!
//! Used for render/flush timing and for bounded waits on hardware that has
//! no completion interrupt.

/// Monotonic microsecond clock
pub trait Clock {
    /// Microseconds since an arbitrary fixed point
    fn now_us(&self) -> u64;

    /// Pause briefly while polling hardware
    ///
    /// Implementations may use the pause to service a watchdog.
    fn pause_us(&mut self, us: u32);

    /// Microseconds elapsed since `since`
    fn elapsed_us(&self, since: u64) -> u64 {
        self.now_us().saturating_sub(since)
    }
}
