//! Monotonic clock backed by embassy-time
//!
//! Waits are busy waits (`block_for`): the render loop owns core 0 and
//! never yields mid-flush. The watchdog is fed on every pause so a long
//! panel settle or a stuck DMA job cannot reset the chip on its own.

use core::cell::RefCell;

use embassy_rp::watchdog::Watchdog;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_time::{block_for, Duration, Instant};
use lumen_hal::Clock;

static WATCHDOG: Mutex<CriticalSectionRawMutex, RefCell<Option<Watchdog>>> =
    Mutex::new(RefCell::new(None));

/// Hand the started watchdog over to the clock
pub fn install_watchdog(watchdog: Watchdog) {
    WATCHDOG.lock(|wd| wd.replace(Some(watchdog)));
}

/// Feed the watchdog, if one is installed
pub fn feed_watchdog() {
    WATCHDOG.lock(|wd| {
        if let Some(wd) = wd.borrow_mut().as_mut() {
            wd.feed();
        }
    });
}

/// Microsecond clock; cheap to copy into every component that waits
#[derive(Debug, Default, Clone, Copy)]
pub struct RpClock;

impl Clock for RpClock {
    fn now_us(&self) -> u64 {
        Instant::now().as_micros()
    }

    fn pause_us(&mut self, us: u32) {
        feed_watchdog();
        block_for(Duration::from_micros(us as u64));
    }
}
