//! RP2040 implementations of the Lumen hardware traits
//!
//! - [`bus::PioParallelBus`] - 8080 write bus clocked by a PIO state machine
//! - [`dma::RpDmaChannel`] - DMA channel feeding the bus TX FIFO
//! - [`cache::RpCache`] - memory barrier before DMA submission
//! - [`backlight::PwmBacklight`] - PWM-dimmed backlight
//! - [`clock::RpClock`] - embassy-time clock that feeds the watchdog while it waits
//!
//! # Bus wiring
//!
//! ```text
//!   GPIO base+0..base+7 ── D0..D7   (PIO out pins, consecutive)
//!   GPIO wr            ── WR       (PIO side-set)
//!   GPIO dc            ── DC       (plain output, switched only when idle)
//!   GPIO cs / rst      ── CS / RST (plain outputs, optional)
//! ```

#![no_std]

pub mod backlight;
pub mod bus;
pub mod cache;
pub mod clock;
pub mod dma;

pub use backlight::PwmBacklight;
pub use bus::{PioBlock, PioParallelBus};
pub use cache::RpCache;
pub use clock::{feed_watchdog, install_watchdog, RpClock};
pub use dma::RpDmaChannel;
