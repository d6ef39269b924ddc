//! Lumen Hardware Abstraction Layer
//!
//! This crate defines the hardware traits the display engine is written
//! against. Chip-specific HALs implement them, which keeps the rendering
//! logic testable on the host with mock hardware.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Render loop / backends (lumen-core)    │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  lumen-hal (this crate - traits)        │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ lumen-hal-    │       │  host mocks   │
//! │    rp2040     │       │  (unit tests) │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::OutputPin`] - Digital output
//! - [`bus::ParallelBus`] - 8080-style command/data bus
//! - [`dma::DmaChannel`], [`dma::CacheControl`] - Bulk transfer engine
//! - [`backlight::Backlight`] - Panel backlight
//! - [`clock::Clock`] - Monotonic time and bounded waits

#![no_std]
#![deny(unsafe_code)]

pub mod backlight;
pub mod bus;
pub mod clock;
pub mod dma;
pub mod gpio;

// Re-export key traits at crate root for convenience
pub use backlight::{Backlight, PinBacklight};
pub use bus::{GpioParallelBus, ParallelBus, BUS_WIDTH};
pub use clock::Clock;
pub use dma::{CacheControl, DmaChannel, DmaError};
pub use gpio::OutputPin;
