//! Board-agnostic display engine for parallel-bus LCD panels
//!
//! This crate contains everything between the UI's draw calls and the
//! panel's data lines that does not depend on a specific chip:
//!
//! - Dirty-region tracking with bounded merge/collapse
//! - Parallel-bus protocol driver (addressing windows, pixel streams)
//! - Direct and DMA-accelerated display backends
//! - Double-buffered DMA transfer pipeline with alignment checks
//! - Render loop state machine and performance telemetry
//! - Display configuration types and validation

#![no_std]
#![deny(unsafe_code)]

#[macro_use]
mod log;

pub mod backend;
pub mod canvas;
pub mod config;
pub mod dirty;
pub mod dma;
pub mod driver;
pub mod error;
pub mod framebuffer;
pub mod geometry;
pub mod patterns;
pub mod render;
pub mod telemetry;
pub mod timing;

#[cfg(test)]
pub(crate) mod mock;

pub use backend::{Backend, DisplayBackend, FlushStats};
pub use canvas::{Canvas, Scene};
pub use config::{BackendKind, ConfigError, DisplayConfig};
pub use dirty::DirtyRegionTracker;
pub use driver::ProtocolDriver;
pub use error::DisplayError;
pub use framebuffer::PixelBuffer;
pub use patterns::{Pattern, PatternScene};
pub use geometry::DirtyRect;
pub use render::{PowerRequest, RenderLoop, TickOutcome};
pub use telemetry::{PerformanceCounters, PerformanceSample};
