//! Display backends
//!
//! One capability, two drive strategies, chosen once at boot:
//!
//! ```text
//!                      ┌────────────────┐
//!   RenderLoop ──────▶ │    Backend     │
//!                      └───────┬────────┘
//!               ┌──────────────┴──────────────┐
//!               ▼                             ▼
//!     ┌──────────────────┐         ┌────────────────────┐
//!     │  DirectBackend   │         │ AcceleratedBackend │
//!     │ CPU strobes all  │         │ CPU: commands      │
//!     │ bytes            │         │ DMA: pixel bands   │
//!     └──────────────────┘         └────────────────────┘
//! ```
//!
//! There is no failover between them at runtime. A board whose accelerated
//! path misbehaves is rebuilt with the direct backend.

mod accelerated;
mod direct;
mod panel;

pub use accelerated::AcceleratedBackend;
pub use direct::DirectBackend;
pub use panel::Panel;

use embedded_hal::delay::DelayNs;
use lumen_hal::{Backlight, CacheControl, Clock, DmaChannel, ParallelBus};

use crate::config::{BackendKind, DisplayConfig};
use crate::dma::{DmaPipeline, PipelineStats};
use crate::driver::ProtocolDriver;
use crate::error::DisplayError;
use crate::framebuffer::PixelBuffer;
use crate::geometry::DirtyRect;

/// What one flush put on the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FlushStats {
    /// Non-empty regions sent
    pub regions: u32,
    /// Pixels sent
    pub pixels: u32,
    /// Bands moved by DMA
    pub jobs: u32,
    /// Bands written by the CPU
    pub cpu_bands: u32,
}

/// Panel drive capability
pub trait DisplayBackend {
    /// Reset and configure the panel, then light the backlight
    fn init(&mut self, delay: &mut impl DelayNs) -> Result<(), DisplayError>;

    /// Send the pixels of `regions` from `frame` to the panel
    ///
    /// Returns once every byte has left the bus. Regions are screen
    /// coordinates and must lie inside the panel.
    fn flush(&mut self, regions: &[DirtyRect], frame: &PixelBuffer<'_>) -> Result<FlushStats, DisplayError>;

    /// Sleep (false) or wake (true) the panel
    fn set_power(&mut self, on: bool, delay: &mut impl DelayNs) -> Result<(), DisplayError>;

    /// Backlight level 0..=100, clamped
    fn set_brightness(&mut self, percent: u8) -> Result<(), DisplayError>;

    /// Which strategy this is
    fn kind(&self) -> BackendKind;
}

/// The backend selected at boot
pub enum Backend<'s, B, L, D, C, K, const N: usize>
where
    B: ParallelBus,
    L: Backlight,
    D: DmaChannel,
    C: CacheControl,
    K: Clock,
{
    Direct(DirectBackend<B, L>),
    Accelerated(AcceleratedBackend<'s, B, L, D, C, K, N>),
}

impl<'s, B, L, D, C, K, const N: usize> Backend<'s, B, L, D, C, K, N>
where
    B: ParallelBus,
    L: Backlight,
    D: DmaChannel,
    C: CacheControl,
    K: Clock,
{
    /// Build the backend named by `config.backend`
    ///
    /// # Arguments
    /// * `pipeline` - DMA resources; required for the accelerated backend
    ///   and dropped otherwise
    pub fn select(
        config: &DisplayConfig,
        driver: ProtocolDriver<B>,
        backlight: L,
        pipeline: Option<DmaPipeline<'s, D, C, K, N>>,
    ) -> Result<Self, DisplayError> {
        config.validate()?;
        let backend = match (config.backend, pipeline) {
            (BackendKind::Direct, _) => Backend::Direct(DirectBackend::new(driver, backlight, config)),
            (BackendKind::Accelerated, Some(pipeline)) => {
                Backend::Accelerated(AcceleratedBackend::new(driver, backlight, pipeline, config)?)
            }
            (BackendKind::Accelerated, None) => return Err(DisplayError::UnsupportedBackend),
        };
        info!("display backend: {}", backend.kind().as_str());
        Ok(backend)
    }

    /// DMA counters, if accelerated
    pub fn pipeline_stats(&self) -> Option<PipelineStats> {
        match self {
            Backend::Direct(_) => None,
            Backend::Accelerated(b) => Some(b.pipeline_stats()),
        }
    }

    /// Backlight level last requested
    pub fn brightness(&self) -> u8 {
        match self {
            Backend::Direct(b) => b.panel().brightness(),
            Backend::Accelerated(b) => b.panel().brightness(),
        }
    }

    /// Panel awake
    pub fn is_powered(&self) -> bool {
        match self {
            Backend::Direct(b) => b.panel().is_powered(),
            Backend::Accelerated(b) => b.panel().is_powered(),
        }
    }
}

impl<'s, B, L, D, C, K, const N: usize> DisplayBackend for Backend<'s, B, L, D, C, K, N>
where
    B: ParallelBus,
    L: Backlight,
    D: DmaChannel,
    C: CacheControl,
    K: Clock,
{
    fn init(&mut self, delay: &mut impl DelayNs) -> Result<(), DisplayError> {
        match self {
            Backend::Direct(b) => b.init(delay),
            Backend::Accelerated(b) => b.init(delay),
        }
    }

    fn flush(&mut self, regions: &[DirtyRect], frame: &PixelBuffer<'_>) -> Result<FlushStats, DisplayError> {
        match self {
            Backend::Direct(b) => b.flush(regions, frame),
            Backend::Accelerated(b) => b.flush(regions, frame),
        }
    }

    fn set_power(&mut self, on: bool, delay: &mut impl DelayNs) -> Result<(), DisplayError> {
        match self {
            Backend::Direct(b) => b.set_power(on, delay),
            Backend::Accelerated(b) => b.set_power(on, delay),
        }
    }

    fn set_brightness(&mut self, percent: u8) -> Result<(), DisplayError> {
        match self {
            Backend::Direct(b) => b.set_brightness(percent),
            Backend::Accelerated(b) => b.set_brightness(percent),
        }
    }

    fn kind(&self) -> BackendKind {
        match self {
            Backend::Direct(b) => b.kind(),
            Backend::Accelerated(b) => b.kind(),
        }
    }
}
