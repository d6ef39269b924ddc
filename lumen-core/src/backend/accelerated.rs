//! Accelerated backend: commands from the CPU, pixels by DMA
//!
//! Construction refuses any setup in which a full-width band could not be
//! moved as one aligned transfer. Bands that still fail the alignment
//! check at flush time (narrow rectangles with an odd byte count) are
//! written by the CPU after the pipeline has drained, so they never
//! interleave with a running transfer.

use embedded_hal::delay::DelayNs;
use lumen_hal::{Backlight, CacheControl, Clock, DmaChannel, ParallelBus};

use super::direct::{check_regions, stream_rect};
use super::panel::Panel;
use super::{DisplayBackend, FlushStats};
use crate::config::{BackendKind, DisplayConfig};
use crate::dma::{plan_jobs, DmaPipeline, PipelineStats};
use crate::driver::ProtocolDriver;
use crate::error::DisplayError;
use crate::framebuffer::PixelBuffer;
use crate::geometry::DirtyRect;

/// DMA-driven backend
pub struct AcceleratedBackend<'s, B, L, D, C, K, const N: usize>
where
    B: ParallelBus,
    L: Backlight,
    D: DmaChannel,
    C: CacheControl,
    K: Clock,
{
    panel: Panel<B, L>,
    pipeline: DmaPipeline<'s, D, C, K, N>,
    chunk_lines: u16,
}

impl<'s, B, L, D, C, K, const N: usize> AcceleratedBackend<'s, B, L, D, C, K, N>
where
    B: ParallelBus,
    L: Backlight,
    D: DmaChannel,
    C: CacheControl,
    K: Clock,
{
    /// Build the backend, failing fast on an unusable DMA setup
    pub fn new(
        driver: ProtocolDriver<B>,
        backlight: L,
        pipeline: DmaPipeline<'s, D, C, K, N>,
        config: &DisplayConfig,
    ) -> Result<Self, DisplayError> {
        config.validate()?;
        if pipeline.slot_capacity() < config.chunk_bytes() {
            return Err(DisplayError::BufferTooSmall);
        }
        let unit = config.alignment_unit as usize;
        if config.chunk_bytes() % unit != 0 || !pipeline.slots_aligned() {
            return Err(DisplayError::AlignmentViolation);
        }

        Ok(Self {
            panel: Panel::new(driver, backlight, config),
            pipeline,
            chunk_lines: config.transfer_chunk_lines,
        })
    }

    pub fn panel(&self) -> &Panel<B, L> {
        &self.panel
    }

    pub fn pipeline_stats(&self) -> PipelineStats {
        self.pipeline.stats()
    }
}

impl<'s, B, L, D, C, K, const N: usize> DisplayBackend for AcceleratedBackend<'s, B, L, D, C, K, N>
where
    B: ParallelBus,
    L: Backlight,
    D: DmaChannel,
    C: CacheControl,
    K: Clock,
{
    fn init(&mut self, delay: &mut impl DelayNs) -> Result<(), DisplayError> {
        self.panel.init(delay);
        Ok(())
    }

    fn flush(&mut self, regions: &[DirtyRect], frame: &PixelBuffer<'_>) -> Result<FlushStats, DisplayError> {
        self.panel.ensure_initialized()?;
        let driver = self.panel.driver_mut();
        check_regions(regions, frame, driver.width(), driver.height())?;

        let unit = self.pipeline.alignment_unit();
        let mut stats = FlushStats::default();
        for rect in regions.iter().filter(|r| !r.is_empty()) {
            for job in plan_jobs(rect, frame.width(), self.chunk_lines, unit) {
                if self.pipeline.accepts(&job) {
                    self.pipeline.submit(driver, &job, frame)?;
                    stats.jobs += 1;
                } else {
                    self.pipeline.drain()?;
                    driver.wait_idle();
                    stream_rect(driver, &job.rect(), frame)?;
                    stats.cpu_bands += 1;
                }
            }
            stats.regions += 1;
            stats.pixels += rect.area();
        }

        self.pipeline.drain()?;
        driver.wait_idle();
        Ok(stats)
    }

    fn set_power(&mut self, on: bool, delay: &mut impl DelayNs) -> Result<(), DisplayError> {
        // Never change panel state under a running transfer
        self.pipeline.drain()?;
        self.panel.set_power(on, delay)
    }

    fn set_brightness(&mut self, percent: u8) -> Result<(), DisplayError> {
        self.panel.set_brightness(percent);
        Ok(())
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Accelerated
    }
}
