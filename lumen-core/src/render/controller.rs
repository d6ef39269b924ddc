//! Render loop controller
//!
//! Owns the frame buffer, the dirty tracker and the selected backend; the
//! only path from the UI to the panel. Runs on one core and never waits on
//! another: power requests are cached and applied at the start of the next
//! tick.

use lumen_hal::Clock;

use super::phase::{PhaseEvent, RenderPhase};
use crate::backend::{DisplayBackend, FlushStats};
use crate::canvas::{Canvas, DrawQueue, Scene};
use crate::config::{ConfigError, DisplayConfig};
use crate::dirty::DirtyRegionTracker;
use crate::error::DisplayError;
use crate::framebuffer::PixelBuffer;
use crate::telemetry::{ErrorLog, FpsWindow, PerformanceCounters};
use crate::timing::{ClockDelay, Stopwatch};

/// Backlight and sleep state requested by the power policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PowerRequest {
    pub on: bool,
    /// 0..=100
    pub brightness: u8,
}

/// Result of one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TickOutcome {
    /// Nothing was dirty; the backend was not touched
    Skipped,
    /// Dirty regions were flushed
    Rendered(FlushStats),
    /// The flush failed; the previous image stays on the panel
    Dropped(DisplayError),
}

/// Render loop over a selected backend
pub struct RenderLoop<'f, 'c, Bk: DisplayBackend, K: Clock> {
    backend: Bk,
    frame: PixelBuffer<'f>,
    tracker: DirtyRegionTracker,
    queue: DrawQueue,
    clock: K,
    counters: &'c PerformanceCounters,
    fps: FpsWindow,
    errors: ErrorLog,
    phase: RenderPhase,
    pending_power: Option<PowerRequest>,
    ticks: u32,
}

impl<'f, 'c, Bk: DisplayBackend, K: Clock> RenderLoop<'f, 'c, Bk, K> {
    /// Assemble the loop; `frame` must match the configured panel size
    pub fn new(
        backend: Bk,
        frame: PixelBuffer<'f>,
        config: &DisplayConfig,
        clock: K,
        counters: &'c PerformanceCounters,
    ) -> Result<Self, DisplayError> {
        if frame.width() != config.width || frame.height() != config.height {
            return Err(ConfigError::Geometry.into());
        }
        Ok(Self {
            backend,
            frame,
            tracker: DirtyRegionTracker::from_config(config)?,
            queue: DrawQueue::new(),
            clock,
            counters,
            fps: FpsWindow::new(),
            errors: ErrorLog::new(),
            phase: RenderPhase::Idle,
            pending_power: None,
            ticks: 0,
        })
    }

    /// Bring up the panel and schedule a full repaint
    pub fn init(&mut self) -> Result<(), DisplayError> {
        self.backend.init(&mut ClockDelay(&mut self.clock))?;
        self.tracker.force_full_frame();
        info!("render loop ready, {} backend", self.backend.kind().as_str());
        Ok(())
    }

    /// Cache a power request; the newest one wins
    pub fn apply_power(&mut self, request: PowerRequest) {
        self.pending_power = Some(request);
    }

    /// Repaint everything on the next tick
    pub fn force_full_frame(&mut self) {
        self.tracker.force_full_frame();
    }

    /// Run one Collect/Decide/Render/Flush iteration
    pub fn tick(&mut self, scene: &mut impl Scene) -> TickOutcome {
        self.ticks = self.ticks.wrapping_add(1);
        self.phase = self.phase.transition(PhaseEvent::TickStarted);
        self.forward_power();

        scene.draw(&mut Canvas::new(&mut self.frame, &mut self.tracker, &mut self.queue));
        self.phase = self.phase.transition(PhaseEvent::Collected);

        let outcome = if self.tracker.is_empty() {
            self.counters.record_skip();
            self.phase = self.phase.transition(PhaseEvent::NothingDirty);
            TickOutcome::Skipped
        } else {
            self.phase = self.phase.transition(PhaseEvent::DirtyFound);
            self.render_and_flush()
        };

        self.counters
            .set_tracker_stats(self.tracker.total_merges(), self.tracker.total_collapses());
        if let Some(fps_x10) = self.fps.update(self.clock.now_us()) {
            self.counters.set_fps_x10(fps_x10);
        }
        outcome
    }

    fn render_and_flush(&mut self) -> TickOutcome {
        let render = Stopwatch::start(&self.clock);
        self.queue.apply(&mut self.frame);
        let render_us = render.elapsed_us(&self.clock);
        self.phase = self.phase.transition(PhaseEvent::Rendered);

        let flush = Stopwatch::start(&self.clock);
        let result = self.backend.flush(self.tracker.regions(), &self.frame);
        let flush_us = flush.elapsed_us(&self.clock);

        match result {
            Ok(stats) => {
                self.tracker.clear();
                self.counters
                    .record_frame(render_us, flush_us, stats.regions, stats.pixels);
                self.fps.frame();
                self.phase = self.phase.transition(PhaseEvent::Flushed);
                TickOutcome::Rendered(stats)
            }
            Err(err) => {
                self.counters.record_dropped(render_us, flush_us);
                self.errors.push(self.ticks, err);
                error!("frame {} dropped: {}", self.ticks, err);
                // A timed-out frame is retried as-is; anything else may have
                // left the panel in an unknown state, so repaint it all
                if !err.is_transient() {
                    self.tracker.force_full_frame();
                }
                self.phase = self.phase.transition(PhaseEvent::FlushFailed);
                TickOutcome::Dropped(err)
            }
        }
    }

    fn forward_power(&mut self) {
        let Some(request) = self.pending_power.take() else {
            return;
        };
        if let Err(err) = self.apply_power_now(request) {
            warn!("power request failed: {}", err);
            self.errors.push(self.ticks, err);
        }
    }

    fn apply_power_now(&mut self, request: PowerRequest) -> Result<(), DisplayError> {
        self.backend.set_brightness(request.brightness)?;
        self.backend
            .set_power(request.on, &mut ClockDelay(&mut self.clock))
    }

    pub fn phase(&self) -> RenderPhase {
        self.phase
    }

    /// Ticks run since construction
    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    pub fn tracker(&self) -> &DirtyRegionTracker {
        &self.tracker
    }

    pub fn errors(&self) -> &ErrorLog {
        &self.errors
    }

    pub fn counters(&self) -> &PerformanceCounters {
        self.counters
    }

    pub fn frame(&self) -> &PixelBuffer<'f> {
        &self.frame
    }

    pub fn backend(&self) -> &Bk {
        &self.backend
    }

    pub fn clock(&self) -> &K {
        &self.clock
    }
}
