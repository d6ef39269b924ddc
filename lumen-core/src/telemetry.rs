//! Performance telemetry
//!
//! The render loop updates [`PerformanceCounters`] once per tick; other
//! tasks (on either core) read a [`PerformanceSample`] snapshot whenever
//! they like. Individual counters are relaxed atomics, so a snapshot taken
//! mid-tick may mix two ticks. That is fine for a dashboard.

use heapless::HistoryBuffer;
use portable_atomic::{AtomicU32, Ordering};

use crate::error::DisplayError;

/// Length of the FPS averaging window
pub const FPS_WINDOW_US: u64 = 1_000_000;

/// Entries kept in the error log
pub const ERROR_LOG_LEN: usize = 8;

/// Point-in-time copy of the counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PerformanceSample {
    /// Ticks that reached the flush phase (dropped frames included)
    pub frame_count: u32,
    /// Ticks with nothing dirty
    pub skip_count: u32,
    /// Frames whose flush failed
    pub dropped_frames: u32,
    /// Render phase duration of the last frame
    pub render_time_us: u32,
    /// Flush phase duration of the last frame
    pub flush_time_us: u32,
    /// Longest flush since boot
    pub max_flush_time_us: u32,
    /// Pixels sent since boot
    pub pixels_flushed: u32,
    /// Regions sent since boot
    pub regions_flushed: u32,
    /// Frames per second times ten, over the last full window
    pub fps_x10: u32,
    /// Dirty rectangle merges since boot
    pub dirty_merges: u32,
    /// Dirty set collapses since boot
    pub dirty_collapses: u32,
}

impl PerformanceSample {
    /// Ticks observed
    pub fn ticks(&self) -> u32 {
        self.frame_count.wrapping_add(self.skip_count)
    }
}

/// Process-wide render counters
///
/// Meant to live in a `static`.
pub struct PerformanceCounters {
    frame_count: AtomicU32,
    skip_count: AtomicU32,
    dropped_frames: AtomicU32,
    render_time_us: AtomicU32,
    flush_time_us: AtomicU32,
    max_flush_time_us: AtomicU32,
    pixels_flushed: AtomicU32,
    regions_flushed: AtomicU32,
    fps_x10: AtomicU32,
    dirty_merges: AtomicU32,
    dirty_collapses: AtomicU32,
}

impl Default for PerformanceCounters {
    fn default() -> Self {
        Self::new()
    }
}

impl PerformanceCounters {
    pub const fn new() -> Self {
        Self {
            frame_count: AtomicU32::new(0),
            skip_count: AtomicU32::new(0),
            dropped_frames: AtomicU32::new(0),
            render_time_us: AtomicU32::new(0),
            flush_time_us: AtomicU32::new(0),
            max_flush_time_us: AtomicU32::new(0),
            pixels_flushed: AtomicU32::new(0),
            regions_flushed: AtomicU32::new(0),
            fps_x10: AtomicU32::new(0),
            dirty_merges: AtomicU32::new(0),
            dirty_collapses: AtomicU32::new(0),
        }
    }

    /// A tick found nothing dirty
    pub fn record_skip(&self) {
        self.skip_count.fetch_add(1, Ordering::Relaxed);
    }

    /// A tick rendered and flushed a frame
    pub fn record_frame(&self, render_us: u32, flush_us: u32, regions: u32, pixels: u32) {
        self.frame_count.fetch_add(1, Ordering::Relaxed);
        self.render_time_us.store(render_us, Ordering::Relaxed);
        self.flush_time_us.store(flush_us, Ordering::Relaxed);
        self.max_flush_time_us.fetch_max(flush_us, Ordering::Relaxed);
        self.regions_flushed.fetch_add(regions, Ordering::Relaxed);
        self.pixels_flushed.fetch_add(pixels, Ordering::Relaxed);
    }

    /// A tick rendered but its flush failed
    pub fn record_dropped(&self, render_us: u32, flush_us: u32) {
        self.frame_count.fetch_add(1, Ordering::Relaxed);
        self.dropped_frames.fetch_add(1, Ordering::Relaxed);
        self.render_time_us.store(render_us, Ordering::Relaxed);
        self.flush_time_us.store(flush_us, Ordering::Relaxed);
        self.max_flush_time_us.fetch_max(flush_us, Ordering::Relaxed);
    }

    pub fn set_fps_x10(&self, fps_x10: u32) {
        self.fps_x10.store(fps_x10, Ordering::Relaxed);
    }

    /// Mirror the tracker's lifetime totals
    pub fn set_tracker_stats(&self, merges: u32, collapses: u32) {
        self.dirty_merges.store(merges, Ordering::Relaxed);
        self.dirty_collapses.store(collapses, Ordering::Relaxed);
    }

    /// Read every counter
    pub fn snapshot(&self) -> PerformanceSample {
        PerformanceSample {
            frame_count: self.frame_count.load(Ordering::Relaxed),
            skip_count: self.skip_count.load(Ordering::Relaxed),
            dropped_frames: self.dropped_frames.load(Ordering::Relaxed),
            render_time_us: self.render_time_us.load(Ordering::Relaxed),
            flush_time_us: self.flush_time_us.load(Ordering::Relaxed),
            max_flush_time_us: self.max_flush_time_us.load(Ordering::Relaxed),
            pixels_flushed: self.pixels_flushed.load(Ordering::Relaxed),
            regions_flushed: self.regions_flushed.load(Ordering::Relaxed),
            fps_x10: self.fps_x10.load(Ordering::Relaxed),
            dirty_merges: self.dirty_merges.load(Ordering::Relaxed),
            dirty_collapses: self.dirty_collapses.load(Ordering::Relaxed),
        }
    }
}

/// Rendered frames per wall-clock second
///
/// Counts frames inside a window of [`FPS_WINDOW_US`] and publishes the
/// rate when the window closes. Skipped ticks are not frames.
#[derive(Debug, Clone, Copy)]
pub struct FpsWindow {
    start_us: Option<u64>,
    frames: u32,
}

impl FpsWindow {
    pub const fn new() -> Self {
        Self {
            start_us: None,
            frames: 0,
        }
    }

    /// Count a rendered frame
    pub fn frame(&mut self) {
        self.frames += 1;
    }

    /// Close the window if it has run its length
    ///
    /// Returns the rate (x10) of the window that just closed.
    pub fn update(&mut self, now_us: u64) -> Option<u32> {
        let start = *self.start_us.get_or_insert(now_us);
        let elapsed = now_us.saturating_sub(start);
        if elapsed < FPS_WINDOW_US {
            return None;
        }
        let fps_x10 = (self.frames as u64 * 10 * 1_000_000 / elapsed).min(u32::MAX as u64) as u32;
        self.start_us = Some(now_us);
        self.frames = 0;
        Some(fps_x10)
    }
}

impl Default for FpsWindow {
    fn default() -> Self {
        Self::new()
    }
}

/// Recent render errors, oldest overwritten first
pub struct ErrorLog {
    entries: HistoryBuffer<(u32, DisplayError), ERROR_LOG_LEN>,
    total: u32,
}

impl ErrorLog {
    pub const fn new() -> Self {
        Self {
            entries: HistoryBuffer::new(),
            total: 0,
        }
    }

    /// Record an error seen on `tick`
    pub fn push(&mut self, tick: u32, error: DisplayError) {
        self.entries.write((tick, error));
        self.total = self.total.wrapping_add(1);
    }

    /// Retained entries, oldest first
    pub fn recent(&self) -> impl Iterator<Item = &(u32, DisplayError)> + '_ {
        self.entries.oldest_ordered()
    }

    /// Most recent entry
    pub fn last(&self) -> Option<&(u32, DisplayError)> {
        self.entries.recent()
    }

    /// Retained entries equal to `error`
    pub fn count_of(&self, error: DisplayError) -> usize {
        self.entries.as_slice().iter().filter(|(_, e)| *e == error).count()
    }

    /// Errors recorded since boot, including overwritten ones
    pub fn total(&self) -> u32 {
        self.total
    }
}

impl Default for ErrorLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_snapshot() {
        let counters = PerformanceCounters::new();
        counters.record_skip();
        counters.record_frame(100, 2_000, 2, 50);
        counters.record_frame(120, 1_500, 1, 10);
        counters.record_dropped(90, 100_000);

        let s = counters.snapshot();
        assert_eq!(s.frame_count, 3);
        assert_eq!(s.skip_count, 1);
        assert_eq!(s.ticks(), 4);
        assert_eq!(s.dropped_frames, 1);
        assert_eq!(s.render_time_us, 90);
        assert_eq!(s.max_flush_time_us, 100_000);
        assert_eq!(s.pixels_flushed, 60);
        assert_eq!(s.regions_flushed, 3);
    }

    #[test]
    fn test_fps_window() {
        let mut fps = FpsWindow::new();
        assert_eq!(fps.update(0), None);
        for _ in 0..30 {
            fps.frame();
        }
        assert_eq!(fps.update(500_000), None);
        assert_eq!(fps.update(1_000_000), Some(300));

        // New window starts empty
        for _ in 0..15 {
            fps.frame();
        }
        assert_eq!(fps.update(3_000_000), Some(75));
    }

    #[test]
    fn test_error_log_keeps_last_eight() {
        let mut log = ErrorLog::new();
        for tick in 0..10 {
            log.push(tick, DisplayError::TransferTimeout);
        }
        log.push(10, DisplayError::InvalidCoordinates);

        assert_eq!(log.total(), 11);
        assert_eq!(log.recent().count(), ERROR_LOG_LEN);
        assert_eq!(log.recent().next(), Some(&(3, DisplayError::TransferTimeout)));
        assert_eq!(log.last(), Some(&(10, DisplayError::InvalidCoordinates)));
        assert_eq!(log.count_of(DisplayError::TransferTimeout), 7);
    }
}
