//! Telemetry task (core 1)
//!
//! Logs a counter snapshot once per interval. Reads only the shared
//! atomics, never the render loop itself.

use defmt::*;
use embassy_time::{Duration, Ticker};

use lumen_core::PerformanceCounters;

/// Report interval in milliseconds
pub const REPORT_INTERVAL_MS: u64 = 5_000;

#[embassy_executor::task]
pub async fn telemetry_task(counters: &'static PerformanceCounters) {
    info!("Telemetry task started");

    let mut ticker = Ticker::every(Duration::from_millis(REPORT_INTERVAL_MS));
    let mut last_dropped = 0;

    loop {
        ticker.next().await;

        let s = counters.snapshot();
        info!(
            "fps={}.{} frames={} skips={} render={}us flush={}us (max {}us) px={}",
            s.fps_x10 / 10,
            s.fps_x10 % 10,
            s.frame_count,
            s.skip_count,
            s.render_time_us,
            s.flush_time_us,
            s.max_flush_time_us,
            s.pixels_flushed
        );
        debug!(
            "dirty: {} merges, {} collapses, {} regions sent",
            s.dirty_merges, s.dirty_collapses, s.regions_flushed
        );

        if s.dropped_frames != last_dropped {
            warn!(
                "{} frames dropped since last report",
                s.dropped_frames.wrapping_sub(last_dropped)
            );
            last_dropped = s.dropped_frames;
        }
    }
}
