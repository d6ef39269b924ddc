//! Status dashboard drawn on the panel
//!
//! ```text
//!   ┌──────────────────────────────────────┐
//!   │ LUMEN                                │
//!   │ FPS      29.9                        │
//!   │ FRAMES   1234                        │
//!   │ DROPPED  0                           │
//!   │ FLUSH    2100 us                     │
//!   │                                      │
//!   │ ═══════════■═════════════════════    │  <- sweep marker
//!   └──────────────────────────────────────┘
//! ```
//!
//! The layout is painted once; afterwards only the numbers (once per
//! refresh interval) and the sweep marker change, so a typical tick flushes
//! a couple of small rectangles.

use core::fmt::Write;

use heapless::String;
use lumen_core::telemetry::PerformanceSample;
use lumen_core::{Canvas, PerformanceCounters, Scene};
use lumen_protocol::pixel::colors;

const MARGIN: u16 = 8;
const LINE_HEIGHT: u16 = 14;
const VALUE_X: u16 = 80;
const MARKER_WIDTH: u16 = 6;
const MARKER_HEIGHT: u16 = 8;
const MARKER_STEP: u16 = 2;

const LABELS: [&str; 4] = ["FPS", "FRAMES", "DROPPED", "FLUSH"];

/// Dashboard over the shared performance counters
pub struct Dashboard<'c> {
    counters: &'c PerformanceCounters,
    /// Ticks between number refreshes
    refresh_ticks: u32,
    laid_out: bool,
    shown: Option<PerformanceSample>,
    marker_x: u16,
    ticks: u32,
}

impl<'c> Dashboard<'c> {
    pub fn new(counters: &'c PerformanceCounters, refresh_ticks: u32) -> Self {
        Self {
            counters,
            refresh_ticks: refresh_ticks.max(1),
            laid_out: false,
            shown: None,
            marker_x: MARGIN,
            ticks: 0,
        }
    }

    fn track_y(canvas: &Canvas<'_, '_>) -> u16 {
        canvas.height().saturating_sub(MARGIN + MARKER_HEIGHT)
    }

    fn draw_layout(&mut self, canvas: &mut Canvas<'_, '_>) {
        canvas.fill_screen(colors::BLACK);
        canvas.draw_text(MARGIN, MARGIN, "LUMEN", colors::CYAN, colors::BLACK);
        for (i, label) in LABELS.iter().enumerate() {
            let y = MARGIN + LINE_HEIGHT * (i as u16 + 1);
            canvas.draw_text(MARGIN, y, label, colors::GRAY, colors::BLACK);
        }
        let track_y = Self::track_y(canvas);
        canvas.hline(
            MARGIN,
            track_y + MARKER_HEIGHT / 2,
            canvas.width().saturating_sub(2 * MARGIN),
            colors::GRAY,
        );
        self.laid_out = true;
    }

    fn draw_values(&mut self, canvas: &mut Canvas<'_, '_>, sample: PerformanceSample) {
        let mut text: String<16> = String::new();
        let shown = self.shown;
        let changed = |f: fn(&PerformanceSample) -> u32| shown.map_or(true, |s| f(&s) != f(&sample));

        let rows: [(fn(&PerformanceSample) -> u32, bool); 4] = [
            (|s| s.fps_x10, true),
            (|s| s.frame_count, false),
            (|s| s.dropped_frames, false),
            (|s| s.flush_time_us, false),
        ];

        for (i, (field, tenths)) in rows.into_iter().enumerate() {
            if !changed(field) {
                continue;
            }
            let value = field(&sample);
            text.clear();
            // Fixed width so a shorter number overwrites a longer one
            let _ = if tenths {
                write!(text, "{:<10}", Tenths(value))
            } else {
                write!(text, "{:<10}", value)
            };
            let y = MARGIN + LINE_HEIGHT * (i as u16 + 1);
            let color = if i == 2 && value > 0 { colors::RED } else { colors::WHITE };
            canvas.draw_text(VALUE_X, y, &text, color, colors::BLACK);
        }
        self.shown = Some(sample);
    }

    fn advance_marker(&mut self, canvas: &mut Canvas<'_, '_>) {
        let track_y = Self::track_y(canvas);
        let track_end = canvas.width().saturating_sub(MARGIN + MARKER_WIDTH);

        // Erase by restoring the track under the old marker
        canvas.fill_rect(self.marker_x, track_y, MARKER_WIDTH, MARKER_HEIGHT, colors::BLACK);
        canvas.hline(self.marker_x, track_y + MARKER_HEIGHT / 2, MARKER_WIDTH, colors::GRAY);

        self.marker_x += MARKER_STEP;
        if self.marker_x > track_end {
            self.marker_x = MARGIN;
        }
        canvas.fill_rect(self.marker_x, track_y, MARKER_WIDTH, MARKER_HEIGHT, colors::YELLOW);
    }
}

impl Scene for Dashboard<'_> {
    fn draw(&mut self, canvas: &mut Canvas<'_, '_>) {
        if !self.laid_out {
            self.draw_layout(canvas);
        }
        if self.ticks % self.refresh_ticks == 0 {
            let sample = self.counters.snapshot();
            self.draw_values(canvas, sample);
        }
        self.advance_marker(canvas);
        self.ticks = self.ticks.wrapping_add(1);
    }
}

/// Fixed-point tenths, printed as `12.3`
struct Tenths(u32);

impl core::fmt::Display for Tenths {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut text: String<12> = String::new();
        write!(text, "{}.{}", self.0 / 10, self.0 % 10)?;
        f.pad(&text)
    }
}
