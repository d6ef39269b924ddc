//! Draw primitives for the UI
//!
//! A [`Scene`] draws through a [`Canvas`]. Each primitive records a
//! [`DrawCommand`] and marks the pixels it will write as dirty; the commands
//! reach the pixel buffer in the render phase of the same tick.

use embedded_graphics::mono_font::ascii::FONT_6X10;
use embedded_graphics::mono_font::{MonoTextStyle, MonoTextStyleBuilder};
use embedded_graphics::pixelcolor::raw::RawU16;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::{Dimensions, Point};
use embedded_graphics::text::{Baseline, Text};
use embedded_graphics::Drawable;
use heapless::{String, Vec};

use crate::dirty::DirtyRegionTracker;
use crate::framebuffer::{rect_from_eg, PixelBuffer};
use crate::geometry::DirtyRect;

/// Longest text run one command carries, in bytes
pub const MAX_TEXT_LEN: usize = 40;

/// Commands buffered before they are applied early
pub const DRAW_QUEUE_LEN: usize = 32;

/// One recorded draw primitive
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawCommand {
    /// Solid rectangle (already clipped to the panel)
    Fill { rect: DirtyRect, color: u16 },
    /// One line of text with an opaque background
    Text {
        x: u16,
        y: u16,
        text: String<MAX_TEXT_LEN>,
        fg: u16,
        bg: u16,
    },
}

fn color(raw: u16) -> Rgb565 {
    Rgb565::from(RawU16::new(raw))
}

fn text_style(fg: u16, bg: u16) -> MonoTextStyle<'static, Rgb565> {
    // Background is opaque so every cell in the bounding box is written
    MonoTextStyleBuilder::new()
        .font(&FONT_6X10)
        .text_color(color(fg))
        .background_color(color(bg))
        .build()
}

/// Draw commands waiting for the render phase
#[derive(Debug, Default)]
pub struct DrawQueue {
    commands: Vec<DrawCommand, DRAW_QUEUE_LEN>,
    applied_early: u32,
}

impl DrawQueue {
    pub const fn new() -> Self {
        Self {
            commands: Vec::new(),
            applied_early: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Times the queue filled up and was applied before the render phase
    pub fn applied_early(&self) -> u32 {
        self.applied_early
    }

    /// Write every queued command into `frame`, oldest first
    ///
    /// Returns the number of commands applied.
    pub fn apply(&mut self, frame: &mut PixelBuffer<'_>) -> usize {
        let count = self.commands.len();
        for command in self.commands.iter() {
            match command {
                DrawCommand::Fill { rect, color } => frame.fill_rect(rect, *color),
                DrawCommand::Text { x, y, text, fg, bg } => {
                    let origin = Point::new(*x as i32, *y as i32);
                    let _ = Text::with_baseline(text, origin, text_style(*fg, *bg), Baseline::Top)
                        .draw(frame);
                }
            }
        }
        self.commands.clear();
        count
    }

    /// Discard everything queued
    pub fn clear(&mut self) {
        self.commands.clear();
    }

    fn push(&mut self, command: DrawCommand, frame: &mut PixelBuffer<'_>) {
        if let Err(command) = self.commands.push(command) {
            self.applied_early += 1;
            self.apply(frame);
            // Just emptied
            let _ = self.commands.push(command);
        }
    }
}

/// Drawing surface handed to a [`Scene`] for one tick
pub struct Canvas<'c, 'b> {
    frame: &'c mut PixelBuffer<'b>,
    tracker: &'c mut DirtyRegionTracker,
    queue: &'c mut DrawQueue,
}

impl<'c, 'b> Canvas<'c, 'b> {
    pub fn new(
        frame: &'c mut PixelBuffer<'b>,
        tracker: &'c mut DirtyRegionTracker,
        queue: &'c mut DrawQueue,
    ) -> Self {
        Self {
            frame,
            tracker,
            queue,
        }
    }

    /// Panel width
    pub fn width(&self) -> u16 {
        self.frame.width()
    }

    /// Panel height
    pub fn height(&self) -> u16 {
        self.frame.height()
    }

    /// Set one pixel
    pub fn set_pixel(&mut self, x: u16, y: u16, color: u16) {
        self.fill_rect(x, y, 1, 1, color);
    }

    /// Fill a rectangle; the part outside the panel is dropped
    pub fn fill_rect(&mut self, x: u16, y: u16, width: u16, height: u16, color: u16) {
        let Some(rect) = DirtyRect::new(x, y, width, height).clip(self.width(), self.height()) else {
            return;
        };
        self.queue.push(DrawCommand::Fill { rect, color }, self.frame);
        self.tracker.mark_dirty(rect);
    }

    /// Horizontal line of `len` pixels
    pub fn hline(&mut self, x: u16, y: u16, len: u16, color: u16) {
        self.fill_rect(x, y, len, 1, color);
    }

    /// Vertical line of `len` pixels
    pub fn vline(&mut self, x: u16, y: u16, len: u16, color: u16) {
        self.fill_rect(x, y, 1, len, color);
    }

    /// One-pixel rectangle outline
    pub fn draw_rect(&mut self, x: u16, y: u16, width: u16, height: u16, color: u16) {
        if width == 0 || height == 0 {
            return;
        }
        let right = x.saturating_add(width - 1);
        let bottom = y.saturating_add(height - 1);
        self.hline(x, y, width, color);
        if height > 1 {
            self.hline(x, bottom, width, color);
        }
        if height > 2 {
            self.vline(x, y + 1, height - 2, color);
            if width > 1 {
                self.vline(right, y + 1, height - 2, color);
            }
        }
    }

    /// Draw one line of text with its top-left corner at (x, y)
    ///
    /// Stops at the first newline and at [`MAX_TEXT_LEN`] bytes. Returns
    /// the rectangle marked dirty, empty if nothing landed on the panel.
    pub fn draw_text(&mut self, x: u16, y: u16, text: &str, fg: u16, bg: u16) -> DirtyRect {
        let mut line: String<MAX_TEXT_LEN> = String::new();
        for ch in text.chars().take_while(|&c| c != '\n') {
            if line.push(ch).is_err() {
                break;
            }
        }

        let origin = Point::new(x as i32, y as i32);
        let area = Text::with_baseline(&line, origin, text_style(fg, bg), Baseline::Top).bounding_box();
        let Some(rect) = rect_from_eg(&area).clip(self.width(), self.height()) else {
            return DirtyRect::default();
        };

        self.queue.push(
            DrawCommand::Text {
                x,
                y,
                text: line,
                fg,
                bg,
            },
            self.frame,
        );
        self.tracker.mark_dirty(rect);
        rect
    }

    /// Paint the whole panel and schedule a full-frame flush
    pub fn fill_screen(&mut self, color: u16) {
        let rect = DirtyRect::full(self.width(), self.height());
        self.queue.push(DrawCommand::Fill { rect, color }, self.frame);
        self.tracker.force_full_frame();
    }

    /// Repaint the whole panel on the next flush (screen transitions)
    pub fn force_full_frame(&mut self) {
        self.tracker.force_full_frame();
    }
}

/// UI collaborator: draws whatever changed since the previous tick
pub trait Scene {
    fn draw(&mut self, canvas: &mut Canvas<'_, '_>);
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_protocol::pixel::colors;

    fn tracker(w: u16, h: u16) -> DirtyRegionTracker {
        DirtyRegionTracker::new(w, h, 16).unwrap()
    }

    #[test]
    fn test_set_pixel_marks_single_pixel() {
        let mut storage = [0u16; 320 * 170];
        let mut frame = PixelBuffer::new(&mut storage, 320, 170).unwrap();
        let mut tracker = tracker(320, 170);
        let mut queue = DrawQueue::new();

        Canvas::new(&mut frame, &mut tracker, &mut queue).set_pixel(10, 10, colors::WHITE);

        assert_eq!(tracker.regions(), &[DirtyRect::new(10, 10, 1, 1)]);
        // Buffer untouched until the render phase
        assert_eq!(frame.get_pixel(10, 10), Some(0));
        assert_eq!(queue.apply(&mut frame), 1);
        assert_eq!(frame.get_pixel(10, 10), Some(colors::WHITE));
    }

    #[test]
    fn test_offscreen_draws_are_ignored() {
        let mut storage = [0u16; 64];
        let mut frame = PixelBuffer::new(&mut storage, 8, 8).unwrap();
        let mut tracker = tracker(8, 8);
        let mut queue = DrawQueue::new();
        let mut canvas = Canvas::new(&mut frame, &mut tracker, &mut queue);

        canvas.set_pixel(8, 0, colors::RED);
        canvas.fill_rect(2, 2, 0, 5, colors::RED);
        assert_eq!(canvas.draw_text(100, 100, "x", colors::RED, 0), DirtyRect::default());

        assert!(tracker.is_empty());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_draw_rect_outline() {
        let mut storage = [0u16; 100];
        let mut frame = PixelBuffer::new(&mut storage, 10, 10).unwrap();
        let mut tracker = tracker(10, 10);
        let mut queue = DrawQueue::new();

        Canvas::new(&mut frame, &mut tracker, &mut queue).draw_rect(1, 1, 4, 4, 7);
        queue.apply(&mut frame);

        assert_eq!(tracker.dirty_area(), 12);
        assert_eq!(frame.get_pixel(1, 1), Some(7));
        assert_eq!(frame.get_pixel(4, 4), Some(7));
        assert_eq!(frame.get_pixel(2, 2), Some(0));
    }

    #[test]
    fn test_text_marks_cell_box() {
        let mut storage = [0u16; 64 * 32];
        let mut frame = PixelBuffer::new(&mut storage, 64, 32).unwrap();
        let mut tracker = tracker(64, 32);
        let mut queue = DrawQueue::new();

        let rect = Canvas::new(&mut frame, &mut tracker, &mut queue).draw_text(2, 3, "Hi\nthere", 0xFFFF, 0x0001);
        assert_eq!(rect, DirtyRect::new(2, 3, 12, 10));
        assert_eq!(tracker.regions(), &[rect]);

        queue.apply(&mut frame);
        // Opaque background covers the whole box
        for y in rect.y..=rect.y_end() {
            for x in rect.x..=rect.x_end() {
                assert_ne!(frame.get_pixel(x, y), Some(0));
            }
        }
        assert_eq!(frame.get_pixel(14, 3), Some(0));
    }

    #[test]
    fn test_full_queue_is_applied_early() {
        let mut storage = [0u16; 64 * 8];
        let mut frame = PixelBuffer::new(&mut storage, 64, 8).unwrap();
        let mut tracker = tracker(64, 8);
        let mut queue = DrawQueue::new();
        let mut canvas = Canvas::new(&mut frame, &mut tracker, &mut queue);

        for x in 0..(DRAW_QUEUE_LEN as u16 + 1) {
            canvas.set_pixel(x, 0, 5);
        }

        assert_eq!(queue.applied_early(), 1);
        assert_eq!(queue.len(), 1);
        assert_eq!(frame.get_pixel(0, 0), Some(5));
        assert_eq!(frame.get_pixel(DRAW_QUEUE_LEN as u16, 0), Some(0));
    }

    #[test]
    fn test_fill_screen_forces_full_frame() {
        let mut storage = [0u16; 16];
        let mut frame = PixelBuffer::new(&mut storage, 4, 4).unwrap();
        let mut tracker = tracker(4, 4);
        let mut queue = DrawQueue::new();

        let mut canvas = Canvas::new(&mut frame, &mut tracker, &mut queue);
        canvas.fill_screen(colors::BLUE);
        canvas.set_pixel(1, 1, colors::RED);

        assert!(tracker.is_full_frame());
        assert_eq!(tracker.regions(), &[DirtyRect::full(4, 4)]);
        queue.apply(&mut frame);
        assert_eq!(frame.get_pixel(0, 0), Some(colors::BLUE));
        assert_eq!(frame.get_pixel(1, 1), Some(colors::RED));
    }
}
