//! Bring-up test patterns
//!
//! Each pattern answers one question about a new board: are the corners
//! where they should be (offsets, MADCTL), are the channels in RGB order,
//! does every column and row land (no skipped pixels at band edges).

use lumen_protocol::pixel::colors;

use crate::canvas::{Canvas, Scene};

/// One full-screen test image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Pattern {
    /// Red, green, blue and white marks in the four corners
    CornerPixels,
    /// Gray grid with a red cross at the origin
    Grid { spacing: u16 },
    /// Eight vertical bars: white, yellow, cyan, green, magenta, red, blue, black
    ColorBars,
    /// Red top, green bottom, blue left, yellow right
    Border { thickness: u16 },
    /// Red and green diagonals, three pixels wide
    Diagonals,
    /// Blue header band, red line at row 35, white center cross
    Offsets,
}

/// Patterns in the order a bring-up run shows them
pub const BRING_UP: [Pattern; 6] = [
    Pattern::CornerPixels,
    Pattern::Grid { spacing: 20 },
    Pattern::ColorBars,
    Pattern::Border { thickness: 4 },
    Pattern::Diagonals,
    Pattern::Offsets,
];

const BAR_COLORS: [u16; 8] = [
    colors::WHITE,
    colors::YELLOW,
    colors::CYAN,
    colors::GREEN,
    colors::MAGENTA,
    colors::RED,
    colors::BLUE,
    colors::BLACK,
];

impl Pattern {
    /// Paint the pattern over the whole panel
    pub fn draw(self, canvas: &mut Canvas<'_, '_>) {
        let w = canvas.width();
        let h = canvas.height();
        if w < 2 || h < 2 {
            return;
        }

        match self {
            Pattern::CornerPixels => {
                canvas.fill_screen(colors::BLACK);
                let corners = [
                    (0, 0, 1, 1, colors::RED),
                    (w - 1, 0, -1, 1, colors::GREEN),
                    (0, h - 1, 1, -1, colors::BLUE),
                    (w - 1, h - 1, -1, -1, colors::WHITE),
                ];
                for (x, y, dx, dy, color) in corners {
                    canvas.set_pixel(x, y, color);
                    canvas.set_pixel(x.wrapping_add_signed(dx), y, color);
                    canvas.set_pixel(x, y.wrapping_add_signed(dy), color);
                }
            }
            Pattern::Grid { spacing } => {
                canvas.fill_screen(colors::BLACK);
                let step = spacing.max(1) as usize;
                for x in (0..w).step_by(step) {
                    canvas.vline(x, 0, h, colors::GRAY);
                }
                for y in (0..h).step_by(step) {
                    canvas.hline(0, y, w, colors::GRAY);
                }
                canvas.hline(0, 0, 10, colors::RED);
                canvas.vline(0, 0, 10, colors::RED);
            }
            Pattern::ColorBars => {
                canvas.force_full_frame();
                let bar = w / BAR_COLORS.len() as u16;
                for (i, &color) in BAR_COLORS.iter().enumerate() {
                    let x = i as u16 * bar;
                    // Last bar takes the remainder
                    let width = if i == BAR_COLORS.len() - 1 { w - x } else { bar };
                    canvas.fill_rect(x, 0, width, h, color);
                }
            }
            Pattern::Border { thickness } => {
                let t = thickness.clamp(1, w.min(h) / 2);
                canvas.fill_screen(colors::BLACK);
                canvas.fill_rect(0, 0, w, t, colors::RED);
                canvas.fill_rect(0, h - t, w, t, colors::GREEN);
                canvas.fill_rect(0, 0, t, h, colors::BLUE);
                canvas.fill_rect(w - t, 0, t, h, colors::YELLOW);
            }
            Pattern::Diagonals => {
                canvas.fill_screen(colors::BLACK);
                let steps = w.min(h) as u32;
                for i in 0..steps {
                    let x = (i * w as u32 / steps) as u16;
                    let y = (i * h as u32 / steps) as u16;
                    canvas.fill_rect(x.saturating_sub(1), y, 3, 1, colors::RED);
                    canvas.fill_rect((w - 1 - x).saturating_sub(1), y, 3, 1, colors::GREEN);
                }
            }
            Pattern::Offsets => {
                canvas.fill_screen(colors::BLACK);
                canvas.fill_rect(0, 0, w, 20, colors::BLUE);
                if h > 37 {
                    canvas.fill_rect(0, 35, w, 2, colors::RED);
                }
                let (cx, cy) = (w / 2, h / 2);
                canvas.hline(cx.saturating_sub(20), cy, 40, colors::WHITE);
                canvas.vline(cx, cy.saturating_sub(20), 40, colors::WHITE);
            }
        }
    }
}

/// Scene that cycles through patterns, holding each for a number of ticks
pub struct PatternScene<'p> {
    patterns: &'p [Pattern],
    hold_ticks: u32,
    index: usize,
    elapsed: u32,
    drawn: bool,
}

impl<'p> PatternScene<'p> {
    pub fn new(patterns: &'p [Pattern], hold_ticks: u32) -> Self {
        Self {
            patterns,
            hold_ticks: hold_ticks.max(1),
            index: 0,
            elapsed: 0,
            drawn: false,
        }
    }

    /// Pattern on screen (or about to be)
    pub fn current(&self) -> Option<Pattern> {
        self.patterns.get(self.index).copied()
    }
}

impl Scene for PatternScene<'_> {
    fn draw(&mut self, canvas: &mut Canvas<'_, '_>) {
        if self.patterns.is_empty() {
            return;
        }
        if self.drawn {
            self.elapsed += 1;
            if self.elapsed < self.hold_ticks {
                return;
            }
            self.index = (self.index + 1) % self.patterns.len();
            self.elapsed = 0;
        }
        self.patterns[self.index].draw(canvas);
        self.drawn = true;
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::canvas::DrawQueue;
    use crate::dirty::DirtyRegionTracker;
    use crate::framebuffer::PixelBuffer;
    use crate::geometry::DirtyRect;

    const W: u16 = 40;
    const H: u16 = 24;

    fn render(pattern: Pattern) -> (std::vec::Vec<u16>, DirtyRegionTracker) {
        let mut storage = std::vec![0x1111u16; W as usize * H as usize];
        let mut tracker = DirtyRegionTracker::new(W, H, 16).unwrap();
        {
            let mut frame = PixelBuffer::new(&mut storage, W, H).unwrap();
            let mut queue = DrawQueue::new();
            pattern.draw(&mut Canvas::new(&mut frame, &mut tracker, &mut queue));
            queue.apply(&mut frame);
        }
        (storage, tracker)
    }

    fn at(pixels: &[u16], x: u16, y: u16) -> u16 {
        pixels[y as usize * W as usize + x as usize]
    }

    #[test]
    fn test_corner_pixels() {
        let (px, tracker) = render(Pattern::CornerPixels);
        assert_eq!(at(&px, 0, 0), colors::RED);
        assert_eq!(at(&px, 1, 0), colors::RED);
        assert_eq!(at(&px, W - 1, 0), colors::GREEN);
        assert_eq!(at(&px, 0, H - 2), colors::BLUE);
        assert_eq!(at(&px, W - 1, H - 1), colors::WHITE);
        assert_eq!(at(&px, 5, 5), colors::BLACK);
        assert_eq!(tracker.regions(), &[DirtyRect::full(W, H)]);
    }

    #[test]
    fn test_color_bars_cover_width() {
        let (px, _) = render(Pattern::ColorBars);
        assert_eq!(at(&px, 0, 0), colors::WHITE);
        assert_eq!(at(&px, 5, 10), colors::YELLOW);
        assert_eq!(at(&px, W - 1, H - 1), colors::BLACK);
        assert!(!px.contains(&0x1111));
    }

    #[test]
    fn test_border_sides() {
        let (px, _) = render(Pattern::Border { thickness: 2 });
        assert_eq!(at(&px, 10, 0), colors::RED);
        assert_eq!(at(&px, 10, H - 1), colors::GREEN);
        assert_eq!(at(&px, 0, 10), colors::BLUE);
        assert_eq!(at(&px, W - 1, 10), colors::YELLOW);
        assert_eq!(at(&px, 10, 10), colors::BLACK);
    }

    #[test]
    fn test_grid_marks_origin() {
        let (px, _) = render(Pattern::Grid { spacing: 10 });
        assert_eq!(at(&px, 5, 0), colors::RED);
        assert_eq!(at(&px, 0, 5), colors::RED);
        assert_eq!(at(&px, 20, 5), colors::GRAY);
        assert_eq!(at(&px, 5, 5), colors::BLACK);
    }

    #[test]
    fn test_scene_holds_then_advances() {
        let mut storage = std::vec![0u16; W as usize * H as usize];
        let mut frame = PixelBuffer::new(&mut storage, W, H).unwrap();
        let mut tracker = DirtyRegionTracker::new(W, H, 16).unwrap();
        let mut queue = DrawQueue::new();
        let patterns = [Pattern::CornerPixels, Pattern::ColorBars];
        let mut scene = PatternScene::new(&patterns, 2);

        let mut dirty = std::vec::Vec::new();
        for _ in 0..5 {
            scene.draw(&mut Canvas::new(&mut frame, &mut tracker, &mut queue));
            dirty.push(!tracker.is_empty());
            queue.apply(&mut frame);
            tracker.clear();
        }

        assert_eq!(dirty, [true, false, true, false, true]);
        assert_eq!(scene.current(), Some(Pattern::CornerPixels));
    }
}
