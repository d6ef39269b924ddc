//! RGB565 frame buffer
//!
//! Holds what the panel should show once the pending dirty regions are
//! flushed. Pixels are native-endian `u16`; byte order for the wire is
//! applied when they are streamed or copied into a DMA slot.

use core::convert::Infallible;

use embedded_graphics::pixelcolor::{IntoStorage, Rgb565};
use embedded_graphics::prelude::{Dimensions, DrawTarget, OriginDimensions, Pixel, Size};
use embedded_graphics::primitives::Rectangle;

use crate::error::DisplayError;
use crate::geometry::DirtyRect;

/// Frame buffer over borrowed pixel storage
pub struct PixelBuffer<'a> {
    pixels: &'a mut [u16],
    width: u16,
    height: u16,
}

impl<'a> PixelBuffer<'a> {
    /// Wrap `pixels` as a `width` x `height` frame
    ///
    /// Storage may be larger than needed; the excess is unused.
    pub fn new(pixels: &'a mut [u16], width: u16, height: u16) -> Result<Self, DisplayError> {
        if pixels.len() < width as usize * height as usize {
            return Err(DisplayError::BufferTooSmall);
        }
        Ok(Self {
            pixels,
            width,
            height,
        })
    }

    /// Width in pixels
    pub fn width(&self) -> u16 {
        self.width
    }

    /// Height in pixels
    pub fn height(&self) -> u16 {
        self.height
    }

    /// Whole frame, row-major
    pub fn pixels(&self) -> &[u16] {
        &self.pixels[..self.width as usize * self.height as usize]
    }

    /// Index of the pixel at (x, y)
    pub fn offset(&self, x: u16, y: u16) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// One full row; `y` must be inside the frame
    pub fn row(&self, y: u16) -> &[u16] {
        let start = self.offset(0, y);
        &self.pixels[start..start + self.width as usize]
    }

    /// Pixels of `rect` on row `y`
    ///
    /// `rect` must lie inside the frame and `y` inside `rect`.
    pub fn span(&self, rect: &DirtyRect, y: u16) -> &[u16] {
        let start = self.offset(rect.x, y);
        &self.pixels[start..start + rect.width as usize]
    }

    /// Pixel at (x, y), if inside the frame
    pub fn get_pixel(&self, x: u16, y: u16) -> Option<u16> {
        if x < self.width && y < self.height {
            Some(self.pixels[self.offset(x, y)])
        } else {
            None
        }
    }

    /// Set one pixel; ignored outside the frame
    pub fn set_pixel(&mut self, x: u16, y: u16, color: u16) {
        if x < self.width && y < self.height {
            let idx = self.offset(x, y);
            self.pixels[idx] = color;
        }
    }

    /// Fill a rectangle, clipped to the frame
    pub fn fill_rect(&mut self, rect: &DirtyRect, color: u16) {
        let Some(rect) = rect.clip(self.width, self.height) else {
            return;
        };
        for y in rect.y..=rect.y_end() {
            let start = self.offset(rect.x, y);
            self.pixels[start..start + rect.width as usize].fill(color);
        }
    }

    /// Fill the whole frame
    pub fn fill(&mut self, color: u16) {
        let len = self.width as usize * self.height as usize;
        self.pixels[..len].fill(color);
    }

    /// Frame bounds as a rectangle
    pub fn bounds(&self) -> DirtyRect {
        DirtyRect::full(self.width, self.height)
    }
}

/// Convert an embedded-graphics rectangle, clamping negative origins
pub(crate) fn rect_from_eg(area: &Rectangle) -> DirtyRect {
    let x0 = area.top_left.x.max(0) as u32;
    let y0 = area.top_left.y.max(0) as u32;
    let x1 = (area.top_left.x as i64 + area.size.width as i64).max(0) as u32;
    let y1 = (area.top_left.y as i64 + area.size.height as i64).max(0) as u32;
    let clamp = |v: u32| v.min(u16::MAX as u32) as u16;
    DirtyRect::new(
        clamp(x0),
        clamp(y0),
        clamp(x1.saturating_sub(x0)),
        clamp(y1.saturating_sub(y0)),
    )
}

impl OriginDimensions for PixelBuffer<'_> {
    fn size(&self) -> Size {
        Size::new(self.width as u32, self.height as u32)
    }
}

impl DrawTarget for PixelBuffer<'_> {
    type Color = Rgb565;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if point.x >= 0 && point.y >= 0 && point.x <= u16::MAX as i32 && point.y <= u16::MAX as i32 {
                self.set_pixel(point.x as u16, point.y as u16, color.into_storage());
            }
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let area = area.intersection(&self.bounding_box());
        self.fill_rect(&rect_from_eg(&area), color.into_storage());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::prelude::{Point, Primitive, RgbColor};
    use embedded_graphics::primitives::PrimitiveStyle;
    use embedded_graphics::Drawable;

    #[test]
    fn test_too_small_storage_is_rejected() {
        let mut storage = [0u16; 15];
        assert_eq!(
            PixelBuffer::new(&mut storage, 4, 4).err(),
            Some(DisplayError::BufferTooSmall)
        );
    }

    #[test]
    fn test_fill_rect_is_clipped() {
        let mut storage = [0u16; 16];
        let mut fb = PixelBuffer::new(&mut storage, 4, 4).unwrap();
        fb.fill_rect(&DirtyRect::new(2, 2, 10, 10), 0xFFFF);

        assert_eq!(fb.get_pixel(1, 1), Some(0));
        assert_eq!(fb.get_pixel(3, 3), Some(0xFFFF));
        assert_eq!(fb.get_pixel(4, 4), None);
        assert_eq!(fb.pixels().iter().filter(|&&p| p == 0xFFFF).count(), 4);
    }

    #[test]
    fn test_span_returns_row_slice() {
        let mut storage = [0u16; 12];
        let mut fb = PixelBuffer::new(&mut storage, 4, 3).unwrap();
        fb.set_pixel(1, 2, 7);
        fb.set_pixel(2, 2, 8);
        assert_eq!(fb.span(&DirtyRect::new(1, 0, 2, 3), 2), &[7, 8]);
    }

    #[test]
    fn test_draw_target_writes_rgb565() {
        let mut storage = [0u16; 64];
        let mut fb = PixelBuffer::new(&mut storage, 8, 8).unwrap();
        Rectangle::new(Point::new(-2, -2), Size::new(4, 4))
            .into_styled(PrimitiveStyle::with_fill(Rgb565::RED))
            .draw(&mut fb)
            .unwrap();

        assert_eq!(fb.get_pixel(0, 0), Some(0xF800));
        assert_eq!(fb.get_pixel(1, 1), Some(0xF800));
        assert_eq!(fb.get_pixel(2, 2), Some(0));
    }

    #[test]
    fn test_rect_from_eg_clamps_negative_origin() {
        let r = rect_from_eg(&Rectangle::new(Point::new(-3, 2), Size::new(5, 4)));
        assert_eq!(r, DirtyRect::new(0, 2, 2, 4));
    }
}
