//! Direct backend: every pixel byte goes through the CPU
//!
//! Slow but dependable; the protocol driver strobes each byte itself. Used
//! as the boot default until the accelerated path has been signed off for a
//! given board.

use embedded_hal::delay::DelayNs;
use lumen_hal::{Backlight, ParallelBus};

use super::panel::Panel;
use super::{DisplayBackend, FlushStats};
use crate::config::{BackendKind, DisplayConfig};
use crate::driver::ProtocolDriver;
use crate::error::DisplayError;
use crate::framebuffer::PixelBuffer;
use crate::geometry::DirtyRect;

/// Reject any region that does not fit both the frame and the panel
pub(crate) fn check_regions(
    regions: &[DirtyRect],
    frame: &PixelBuffer<'_>,
    panel_width: u16,
    panel_height: u16,
) -> Result<(), DisplayError> {
    let width = frame.width().min(panel_width) as u32;
    let height = frame.height().min(panel_height) as u32;
    for rect in regions.iter().filter(|r| !r.is_empty()) {
        if rect.right() > width || rect.bottom() > height {
            return Err(DisplayError::InvalidCoordinates);
        }
    }
    Ok(())
}

/// Address `rect` and stream its pixels row by row
pub(crate) fn stream_rect<B: ParallelBus>(
    driver: &mut ProtocolDriver<B>,
    rect: &DirtyRect,
    frame: &PixelBuffer<'_>,
) -> Result<(), DisplayError> {
    driver.set_window(rect)?;
    for y in rect.y..=rect.y_end() {
        driver.write_pixels(frame.span(rect, y));
    }
    Ok(())
}

/// CPU-driven backend
pub struct DirectBackend<B: ParallelBus, L: Backlight> {
    panel: Panel<B, L>,
}

impl<B: ParallelBus, L: Backlight> DirectBackend<B, L> {
    pub fn new(driver: ProtocolDriver<B>, backlight: L, config: &DisplayConfig) -> Self {
        Self {
            panel: Panel::new(driver, backlight, config),
        }
    }

    pub fn panel(&self) -> &Panel<B, L> {
        &self.panel
    }
}

impl<B: ParallelBus, L: Backlight> DisplayBackend for DirectBackend<B, L> {
    fn init(&mut self, delay: &mut impl DelayNs) -> Result<(), DisplayError> {
        self.panel.init(delay);
        Ok(())
    }

    fn flush(&mut self, regions: &[DirtyRect], frame: &PixelBuffer<'_>) -> Result<FlushStats, DisplayError> {
        self.panel.ensure_initialized()?;
        let driver = self.panel.driver_mut();
        check_regions(regions, frame, driver.width(), driver.height())?;

        let mut stats = FlushStats::default();
        for rect in regions.iter().filter(|r| !r.is_empty()) {
            stream_rect(driver, rect, frame)?;
            stats.regions += 1;
            stats.pixels += rect.area();
            stats.cpu_bands += 1;
        }
        driver.wait_idle();
        Ok(stats)
    }

    fn set_power(&mut self, on: bool, delay: &mut impl DelayNs) -> Result<(), DisplayError> {
        self.panel.set_power(on, delay)
    }

    fn set_brightness(&mut self, percent: u8) -> Result<(), DisplayError> {
        self.panel.set_brightness(percent);
        Ok(())
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Direct
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::mock::{HwLog, MockBacklight, MockBus, MockDelay};
    use lumen_protocol::AddressWindow;
    use std::vec::Vec;

    fn backend(log: &HwLog) -> DirectBackend<MockBus, MockBacklight> {
        let cfg = DisplayConfig::new();
        let driver = ProtocolDriver::new(MockBus::new(log), &cfg);
        let mut backend = DirectBackend::new(driver, MockBacklight::default(), &cfg);
        backend.init(&mut MockDelay::default()).unwrap();
        log.clear();
        backend
    }

    #[test]
    fn test_single_pixel_flush_addresses_that_pixel() {
        let log = HwLog::default();
        let mut backend = backend(&log);
        let mut storage = std::vec![0u16; 320 * 170];
        let mut frame = PixelBuffer::new(&mut storage, 320, 170).unwrap();
        frame.set_pixel(10, 10, 0xABCD);

        let stats = backend.flush(&[DirtyRect::new(10, 10, 1, 1)], &frame).unwrap();

        assert_eq!(stats.regions, 1);
        assert_eq!(stats.pixels, 1);
        // Row offset of the panel RAM is applied on the wire
        let streams = log.pixel_streams();
        assert_eq!(streams, [(AddressWindow::new(10, 45, 10, 45), std::vec![0xAB, 0xCD])]);
    }

    #[test]
    fn test_flush_sends_exactly_the_regions() {
        let log = HwLog::default();
        let mut backend = backend(&log);
        let mut storage = std::vec![0u16; 320 * 170];
        let mut frame = PixelBuffer::new(&mut storage, 320, 170).unwrap();
        fill_pattern(&mut frame);
        let regions = [DirtyRect::new(0, 0, 4, 2), DirtyRect::new(100, 50, 3, 3)];

        let stats = backend.flush(&regions, &frame).unwrap();

        assert_eq!(stats.pixels, 17);
        let streams = log.pixel_streams();
        assert_eq!(streams.len(), 2);
        for ((window, bytes), rect) in streams.iter().zip(regions.iter()) {
            assert_eq!(*window, AddressWindow::new(rect.x, rect.y + 35, rect.x_end(), rect.y_end() + 35));
            let mut expected = Vec::new();
            for y in rect.y..=rect.y_end() {
                for &p in frame.span(rect, y) {
                    expected.extend_from_slice(&p.to_be_bytes());
                }
            }
            assert_eq!(*bytes, expected);
        }
        assert_eq!(log.bus_bytes(), 2 * 11 + 34);
    }

    fn fill_pattern(frame: &mut PixelBuffer<'_>) {
        for y in 0..frame.height() {
            for x in 0..frame.width() {
                frame.set_pixel(x, y, x.wrapping_mul(31) ^ y.wrapping_mul(7));
            }
        }
    }

    #[test]
    fn test_out_of_bounds_region_is_rejected_before_writes() {
        let log = HwLog::default();
        let mut backend = backend(&log);
        let mut storage = std::vec![0u16; 320 * 170];
        let frame = PixelBuffer::new(&mut storage, 320, 170).unwrap();

        let regions = [DirtyRect::new(0, 0, 2, 2), DirtyRect::new(319, 169, 2, 1)];
        assert_eq!(backend.flush(&regions, &frame), Err(DisplayError::InvalidCoordinates));
        assert!(log.events().is_empty());
    }

    #[test]
    fn test_flush_before_init_is_rejected() {
        let log = HwLog::default();
        let cfg = DisplayConfig::new();
        let driver = ProtocolDriver::new(MockBus::new(&log), &cfg);
        let mut backend = DirectBackend::new(driver, MockBacklight::default(), &cfg);
        let mut storage = std::vec![0u16; 320 * 170];
        let frame = PixelBuffer::new(&mut storage, 320, 170).unwrap();

        assert_eq!(
            backend.flush(&[DirtyRect::new(0, 0, 1, 1)], &frame),
            Err(DisplayError::NotInitialized)
        );
    }
}
