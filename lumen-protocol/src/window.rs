//! Addressing window encoding
//!
//! CASET and RASET each carry four parameter bytes: start coordinate high
//! byte, start low byte, end high byte, end low byte. Both ends are
//! inclusive.

/// Encode an inclusive coordinate range as CASET/RASET parameters
pub const fn coordinate_params(start: u16, end: u16) -> [u8; 4] {
    let [start_hi, start_lo] = start.to_be_bytes();
    let [end_hi, end_lo] = end.to_be_bytes();
    [start_hi, start_lo, end_hi, end_lo]
}

/// Inclusive panel RAM window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AddressWindow {
    pub x0: u16,
    pub y0: u16,
    pub x1: u16,
    pub y1: u16,
}

impl AddressWindow {
    /// Create a window from inclusive corners
    pub const fn new(x0: u16, y0: u16, x1: u16, y1: u16) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Shift the window by the panel's RAM offset
    ///
    /// Modules whose glass is smaller than the controller RAM (170 of 240
    /// rows on 1.9" modules) map screen row 0 to a non-zero RAM row.
    pub const fn offset(self, dx: u16, dy: u16) -> Self {
        Self {
            x0: self.x0 + dx,
            y0: self.y0 + dy,
            x1: self.x1 + dx,
            y1: self.y1 + dy,
        }
    }

    /// Start is not past end on either axis
    pub const fn is_ordered(&self) -> bool {
        self.x0 <= self.x1 && self.y0 <= self.y1
    }

    /// Width in pixels
    pub const fn width(&self) -> u16 {
        self.x1 - self.x0 + 1
    }

    /// Height in pixels
    pub const fn height(&self) -> u16 {
        self.y1 - self.y0 + 1
    }

    /// Number of pixels RAMWR expects after this window
    pub const fn pixel_count(&self) -> u32 {
        self.width() as u32 * self.height() as u32
    }

    /// CASET parameter bytes
    pub const fn caset(&self) -> [u8; 4] {
        coordinate_params(self.x0, self.x1)
    }

    /// RASET parameter bytes
    pub const fn raset(&self) -> [u8; 4] {
        coordinate_params(self.y0, self.y1)
    }

    /// Rebuild a window from captured CASET/RASET parameters
    pub const fn from_params(caset: [u8; 4], raset: [u8; 4]) -> Self {
        Self {
            x0: u16::from_be_bytes([caset[0], caset[1]]),
            x1: u16::from_be_bytes([caset[2], caset[3]]),
            y0: u16::from_be_bytes([raset[0], raset[1]]),
            y1: u16::from_be_bytes([raset[2], raset[3]]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_single_pixel_window() {
        let w = AddressWindow::new(10, 10, 10, 10);
        assert_eq!(w.caset(), [0x00, 0x0A, 0x00, 0x0A]);
        assert_eq!(w.raset(), [0x00, 0x0A, 0x00, 0x0A]);
        assert_eq!(w.pixel_count(), 1);
    }

    #[test]
    fn test_high_byte_carried() {
        // Full landscape width: 0..=319
        assert_eq!(coordinate_params(0, 319), [0x00, 0x00, 0x01, 0x3F]);
    }

    #[test]
    fn test_offset_applies_to_both_ends() {
        let w = AddressWindow::new(0, 0, 319, 169).offset(0, 35);
        assert_eq!(w, AddressWindow::new(0, 35, 319, 204));
        assert_eq!(w.raset(), [0x00, 0x23, 0x00, 0xCC]);
        assert_eq!(w.height(), 170);
    }

    #[test]
    fn test_ordering() {
        assert!(AddressWindow::new(5, 5, 5, 5).is_ordered());
        assert!(!AddressWindow::new(6, 0, 5, 0).is_ordered());
        assert!(!AddressWindow::new(0, 9, 0, 8).is_ordered());
    }

    proptest! {
        #[test]
        fn params_are_big_endian_pairs(start in 0u16..=u16::MAX, end in 0u16..=u16::MAX) {
            let p = coordinate_params(start, end);
            prop_assert_eq!((p[0] as u16) << 8 | p[1] as u16, start);
            prop_assert_eq!((p[2] as u16) << 8 | p[3] as u16, end);
        }
    }
}
