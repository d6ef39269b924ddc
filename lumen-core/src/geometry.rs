//! Screen rectangles

use lumen_protocol::AddressWindow;

/// Axis-aligned screen rectangle
///
/// Origin top-left, `width`/`height` in pixels. A rectangle with zero width
/// or height covers no pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DirtyRect {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl DirtyRect {
    /// Create a rectangle
    pub const fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The whole panel
    pub const fn full(width: u16, height: u16) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Build from half-open bounds `[x0, x1) x [y0, y1)`
    const fn from_bounds(x0: u32, y0: u32, x1: u32, y1: u32) -> Self {
        Self::new(x0 as u16, y0 as u16, (x1 - x0) as u16, (y1 - y0) as u16)
    }

    /// Covers no pixels
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Exclusive right edge
    pub const fn right(&self) -> u32 {
        self.x as u32 + self.width as u32
    }

    /// Exclusive bottom edge
    pub const fn bottom(&self) -> u32 {
        self.y as u32 + self.height as u32
    }

    /// Inclusive last column
    pub const fn x_end(&self) -> u16 {
        (self.right() - 1) as u16
    }

    /// Inclusive last row
    pub const fn y_end(&self) -> u16 {
        (self.bottom() - 1) as u16
    }

    /// Pixel count
    pub const fn area(&self) -> u32 {
        self.width as u32 * self.height as u32
    }

    /// Contains the pixel (px, py)
    pub const fn contains_point(&self, px: u16, py: u16) -> bool {
        (px as u32) >= self.x as u32
            && (px as u32) < self.right()
            && (py as u32) >= self.y as u32
            && (py as u32) < self.bottom()
    }

    /// Every pixel of `other` is inside `self`
    pub const fn contains(&self, other: &DirtyRect) -> bool {
        other.is_empty()
            || (other.x >= self.x
                && other.y >= self.y
                && other.right() <= self.right()
                && other.bottom() <= self.bottom())
    }

    /// Share at least one pixel
    pub const fn intersects(&self, other: &DirtyRect) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && (self.x as u32) < other.right()
            && (other.x as u32) < self.right()
            && (self.y as u32) < other.bottom()
            && (other.y as u32) < self.bottom()
    }

    /// Overlap or share an edge (corner contact does not count)
    pub const fn touches(&self, other: &DirtyRect) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        let x_overlap = (self.x as u32) < other.right() && (other.x as u32) < self.right();
        let y_overlap = (self.y as u32) < other.bottom() && (other.y as u32) < self.bottom();
        let x_contact = (self.x as u32) <= other.right() && (other.x as u32) <= self.right();
        let y_contact = (self.y as u32) <= other.bottom() && (other.y as u32) <= self.bottom();
        (x_overlap && y_contact) || (y_overlap && x_contact)
    }

    /// Smallest rectangle containing both
    pub fn bounding(&self, other: &DirtyRect) -> DirtyRect {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        DirtyRect::from_bounds(
            self.x.min(other.x) as u32,
            self.y.min(other.y) as u32,
            self.right().max(other.right()),
            self.bottom().max(other.bottom()),
        )
    }

    /// Shared pixels, if any
    pub fn intersection(&self, other: &DirtyRect) -> Option<DirtyRect> {
        if !self.intersects(other) {
            return None;
        }
        Some(DirtyRect::from_bounds(
            self.x.max(other.x) as u32,
            self.y.max(other.y) as u32,
            self.right().min(other.right()),
            self.bottom().min(other.bottom()),
        ))
    }

    /// Clip to a `width` x `height` panel, `None` if nothing remains
    pub fn clip(&self, width: u16, height: u16) -> Option<DirtyRect> {
        self.intersection(&DirtyRect::full(width, height))
    }

    /// The bounding box of the pair covers exactly their union
    ///
    /// True when one contains the other, or when they span the same columns
    /// and touch vertically, or span the same rows and touch horizontally.
    pub fn merges_exactly(&self, other: &DirtyRect) -> bool {
        if self.contains(other) || other.contains(self) {
            return true;
        }
        if !self.touches(other) {
            return false;
        }
        let same_columns = self.x == other.x && self.width == other.width;
        let same_rows = self.y == other.y && self.height == other.height;
        same_columns || same_rows
    }

    /// Split `self` minus `other` into at most four disjoint pieces
    ///
    /// Pieces are returned top band, bottom band, left and right slices of
    /// the middle band. Empty pieces are `None`.
    pub fn subtract(&self, other: &DirtyRect) -> [Option<DirtyRect>; 4] {
        let Some(cut) = self.intersection(other) else {
            return [Some(*self), None, None, None];
        };

        let (x0, y0, x1, y1) = (self.x as u32, self.y as u32, self.right(), self.bottom());
        let (cx0, cy0, cx1, cy1) = (cut.x as u32, cut.y as u32, cut.right(), cut.bottom());

        let piece = |ax: u32, ay: u32, bx: u32, by: u32| {
            if ax < bx && ay < by {
                Some(DirtyRect::from_bounds(ax, ay, bx, by))
            } else {
                None
            }
        };

        [
            piece(x0, y0, x1, cy0),
            piece(x0, cy1, x1, y1),
            piece(x0, cy0, cx0, cy1),
            piece(cx1, cy0, x1, cy1),
        ]
    }

    /// Panel RAM window for this rectangle (inclusive corners)
    pub const fn window(&self) -> AddressWindow {
        AddressWindow::new(self.x, self.y, self.x_end(), self.y_end())
    }

    /// Band of `rows` rows starting `row_offset` rows into this rectangle
    pub fn band(&self, row_offset: u16, rows: u16) -> DirtyRect {
        let start = self.y as u32 + row_offset as u32;
        let end = (start + rows as u32).min(self.bottom());
        DirtyRect::from_bounds(self.x as u32, start, self.right(), end.max(start))
    }
}
