//! Dirty region tracking
//!
//! Records which parts of the screen changed since the last flush. The
//! tracked set always covers exactly the modified pixels: rectangles are
//! only combined when their bounding box adds no pixels, and partial
//! overlaps are resolved by keeping just the uncovered remainder of the
//! new rectangle. When the set would grow past its capacity it collapses
//! to one rectangle bounding everything touched this frame.

use heapless::Vec;

use crate::config::{ConfigError, DisplayConfig, MAX_DIRTY_RECTS};
use crate::geometry::DirtyRect;

/// Pending pieces while inserting one rectangle
const WORK_STACK: usize = 64;

/// Dirty region tracker
#[derive(Debug, Clone)]
pub struct DirtyRegionTracker {
    rects: Vec<DirtyRect, MAX_DIRTY_RECTS>,
    capacity: usize,
    width: u16,
    height: u16,
    /// Bounding box of every rectangle marked since the last clear
    frame_bounds: Option<DirtyRect>,
    collapsed: bool,
    full_frame: bool,
    total_merges: u32,
    total_collapses: u32,
}

impl DirtyRegionTracker {
    /// Create a tracker for a `width` x `height` panel
    ///
    /// # Arguments
    /// * `capacity` - Rectangles kept before collapsing (1..=16)
    pub fn new(width: u16, height: u16, capacity: usize) -> Result<Self, ConfigError> {
        if capacity == 0 || capacity > MAX_DIRTY_RECTS {
            return Err(ConfigError::DirtyCapacity);
        }
        Ok(Self {
            rects: Vec::new(),
            capacity,
            width,
            height,
            frame_bounds: None,
            collapsed: false,
            full_frame: false,
            total_merges: 0,
            total_collapses: 0,
        })
    }

    /// Create a tracker sized from the display configuration
    pub fn from_config(config: &DisplayConfig) -> Result<Self, ConfigError> {
        Self::new(
            config.width,
            config.height,
            config.dirty_rect_capacity as usize,
        )
    }

    /// Record that the pixels of `rect` changed
    ///
    /// The rectangle is clipped to the panel first; nothing is recorded if
    /// no pixel remains.
    pub fn mark_dirty(&mut self, rect: DirtyRect) {
        let Some(rect) = rect.clip(self.width, self.height) else {
            return;
        };

        let bounds = match self.frame_bounds {
            Some(b) => b.bounding(&rect),
            None => rect,
        };
        self.frame_bounds = Some(bounds);

        if self.full_frame {
            return;
        }
        if self.collapsed {
            self.set_single(bounds);
            return;
        }

        self.insert_exact(rect);
    }

    /// Tracked regions, pairwise disjoint unless the set collapsed
    pub fn regions(&self) -> &[DirtyRect] {
        &self.rects
    }

    /// Forget everything, after a successful flush
    pub fn clear(&mut self) {
        self.rects.clear();
        self.frame_bounds = None;
        self.collapsed = false;
        self.full_frame = false;
    }

    /// Mark the whole panel dirty (screen transitions)
    pub fn force_full_frame(&mut self) {
        let full = DirtyRect::full(self.width, self.height);
        self.set_single(full);
        self.frame_bounds = Some(full);
        self.full_frame = true;
    }

    /// Nothing changed this frame
    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    /// Number of tracked rectangles
    pub fn len(&self) -> usize {
        self.rects.len()
    }

    /// Configured capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The set was replaced by the full panel
    pub fn is_full_frame(&self) -> bool {
        self.full_frame
    }

    /// The set overflowed and now holds one bounding rectangle
    pub fn is_collapsed(&self) -> bool {
        self.collapsed
    }

    /// Bounding box of every rectangle marked this frame
    pub fn bounds(&self) -> Option<DirtyRect> {
        self.frame_bounds
    }

    /// Pixels that will be flushed
    pub fn dirty_area(&self) -> u32 {
        self.rects.iter().map(|r| r.area()).sum()
    }

    /// Rectangle pairs combined since boot
    pub fn total_merges(&self) -> u32 {
        self.total_merges
    }

    /// Capacity overflows since boot
    pub fn total_collapses(&self) -> u32 {
        self.total_collapses
    }

    fn set_single(&mut self, rect: DirtyRect) {
        self.rects.clear();
        // Capacity is at least one
        let _ = self.rects.push(rect);
    }

    fn collapse(&mut self) {
        if let Some(bounds) = self.frame_bounds {
            self.set_single(bounds);
        }
        self.collapsed = true;
        self.total_collapses = self.total_collapses.wrapping_add(1);
    }

    fn insert_exact(&mut self, rect: DirtyRect) {
        let mut pending: Vec<DirtyRect, WORK_STACK> = Vec::new();
        let _ = pending.push(rect);

        while let Some(piece) = pending.pop() {
            // Already covered
            if self.rects.iter().any(|r| r.contains(&piece)) {
                continue;
            }

            // Combine when the bounding box adds no pixels; may cascade
            if let Some(idx) = self.rects.iter().position(|r| r.merges_exactly(&piece)) {
                let merged = self.rects.swap_remove(idx).bounding(&piece);
                self.total_merges = self.total_merges.wrapping_add(1);
                if pending.push(merged).is_err() {
                    self.collapse();
                    return;
                }
                continue;
            }

            // Partial overlap: keep only the part not yet tracked
            if let Some(existing) = self.rects.iter().find(|r| r.intersects(&piece)).copied() {
                for rest in piece.subtract(&existing).into_iter().flatten() {
                    if pending.push(rest).is_err() {
                        self.collapse();
                        return;
                    }
                }
                continue;
            }

            if self.rects.len() >= self.capacity {
                self.collapse();
                return;
            }
            let _ = self.rects.push(piece);
        }
    }
}
