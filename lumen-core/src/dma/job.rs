//! Transfer jobs: one row band of a flush

use lumen_protocol::BYTES_PER_PIXEL;

use crate::error::DisplayError;
use crate::geometry::DirtyRect;

/// One band of an accelerated flush
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TransferJob {
    /// First panel row
    pub row_start: u16,
    /// Rows in the band
    pub row_count: u16,
    /// First panel column
    pub col_start: u16,
    /// Columns in the band
    pub col_count: u16,
    /// Index of the band's first pixel in the frame buffer
    pub source_offset: usize,
    /// Bytes on the wire
    pub length: usize,
    /// Required divisor of `length` and the slot base address
    pub alignment_unit: u16,
}

impl TransferJob {
    /// Job covering `band` of a frame `frame_width` pixels wide
    pub fn for_band(band: &DirtyRect, frame_width: u16, alignment_unit: u16) -> Self {
        Self {
            row_start: band.y,
            row_count: band.height,
            col_start: band.x,
            col_count: band.width,
            source_offset: band.y as usize * frame_width as usize + band.x as usize,
            length: band.area() as usize * BYTES_PER_PIXEL,
            alignment_unit,
        }
    }

    /// Panel area written by this job
    pub fn rect(&self) -> DirtyRect {
        DirtyRect::new(self.col_start, self.row_start, self.col_count, self.row_count)
    }

    /// Length is a multiple of the alignment unit
    pub fn is_aligned(&self) -> bool {
        self.alignment_unit != 0 && self.length % self.alignment_unit as usize == 0
    }

    /// Check length and buffer base against the alignment unit
    pub fn validate(&self, base_addr: usize) -> Result<(), DisplayError> {
        if !self.is_aligned() || base_addr % self.alignment_unit as usize != 0 {
            return Err(DisplayError::AlignmentViolation);
        }
        Ok(())
    }
}

/// Iterator over the bands of one rectangle
#[derive(Debug, Clone)]
pub struct JobPlan {
    rect: DirtyRect,
    frame_width: u16,
    chunk_lines: u16,
    alignment_unit: u16,
    next_row: u16,
}

impl Iterator for JobPlan {
    type Item = TransferJob;

    fn next(&mut self) -> Option<TransferJob> {
        if self.rect.is_empty() || self.next_row >= self.rect.height {
            return None;
        }
        let band = self.rect.band(self.next_row, self.chunk_lines);
        self.next_row += band.height;
        Some(TransferJob::for_band(&band, self.frame_width, self.alignment_unit))
    }
}

/// Split `rect` into bands of at most `chunk_lines` rows
pub fn plan_jobs(rect: &DirtyRect, frame_width: u16, chunk_lines: u16, alignment_unit: u16) -> JobPlan {
    JobPlan {
        rect: *rect,
        frame_width,
        chunk_lines: chunk_lines.max(1),
        alignment_unit,
        next_row: 0,
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use std::vec::Vec;

    #[test]
    fn test_tall_update_splits_into_three_jobs() {
        let jobs: Vec<_> = plan_jobs(&DirtyRect::new(0, 0, 320, 60), 320, 20, 4).collect();

        assert_eq!(jobs.len(), 3);
        for (i, job) in jobs.iter().enumerate() {
            assert_eq!(job.row_start, i as u16 * 20);
            assert_eq!(job.row_count, 20);
            assert_eq!(job.col_count, 320);
            assert_eq!(job.length, 320 * 20 * 2);
            assert_eq!(job.source_offset, i * 20 * 320);
            assert!(job.is_aligned());
        }
    }

    #[test]
    fn test_last_band_is_short() {
        let jobs: Vec<_> = plan_jobs(&DirtyRect::new(5, 10, 8, 45), 320, 20, 4).collect();
        let rows: Vec<_> = jobs.iter().map(|j| (j.row_start, j.row_count)).collect();
        assert_eq!(rows, [(10, 20), (30, 20), (50, 5)]);
        assert_eq!(jobs[0].source_offset, 10 * 320 + 5);
    }

    #[test]
    fn test_bands_cover_rect_exactly() {
        let rect = DirtyRect::new(3, 7, 11, 33);
        let total: u32 = plan_jobs(&rect, 64, 4, 2).map(|j| j.rect().area()).sum();
        assert_eq!(total, rect.area());
    }

    #[test]
    fn test_empty_rect_plans_nothing() {
        assert_eq!(plan_jobs(&DirtyRect::new(0, 0, 0, 10), 320, 20, 4).count(), 0);
    }

    #[test]
    fn test_validate_alignment() {
        // 3 pixels = 6 bytes
        let job = TransferJob::for_band(&DirtyRect::new(0, 0, 3, 1), 320, 4);
        assert!(!job.is_aligned());
        assert_eq!(job.validate(0x2000_0000), Err(DisplayError::AlignmentViolation));

        let job = TransferJob::for_band(&DirtyRect::new(0, 0, 2, 1), 320, 4);
        assert_eq!(job.validate(0x2000_0000), Ok(()));
        assert_eq!(job.validate(0x2000_0002), Err(DisplayError::AlignmentViolation));
    }
}
