//! Display configuration
//!
//! Fixed at boot and immutable afterwards. There is no runtime backend
//! switch: a backend that misbehaves is replaced by rebuilding with a
//! different configuration.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use lumen_protocol::Orientation;

/// Storage for tracked dirty rectangles
pub const MAX_DIRTY_RECTS: usize = 16;

/// Number of DMA transfer slots (front/back)
pub const MAX_QUEUE_DEPTH: u8 = 2;

/// Largest alignment unit the pipeline supports, in bytes
pub const MAX_ALIGNMENT_UNIT: u16 = 64;

/// Largest chunk the pipeline accepts, in rows
pub const MAX_CHUNK_LINES: u16 = 200;

/// Bus clock limits
pub const MIN_CLOCK_HZ: u32 = 1_000_000;
pub const MAX_CLOCK_HZ: u32 = 48_000_000;

/// Tested bus clock presets
pub const CLOCK_PRESETS_HZ: [u32; 5] = [17_000_000, 24_000_000, 30_000_000, 40_000_000, 48_000_000];

/// Panel controller RAM size (columns, rows) in portrait order
pub const CONTROLLER_RAM: (u16, u16) = (240, 320);

/// Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Bus clock outside MIN_CLOCK_HZ..=MAX_CLOCK_HZ
    ClockOutOfRange,
    /// Chunk lines zero, above MAX_CHUNK_LINES, or taller than the panel
    ChunkLines,
    /// Queue depth not in 1..=MAX_QUEUE_DEPTH
    QueueDepth,
    /// Dirty rect capacity not in 1..=MAX_DIRTY_RECTS
    DirtyCapacity,
    /// Alignment unit not a power of two up to MAX_ALIGNMENT_UNIT
    AlignmentUnit,
    /// Panel size zero or window exceeds controller RAM
    Geometry,
    /// Zero timeout, or poll interval not shorter than the timeout
    Timeout,
    /// Unknown backend name
    UnknownBackend,
}

/// Display backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BackendKind {
    /// CPU drives every byte through the protocol driver
    #[default]
    Direct,
    /// Commands on the CPU, pixel bands through DMA
    Accelerated,
}

impl BackendKind {
    /// Parse a backend name as written in configuration files
    pub fn from_name(name: &str) -> Result<Self, ConfigError> {
        match name {
            "direct" | "gpio" => Ok(BackendKind::Direct),
            "accelerated" | "dma" => Ok(BackendKind::Accelerated),
            _ => Err(ConfigError::UnknownBackend),
        }
    }

    /// Configuration-file name
    pub const fn as_str(self) -> &'static str {
        match self {
            BackendKind::Direct => "direct",
            BackendKind::Accelerated => "accelerated",
        }
    }
}

/// Boot-time display configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DisplayConfig {
    /// Bus write clock in Hz
    pub clock_hz: u32,
    /// Maximum rows per DMA chunk
    pub transfer_chunk_lines: u16,
    /// DMA jobs allowed in flight or queued (1 = serialize)
    pub queue_depth: u8,
    /// Dirty rectangles tracked before collapsing to a bounding box
    pub dirty_rect_capacity: u8,
    /// Backend used for the lifetime of the process
    pub backend: BackendKind,
    /// DMA length/base alignment in bytes
    pub alignment_unit: u16,
    /// Deadline for one DMA job
    pub transfer_timeout_us: u32,
    /// Pause between completion polls
    pub poll_interval_us: u32,
    /// Visible width in pixels
    pub width: u16,
    /// Visible height in pixels
    pub height: u16,
    /// Column of the controller RAM mapped to screen x = 0
    pub x_offset: u16,
    /// Row of the controller RAM mapped to screen y = 0
    pub y_offset: u16,
    /// Memory access order
    pub orientation: Orientation,
    /// Send INVON during init (IPS glass)
    pub invert_colors: bool,
    /// Frame rate the render loop is paced at
    pub target_fps: u8,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayConfig {
    /// Defaults for a 1.9" 320x170 module in landscape
    pub const fn new() -> Self {
        Self {
            clock_hz: 17_000_000,
            transfer_chunk_lines: 20,
            queue_depth: 2,
            dirty_rect_capacity: MAX_DIRTY_RECTS as u8,
            backend: BackendKind::Direct,
            alignment_unit: 4,
            transfer_timeout_us: 100_000,
            poll_interval_us: 50,
            width: 320,
            height: 170,
            x_offset: 0,
            y_offset: 35,
            orientation: Orientation::Landscape,
            invert_colors: true,
            target_fps: 30,
        }
    }

    /// Known-good settings: slow clock, small serialized chunks
    pub const fn conservative() -> Self {
        let mut cfg = Self::new();
        cfg.clock_hz = 17_000_000;
        cfg.transfer_chunk_lines = 20;
        cfg.queue_depth = 1;
        cfg.target_fps = 15;
        cfg
    }

    /// Double-buffered DMA at a moderate clock
    pub const fn balanced() -> Self {
        let mut cfg = Self::new();
        cfg.clock_hz = 24_000_000;
        cfg.transfer_chunk_lines = 50;
        cfg.queue_depth = 2;
        cfg.backend = BackendKind::Accelerated;
        cfg.target_fps = 30;
        cfg
    }

    /// Highest clock with wide alignment
    ///
    /// Fast clocks only render cleanly with 64-byte aligned transfers.
    pub const fn max_throughput() -> Self {
        let mut cfg = Self::new();
        cfg.clock_hz = 40_000_000;
        cfg.transfer_chunk_lines = 100;
        cfg.queue_depth = 2;
        cfg.alignment_unit = 64;
        cfg.backend = BackendKind::Accelerated;
        cfg.target_fps = 60;
        cfg
    }

    /// Controller RAM (columns, rows) for the configured orientation
    pub const fn ram_size(&self) -> (u16, u16) {
        if self.orientation.is_landscape() {
            (CONTROLLER_RAM.1, CONTROLLER_RAM.0)
        } else {
            CONTROLLER_RAM
        }
    }

    /// Pixels on the panel
    pub const fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Bytes in one full-width chunk
    pub const fn chunk_bytes(&self) -> usize {
        self.width as usize * self.transfer_chunk_lines as usize * 2
    }

    /// Frame period for the target frame rate
    pub const fn frame_period_us(&self) -> u32 {
        if self.target_fps == 0 {
            return 1_000_000;
        }
        1_000_000 / self.target_fps as u32
    }

    /// Check every field, failing on the first invalid one
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.clock_hz < MIN_CLOCK_HZ || self.clock_hz > MAX_CLOCK_HZ {
            return Err(ConfigError::ClockOutOfRange);
        }

        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::Geometry);
        }
        let (ram_cols, ram_rows) = self.ram_size();
        if self.x_offset as u32 + self.width as u32 > ram_cols as u32
            || self.y_offset as u32 + self.height as u32 > ram_rows as u32
        {
            return Err(ConfigError::Geometry);
        }

        if self.transfer_chunk_lines == 0
            || self.transfer_chunk_lines > MAX_CHUNK_LINES
            || self.transfer_chunk_lines > self.height
        {
            return Err(ConfigError::ChunkLines);
        }

        if self.queue_depth == 0 || self.queue_depth > MAX_QUEUE_DEPTH {
            return Err(ConfigError::QueueDepth);
        }

        if self.dirty_rect_capacity == 0 || self.dirty_rect_capacity as usize > MAX_DIRTY_RECTS {
            return Err(ConfigError::DirtyCapacity);
        }

        if !self.alignment_unit.is_power_of_two() || self.alignment_unit > MAX_ALIGNMENT_UNIT {
            return Err(ConfigError::AlignmentUnit);
        }

        if self.transfer_timeout_us == 0 || self.poll_interval_us >= self.transfer_timeout_us {
            return Err(ConfigError::Timeout);
        }

        Ok(())
    }
}
