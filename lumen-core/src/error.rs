//! Display engine errors

use lumen_hal::DmaError;

use crate::config::ConfigError;

/// Display engine errors
///
/// Two failure classes have no variant here: timing or addressing mistakes
/// on the bus are invisible to software (the panel has no acknowledge
/// path), and stale-cache transfers are ruled out by always writing back
/// before a DMA submission. Both are handled by construction, not reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayError {
    /// Transfer length or buffer base is not a multiple of the alignment unit
    AlignmentViolation,
    /// A submitted DMA job did not complete before its deadline
    TransferTimeout,
    /// Window or rectangle outside the panel, or start past end
    InvalidCoordinates,
    /// Backend selected without the hardware it needs
    UnsupportedBackend,
    /// Flush or power control before `init`
    NotInitialized,
    /// Frame or transfer buffer smaller than the configured geometry needs
    BufferTooSmall,
    /// DMA engine refused the transfer
    Dma(DmaError),
    /// Invalid configuration
    Config(ConfigError),
}

impl DisplayError {
    /// Whether the render loop can drop the frame and keep going
    pub fn is_transient(&self) -> bool {
        matches!(self, DisplayError::TransferTimeout)
    }
}

impl From<ConfigError> for DisplayError {
    fn from(err: ConfigError) -> Self {
        DisplayError::Config(err)
    }
}

impl From<DmaError> for DisplayError {
    fn from(err: DmaError) -> Self {
        DisplayError::Dma(err)
    }
}
