//! DMA transfer abstractions
//!
//! The accelerated backend hands whole chunks of pixel bytes to a DMA
//! engine that feeds the panel bus without CPU involvement. Completion is
//! polled; there is no interrupt path and no cancellation.

/// DMA engine errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DmaError {
    /// A transfer is already running on this channel
    Busy,
    /// Transfer longer than the channel can describe
    TooLong,
}

/// One DMA channel wired to the panel bus
pub trait DmaChannel {
    /// Start streaming `data` to the bus
    ///
    /// Returns as soon as the transfer is programmed. The engine keeps
    /// reading `data` after this call returns; the caller must not modify
    /// that memory until [`DmaChannel::is_done`] reports completion.
    fn start(&mut self, data: &[u8]) -> Result<(), DmaError>;

    /// Check whether the last started transfer has finished
    fn is_done(&self) -> bool;

    /// Largest transfer the channel accepts, in bytes
    fn max_transfer_len(&self) -> usize {
        usize::MAX
    }
}

/// Data cache maintenance
///
/// On parts with a data cache, CPU writes may sit in cache lines the DMA
/// engine never sees. Every buffer must be written back before its
/// transfer is started.
pub trait CacheControl {
    /// Write back (clean) every cache line covering `data`
    fn write_back(&mut self, data: &[u8]);
}
