//! Write-back barrier before DMA
//!
//! The RP2040 has no data cache, so the only hazard is the compiler or the
//! bus reordering the slot copy after the channel trigger. A fence plus a
//! data synchronization barrier closes that.

use core::sync::atomic::{compiler_fence, Ordering};

use lumen_hal::CacheControl;

/// Barrier-only cache control
#[derive(Debug, Default, Clone, Copy)]
pub struct RpCache;

impl CacheControl for RpCache {
    fn write_back(&mut self, _data: &[u8]) {
        compiler_fence(Ordering::SeqCst);
        cortex_m::asm::dsb();
    }
}
