//! DMA channel feeding the PIO bus
//!
//! Byte-wide transfers from a slot buffer into the bus TX FIFO, paced by
//! the FIFO's DREQ. The channel is programmed directly through the PAC so
//! the engine can poll completion without an async executor.

use core::sync::atomic::{compiler_fence, Ordering};

use embassy_rp::dma::Channel;
use embassy_rp::pac;
use embassy_rp::pac::dma::vals::{DataSize, TreqSel};
use embassy_rp::Peri;
use lumen_hal::{DmaChannel, DmaError};

/// TRANS_COUNT is 32 bits wide, but slots are far smaller; keep the bound
/// to a value a single slot could plausibly hold.
const MAX_TRANSFER: usize = 64 * 1024;

/// One DMA channel bound to a TX FIFO
pub struct RpDmaChannel<'d, C: Channel> {
    _ch: Peri<'d, C>,
    number: u8,
    fifo_addr: u32,
    dreq: u8,
}

impl<'d, C: Channel> RpDmaChannel<'d, C> {
    /// Bind a channel to a FIFO address and DREQ
    ///
    /// Take both from [`crate::PioParallelBus::tx_fifo_addr`] and
    /// [`crate::PioParallelBus::tx_dreq`].
    pub fn new(ch: Peri<'d, C>, fifo_addr: u32, dreq: u8) -> Self {
        let number = ch.number();
        Self {
            _ch: ch,
            number,
            fifo_addr,
            dreq,
        }
    }

    fn regs(&self) -> pac::dma::Channel {
        pac::DMA.ch(self.number as usize)
    }
}

impl<C: Channel> DmaChannel for RpDmaChannel<'_, C> {
    fn start(&mut self, data: &[u8]) -> Result<(), DmaError> {
        if !self.is_done() {
            return Err(DmaError::Busy);
        }
        if data.len() > MAX_TRANSFER {
            return Err(DmaError::TooLong);
        }

        let ch = self.regs();
        ch.read_addr().write_value(data.as_ptr() as u32);
        ch.write_addr().write_value(self.fifo_addr);
        ch.trans_count().write_value(data.len() as u32);

        compiler_fence(Ordering::SeqCst);
        ch.ctrl_trig().write(|w| {
            w.set_treq_sel(TreqSel::from(self.dreq));
            w.set_data_size(DataSize::SIZE_BYTE);
            w.set_incr_read(true);
            w.set_incr_write(false);
            w.set_chain_to(self.number);
            w.set_en(true);
        });
        compiler_fence(Ordering::SeqCst);
        Ok(())
    }

    fn is_done(&self) -> bool {
        !self.regs().ctrl_trig().read().busy()
    }

    fn max_transfer_len(&self) -> usize {
        MAX_TRANSFER
    }
}
