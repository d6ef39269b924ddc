//! Double-buffered DMA pipeline
//!
//! Per band: wait until the back slot is no longer lent to the engine,
//! copy the band in, write it back from the cache, wait for the previous
//! job and the bus, address the window, start the transfer, flip.
//!
//! Every check that can reject a job runs before the first hardware write,
//! so a rejected job leaves the bus and the panel untouched.

use lumen_hal::{CacheControl, Clock, DmaChannel, DmaError, ParallelBus};
use lumen_protocol::encode_pixels;

use super::job::TransferJob;
use super::slot::{SlotEvent, SlotState, TransferSlots};
use crate::config::DisplayConfig;
use crate::driver::ProtocolDriver;
use crate::error::DisplayError;
use crate::framebuffer::PixelBuffer;

/// Pipeline counters since construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PipelineStats {
    pub jobs_submitted: u32,
    pub jobs_completed: u32,
    pub timeouts: u32,
    pub alignment_rejections: u32,
}

/// DMA pipeline over two borrowed transfer slots
pub struct DmaPipeline<'s, D, C, K, const N: usize>
where
    D: DmaChannel,
    C: CacheControl,
    K: Clock,
{
    dma: D,
    cache: C,
    clock: K,
    slots: &'s mut TransferSlots<N>,
    states: [SlotState; 2],
    /// Slot the next band is copied into
    back: usize,
    /// Slot currently lent to the engine
    in_flight: Option<usize>,
    queue_depth: u8,
    alignment_unit: u16,
    timeout_us: u32,
    poll_us: u32,
    stats: PipelineStats,
}

impl<'s, D, C, K, const N: usize> DmaPipeline<'s, D, C, K, N>
where
    D: DmaChannel,
    C: CacheControl,
    K: Clock,
{
    /// Create a pipeline from validated configuration
    ///
    /// # Arguments
    /// * `slots` - Transfer slots, borrowed for the pipeline's lifetime
    pub fn new(dma: D, cache: C, clock: K, slots: &'s mut TransferSlots<N>, config: &DisplayConfig) -> Self {
        Self {
            dma,
            cache,
            clock,
            slots,
            states: [SlotState::Idle; 2],
            back: 0,
            in_flight: None,
            queue_depth: config.queue_depth.max(1),
            alignment_unit: config.alignment_unit.max(1),
            timeout_us: config.transfer_timeout_us,
            poll_us: config.poll_interval_us,
            stats: PipelineStats::default(),
        }
    }

    /// Bytes one slot holds
    pub fn slot_capacity(&self) -> usize {
        N
    }

    pub fn alignment_unit(&self) -> u16 {
        self.alignment_unit
    }

    pub fn stats(&self) -> PipelineStats {
        self.stats
    }

    pub fn slot_states(&self) -> [SlotState; 2] {
        self.states
    }

    /// Contents of a slot
    pub fn slot_bytes(&self, index: usize) -> &[u8] {
        self.slots.bytes(index)
    }

    /// Both slot bases satisfy the alignment unit
    pub fn slots_aligned(&self) -> bool {
        let unit = self.alignment_unit as usize;
        self.slots.base_addr(0) % unit == 0 && self.slots.base_addr(1) % unit == 0
    }

    /// Whether `job` would pass submission checks
    pub fn accepts(&self, job: &TransferJob) -> bool {
        job.alignment_unit == self.alignment_unit
            && job.length <= N
            && job.length <= self.dma.max_transfer_len()
            && job.validate(self.slots.base_addr(self.back)).is_ok()
    }

    /// Copy one band out of `frame` and start its transfer
    ///
    /// Returns once the transfer is running, or finished when the queue
    /// depth is one.
    pub fn submit<B: ParallelBus>(
        &mut self,
        driver: &mut ProtocolDriver<B>,
        job: &TransferJob,
        frame: &PixelBuffer<'_>,
    ) -> Result<(), DisplayError> {
        let slot = self.back;
        let other = slot ^ 1;

        if let Err(err) = self.check(job, slot) {
            if err == DisplayError::AlignmentViolation {
                self.stats.alignment_rejections += 1;
            }
            return Err(err);
        }
        let rect = job.rect();
        if rect.right() > frame.width() as u32 || rect.bottom() > frame.height() as u32 {
            return Err(DisplayError::InvalidCoordinates);
        }

        // The back slot may still be lent out after an earlier timeout
        if self.states[slot] == SlotState::InFlight {
            self.wait_slot(slot)?;
        }
        self.release(slot);

        let bytes = self.slots.bytes_mut(slot);
        let mut written = 0;
        for y in rect.y..=rect.y_end() {
            written += encode_pixels(frame.span(&rect, y), &mut bytes[written..]);
        }
        self.states[slot] = self.states[slot].transition(SlotEvent::Filled);

        self.cache.write_back(&self.slots.bytes(slot)[..job.length]);

        if self.states[other] == SlotState::InFlight {
            if let Err(err) = self.wait_slot(other) {
                self.states[slot] = self.states[slot].transition(SlotEvent::Discarded);
                return Err(err);
            }
        }
        driver.wait_idle();
        driver.set_window(&rect)?;

        if let Err(err) = self.dma.start(&self.slots.bytes(slot)[..job.length]) {
            self.states[slot] = self.states[slot].transition(SlotEvent::Discarded);
            return Err(err.into());
        }
        self.states[slot] = self.states[slot].transition(SlotEvent::Submitted);
        self.in_flight = Some(slot);
        self.stats.jobs_submitted += 1;
        trace!("dma job rows {}+{} slot {}", job.row_start, job.row_count, slot);

        self.back = other;

        if self.queue_depth == 1 {
            self.wait_slot(slot)?;
        }
        Ok(())
    }

    /// Wait for the job in flight, if any, and free both slots
    pub fn drain(&mut self) -> Result<(), DisplayError> {
        if let Some(slot) = self.in_flight {
            self.wait_slot(slot)?;
        }
        self.release(0);
        self.release(1);
        Ok(())
    }

    /// Record completion without waiting
    pub fn check_slots(&mut self) {
        if let Some(slot) = self.in_flight {
            if self.dma.is_done() {
                self.complete(slot);
            }
        }
    }

    /// Nothing is lent to the engine
    pub fn is_idle(&self) -> bool {
        self.in_flight.is_none()
    }

    fn check(&self, job: &TransferJob, slot: usize) -> Result<(), DisplayError> {
        if job.alignment_unit != self.alignment_unit {
            return Err(DisplayError::AlignmentViolation);
        }
        job.validate(self.slots.base_addr(slot))?;
        if job.length > N {
            return Err(DisplayError::BufferTooSmall);
        }
        if job.length > self.dma.max_transfer_len() {
            return Err(DisplayError::Dma(DmaError::TooLong));
        }
        Ok(())
    }

    /// Poll until the engine reports done or the deadline passes
    ///
    /// On timeout the slot stays in flight; only the hardware can release
    /// it.
    fn wait_slot(&mut self, slot: usize) -> Result<(), DisplayError> {
        if self.in_flight != Some(slot) {
            return Ok(());
        }
        let start = self.clock.now_us();
        loop {
            if self.dma.is_done() {
                self.complete(slot);
                return Ok(());
            }
            if self.clock.elapsed_us(start) >= self.timeout_us as u64 {
                self.stats.timeouts += 1;
                warn!("dma job in slot {} timed out", slot);
                return Err(DisplayError::TransferTimeout);
            }
            self.clock.pause_us(self.poll_us);
        }
    }

    fn complete(&mut self, slot: usize) {
        self.states[slot] = self.states[slot].transition(SlotEvent::DoneObserved);
        self.in_flight = None;
        self.stats.jobs_completed += 1;
    }

    fn release(&mut self, slot: usize) {
        self.states[slot] = self.states[slot].transition(SlotEvent::Released);
    }
}
