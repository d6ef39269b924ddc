//! Transfer slots and their ownership states

/// Slot base alignment in bytes; covers every supported alignment unit
pub const SLOT_ALIGN: usize = 64;

/// Ownership state of one transfer slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SlotState {
    /// Owned by the CPU, free to fill
    #[default]
    Idle,
    /// Holds a band that is not yet submitted
    Queued,
    /// Lent to the DMA engine; must not be touched
    InFlight,
    /// Hardware reported done, not yet reused
    Complete,
}

/// Events driving a slot through its states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SlotEvent {
    /// Band bytes copied in
    Filled,
    /// Handed to the DMA engine
    Submitted,
    /// Completion observed by polling
    DoneObserved,
    /// Reclaimed for the next fill
    Released,
    /// Queued contents dropped before submission
    Discarded,
}

impl SlotState {
    /// The CPU may write the slot's bytes
    pub fn is_writable(&self) -> bool {
        matches!(self, SlotState::Idle | SlotState::Complete)
    }

    /// Next state; events that do not apply leave the state unchanged
    pub fn transition(self, event: SlotEvent) -> Self {
        use SlotEvent::*;
        use SlotState::*;

        match (self, event) {
            (Idle, Filled) => Queued,
            (Queued, Submitted) => InFlight,
            (Queued, Discarded) => Idle,
            (InFlight, DoneObserved) => Complete,
            (Complete, Released) => Idle,
            (state, _) => state,
        }
    }
}

/// Byte buffer aligned for DMA
#[repr(C, align(64))]
pub struct SlotBuffer<const N: usize>(pub [u8; N]);

/// The two transfer slots of the pipeline
///
/// `N` is the slot size in bytes. Meant to live in a static; at 320 pixels
/// and 20 rows per band one slot is 12800 bytes.
pub struct TransferSlots<const N: usize> {
    buffers: [SlotBuffer<N>; 2],
}

impl<const N: usize> TransferSlots<N> {
    pub const fn new() -> Self {
        Self {
            buffers: [SlotBuffer([0; N]), SlotBuffer([0; N])],
        }
    }

    /// Bytes per slot
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Address of a slot's first byte
    pub fn base_addr(&self, index: usize) -> usize {
        self.buffers[index & 1].0.as_ptr() as usize
    }

    pub fn bytes(&self, index: usize) -> &[u8] {
        &self.buffers[index & 1].0
    }

    pub fn bytes_mut(&mut self, index: usize) -> &mut [u8] {
        &mut self.buffers[index & 1].0
    }
}

impl<const N: usize> Default for TransferSlots<N> {
    fn default() -> Self {
        Self::new()
    }
}
