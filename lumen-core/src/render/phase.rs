//! Render loop phases

/// Where the loop is within a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RenderPhase {
    /// Between ticks
    #[default]
    Idle,
    /// Scene is issuing draw primitives
    Collect,
    /// Checking whether anything changed
    Decide,
    /// Applying queued draw commands to the pixel buffer
    Render,
    /// Backend is sending dirty regions
    Flush,
}

/// Events that move the loop between phases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PhaseEvent {
    TickStarted,
    Collected,
    NothingDirty,
    DirtyFound,
    Rendered,
    Flushed,
    FlushFailed,
}

impl RenderPhase {
    /// Process an event and return the next phase
    ///
    /// Events that do not belong to the current phase are ignored.
    pub fn transition(self, event: PhaseEvent) -> Self {
        use PhaseEvent::*;
        use RenderPhase::*;

        match (self, event) {
            (Idle, TickStarted) => Collect,
            (Collect, Collected) => Decide,
            (Decide, NothingDirty) => Idle,
            (Decide, DirtyFound) => Render,
            (Render, Rendered) => Flush,
            (Flush, Flushed) => Idle,
            (Flush, FlushFailed) => Idle,
            (phase, _) => phase,
        }
    }
}
