//! DMA transfer pipeline
//!
//! Pixels leave the frame buffer in row bands. Each band is copied into one
//! of two fixed transfer slots as big-endian bytes, written back from the
//! cache and handed to the DMA engine while the CPU prepares the next band
//! in the other slot.
//!
//! ```text
//!   frame buffer ──copy──▶ back slot ──write-back──▶ DMA ──▶ bus ──▶ panel
//!                              │                      ▲
//!                              └────── flip ──────────┘
//! ```

pub mod job;
pub mod pipeline;
pub mod slot;

pub use job::{plan_jobs, JobPlan, TransferJob};
pub use pipeline::{DmaPipeline, PipelineStats};
pub use slot::{SlotBuffer, SlotEvent, SlotState, TransferSlots, SLOT_ALIGN};
