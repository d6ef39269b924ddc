//! Render loop
//!
//! One iteration per tick:
//!
//! ```text
//!   Idle ─▶ Collect ─▶ Decide ─┬─▶ Render ─▶ Flush ─▶ Idle
//!                              │
//!                              └─ nothing dirty ─────▶ Idle (skip)
//! ```

mod controller;
mod phase;

pub use controller::{PowerRequest, RenderLoop, TickOutcome};
pub use phase::{PhaseEvent, RenderPhase};
