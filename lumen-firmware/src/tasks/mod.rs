//! Embassy tasks
//!
//! Core 0 runs only the render task. Core 1 runs the power policy and
//! the telemetry reporter.

mod power;
mod render;
mod telemetry;

pub use power::{power_task, IdlePolicy};
pub use render::{render_task, ActiveScene, PanelBackend, Renderer, SLOT_BYTES};
pub use telemetry::telemetry_task;
