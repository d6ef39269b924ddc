//! Render task (core 0)
//!
//! Paces the render loop at the configured frame rate. Power requests are
//! drained without waiting; the newest one wins.

use defmt::*;
use embassy_rp::peripherals::{DMA_CH0, PIO0};
use embassy_time::{Duration, Ticker};

use lumen_core::{Backend, RenderLoop, TickOutcome};
use lumen_hal_rp2040::{feed_watchdog, PioParallelBus, PwmBacklight, RpCache, RpClock, RpDmaChannel};

use crate::channels::POWER_CHANNEL;
#[cfg(not(feature = "bring-up"))]
use crate::scene::Dashboard;
#[cfg(feature = "bring-up")]
use lumen_core::PatternScene;

/// Bytes per DMA slot: 50 full-width rows of a 320 px panel
///
/// build.rs rejects chunk sizes that do not fit.
pub const SLOT_BYTES: usize = 32_000;

pub type Bus = PioParallelBus<'static, PIO0, 0>;

pub type PanelBackend = Backend<
    'static,
    Bus,
    PwmBacklight<'static>,
    RpDmaChannel<'static, DMA_CH0>,
    RpCache,
    RpClock,
    SLOT_BYTES,
>;

pub type Renderer = RenderLoop<'static, 'static, PanelBackend, RpClock>;

#[cfg(not(feature = "bring-up"))]
pub type ActiveScene = Dashboard<'static>;
#[cfg(feature = "bring-up")]
pub type ActiveScene = PatternScene<'static>;

/// Render task - one tick per frame period
#[embassy_executor::task]
pub async fn render_task(mut renderer: Renderer, mut scene: ActiveScene, frame_period_us: u32) {
    info!("Render task started ({} us/frame)", frame_period_us);

    let mut ticker = Ticker::every(Duration::from_micros(frame_period_us as u64));

    loop {
        while let Ok(request) = POWER_CHANNEL.try_receive() {
            renderer.apply_power(request);
        }

        feed_watchdog();

        if let TickOutcome::Dropped(err) = renderer.tick(&mut scene) {
            let repeats = renderer.errors().count_of(err);
            if repeats > 1 {
                warn!("{} of the last dropped frames failed with {}", repeats, err);
            }
        }

        ticker.next().await;
    }
}
