//! Lumen - Display firmware for RP2040 boards with a parallel ST7789 panel
//!
//! Core 0 owns the panel: bus, DMA channel, framebuffer and render loop.
//! Core 1 runs the power policy and the telemetry reporter and talks to
//! core 0 only through `channels::POWER_CHANNEL` and the shared counters.
//!
//! Pin assignments (board-specific):
//!
//! ```text
//!   GPIO0..7  D0..D7      GPIO8   WR (PIO side-set)
//!   GPIO9     DC          GPIO10  CS
//!   GPIO11    RST         GPIO12  BL (PWM slice 6 A)
//!   GPIO15    wake button (active low)
//! ```

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::{Executor, Spawner};
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::multicore::{spawn_core1, Stack};
use embassy_rp::peripherals::PIO0;
use embassy_rp::pio::{InterruptHandler as PioInterruptHandler, Pio};
use embassy_rp::pwm::{Config as PwmConfig, Pwm};
use embassy_rp::watchdog::Watchdog;
use embassy_time::Duration;
use static_cell::{ConstStaticCell, StaticCell};
use {defmt_rtt as _, panic_probe as _};

use lumen_core::dma::{DmaPipeline, TransferSlots};
use lumen_core::{Backend, BackendKind, PerformanceCounters, PixelBuffer, ProtocolDriver, RenderLoop};
use lumen_hal_rp2040::{install_watchdog, PioBlock, PioParallelBus, PwmBacklight, RpCache, RpClock, RpDmaChannel};

use crate::config::parse_config;
use crate::tasks::{ActiveScene, IdlePolicy, SLOT_BYTES};

mod channels;
mod config;
mod scene;
mod tasks;

/// Embedded configuration (compiled into firmware)
/// Edit display.toml and rebuild to customize
const EMBEDDED_CONFIG: &str = include_str!("../display.toml");

/// Backend used when display.toml does not name one
const DEFAULT_BACKEND: BackendKind = if cfg!(feature = "accelerated") {
    BackendKind::Accelerated
} else {
    BackendKind::Direct
};

/// Largest panel the framebuffer is sized for
const MAX_PIXELS: usize = 320 * 170;

const WATCHDOG_TIMEOUT_MS: u64 = 1_000;

/// Idle policy: dim after 30 s, sleep after 2 min
const DIM_AFTER_MS: u64 = 30_000;
const OFF_AFTER_MS: u64 = 120_000;
const ACTIVE_BRIGHTNESS: u8 = 80;
const DIM_BRIGHTNESS: u8 = 15;

bind_interrupts!(struct Irqs {
    PIO0_IRQ_0 => PioInterruptHandler<PIO0>;
});

static FRAMEBUFFER: ConstStaticCell<[u16; MAX_PIXELS]> = ConstStaticCell::new([0; MAX_PIXELS]);
static SLOTS: ConstStaticCell<TransferSlots<SLOT_BYTES>> = ConstStaticCell::new(TransferSlots::new());
static COUNTERS: PerformanceCounters = PerformanceCounters::new();

static mut CORE1_STACK: Stack<4096> = Stack::new();
static EXECUTOR1: StaticCell<Executor> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Lumen firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let config = unwrap!(parse_config(EMBEDDED_CONFIG, DEFAULT_BACKEND));
    info!(
        "Display: {}x{} @ {} Hz, backend {}, {} lines/chunk, depth {}",
        config.width,
        config.height,
        config.clock_hz,
        config.backend.as_str(),
        config.transfer_chunk_lines,
        config.queue_depth
    );

    let mut watchdog = Watchdog::new(p.WATCHDOG);
    watchdog.start(Duration::from_millis(WATCHDOG_TIMEOUT_MS));
    install_watchdog(watchdog);

    // Parallel bus on PIO0 / SM0
    let Pio {
        mut common, sm0, ..
    } = Pio::new(p.PIO0, Irqs);

    let data = [
        common.make_pio_pin(p.PIN_0),
        common.make_pio_pin(p.PIN_1),
        common.make_pio_pin(p.PIN_2),
        common.make_pio_pin(p.PIN_3),
        common.make_pio_pin(p.PIN_4),
        common.make_pio_pin(p.PIN_5),
        common.make_pio_pin(p.PIN_6),
        common.make_pio_pin(p.PIN_7),
    ];
    let wr = common.make_pio_pin(p.PIN_8);

    let bus = PioParallelBus::new(
        &mut common,
        sm0,
        PioBlock::Pio0,
        data,
        wr,
        Output::new(p.PIN_9, Level::High),
        embassy_rp::clocks::clk_sys_freq(),
        config.clock_hz,
    )
    .with_chip_select(Output::new(p.PIN_10, Level::High))
    .with_reset(Output::new(p.PIN_11, Level::High));
    info!("PIO bus initialized");

    let dma = RpDmaChannel::new(p.DMA_CH0, bus.tx_fifo_addr(), bus.tx_dreq());
    let backlight = PwmBacklight::new(Pwm::new_output_a(p.PWM_SLICE6, p.PIN_12, PwmConfig::default()));

    let driver = ProtocolDriver::new(bus, &config);
    let pipeline = match config.backend {
        BackendKind::Accelerated => Some(DmaPipeline::new(dma, RpCache, RpClock, SLOTS.take(), &config)),
        BackendKind::Direct => None,
    };
    let backend = unwrap!(Backend::select(&config, driver, backlight, pipeline));

    let pixels: &'static mut [u16] = FRAMEBUFFER.take();
    let frame = unwrap!(PixelBuffer::new(pixels, config.width, config.height));

    let mut renderer = unwrap!(RenderLoop::new(backend, frame, &config, RpClock, &COUNTERS));
    unwrap!(renderer.init());
    info!("Panel initialized");

    #[cfg(not(feature = "bring-up"))]
    let scene: ActiveScene = scene::Dashboard::new(&COUNTERS, config.target_fps as u32);
    #[cfg(feature = "bring-up")]
    let scene: ActiveScene = {
        info!("Bring-up mode: cycling test patterns");
        lumen_core::PatternScene::new(&lumen_core::patterns::BRING_UP, config.target_fps as u32 * 3)
    };

    // Core 1: power policy and telemetry
    let button = Input::new(p.PIN_15, Pull::Up);
    let policy = IdlePolicy::new(DIM_AFTER_MS, OFF_AFTER_MS, ACTIVE_BRIGHTNESS, DIM_BRIGHTNESS);

    spawn_core1(
        p.CORE1,
        // SAFETY: the stack is handed to core 1 exactly once, here
        unsafe { &mut *core::ptr::addr_of_mut!(CORE1_STACK) },
        move || {
            let executor1 = EXECUTOR1.init(Executor::new());
            executor1.run(|spawner| {
                spawner.spawn(tasks::power_task(button, policy)).unwrap();
                spawner.spawn(tasks::telemetry_task(&COUNTERS)).unwrap();
            });
        },
    );

    // Core 0: render loop only
    spawner
        .spawn(tasks::render_task(renderer, scene, config.frame_period_us()))
        .unwrap();

    info!("All tasks spawned, firmware running");
}
