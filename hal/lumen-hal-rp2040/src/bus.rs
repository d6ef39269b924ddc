//! PIO-clocked 8080 write bus
//!
//! One state machine shifts bytes out of its TX FIFO onto eight consecutive
//! data pins and toggles WR through side-set. The CPU (or a DMA channel)
//! only feeds the FIFO; DC, CS and RST stay on plain GPIO and are switched
//! only once the state machine has drained.
//!
//! ```text
//!   pull  side 1   ; WR high, wait for a byte (rising edge latches previous)
//!   out   pins 8  side 0   ; D0..D7 <- byte, WR low
//! ```
//!
//! Two PIO cycles per byte, so the PIO clock runs at twice the byte rate.

use embassy_rp::gpio::Output;
use embassy_rp::pac;
use embassy_rp::pio::{
    Common, Config, Direction as PioDirection, FifoJoin, Instance, Pin, ShiftConfig,
    ShiftDirection, StateMachine,
};
use fixed::types::U24F8;
use lumen_hal::{ParallelBus, BUS_WIDTH};

/// Default RP2040 system clock
pub const SYS_CLK_HZ: u32 = 125_000_000;

/// PIO cycles spent per byte (pull + out)
const CYCLES_PER_BYTE: u32 = 2;

/// Which PIO block the bus state machine lives in
///
/// Needed to locate the TX FIFO and its DREQ for DMA, which the embassy
/// PIO types keep private.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PioBlock {
    Pio0,
    Pio1,
}

/// Compute the PIO clock divider for a target WR strobe rate
///
/// Returns U24F8 bits; never below 1.0 (the PIO cannot run faster than
/// the system clock).
pub fn bus_clock_divider(sys_clk_hz: u32, byte_rate_hz: u32) -> u32 {
    let pio_hz = (byte_rate_hz as u64 * CYCLES_PER_BYTE as u64).max(1);
    let bits = (sys_clk_hz as u64 * 256) / pio_hz;
    bits.clamp(256, 0xFFFF_FF00) as u32
}

/// 8-bit parallel bus driven by one PIO state machine
pub struct PioParallelBus<'d, PIO: Instance, const SM: usize> {
    sm: StateMachine<'d, PIO, SM>,
    block: PioBlock,
    dc: Output<'d>,
    cs: Option<Output<'d>>,
    rst: Option<Output<'d>>,
}

impl<'d, PIO: Instance, const SM: usize> PioParallelBus<'d, PIO, SM> {
    /// Load the bus program and start the state machine
    ///
    /// # Arguments
    /// * `common` - PIO common resources (for loading program)
    /// * `sm` - State machine to use
    /// * `block` - PIO block `common` belongs to
    /// * `data` - D0..D7 as PIO pins, consecutive GPIO numbers
    /// * `wr` - WR strobe as PIO pin (side-set)
    /// * `dc` - Data/command select, left in data mode
    /// * `byte_rate_hz` - Target strobe rate; capped by the panel's write cycle
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        common: &mut Common<'d, PIO>,
        mut sm: StateMachine<'d, PIO, SM>,
        block: PioBlock,
        data: [Pin<'d, PIO>; BUS_WIDTH],
        wr: Pin<'d, PIO>,
        mut dc: Output<'d>,
        sys_clk_hz: u32,
        byte_rate_hz: u32,
    ) -> Self {
        let prg = pio::pio_asm!(
            ".side_set 1",
            ".wrap_target",
            "pull side 1",
            "out pins, 8 side 0",
            ".wrap"
        );
        let installed = common.load_program(&prg.program);

        let data_refs: [&Pin<'d, PIO>; BUS_WIDTH] = core::array::from_fn(|i| &data[i]);

        let mut cfg = Config::default();
        cfg.use_program(&installed, &[&wr]);
        cfg.set_out_pins(&data_refs);
        cfg.fifo_join = FifoJoin::TxOnly;
        cfg.shift_out = ShiftConfig {
            auto_fill: false,
            threshold: 32,
            direction: ShiftDirection::Right,
        };
        cfg.clock_divider = U24F8::from_bits(bus_clock_divider(sys_clk_hz, byte_rate_hz));

        sm.set_config(&cfg);
        sm.set_pin_dirs(PioDirection::Out, &data_refs);
        sm.set_pin_dirs(PioDirection::Out, &[&wr]);
        sm.set_enable(true);

        dc.set_high();

        Self {
            sm,
            block,
            dc,
            cs: None,
            rst: None,
        }
    }

    /// Attach a chip select line (starts released)
    pub fn with_chip_select(mut self, mut cs: Output<'d>) -> Self {
        cs.set_high();
        self.cs = Some(cs);
        self
    }

    /// Attach a reset line (starts released)
    pub fn with_reset(mut self, mut rst: Output<'d>) -> Self {
        rst.set_high();
        self.rst = Some(rst);
        self
    }

    /// Address of the state machine's TX FIFO, the DMA write target
    pub fn tx_fifo_addr(&self) -> u32 {
        let pio = match self.block {
            PioBlock::Pio0 => pac::PIO0,
            PioBlock::Pio1 => pac::PIO1,
        };
        pio.txf(SM).as_ptr() as u32
    }

    /// DREQ number pacing DMA writes into the TX FIFO
    pub fn tx_dreq(&self) -> u8 {
        match self.block {
            PioBlock::Pio0 => SM as u8,
            PioBlock::Pio1 => 8 + SM as u8,
        }
    }
}

impl<PIO: Instance, const SM: usize> ParallelBus for PioParallelBus<'_, PIO, SM> {
    fn select_command(&mut self) {
        self.wait_idle();
        self.dc.set_low();
    }

    fn select_data(&mut self) {
        self.wait_idle();
        self.dc.set_high();
    }

    fn write_byte(&mut self, byte: u8) {
        while !self.sm.tx().try_push(byte as u32) {}
    }

    fn set_chip_select(&mut self, active: bool) {
        self.wait_idle();
        if let Some(cs) = self.cs.as_mut() {
            if active {
                cs.set_low();
            } else {
                cs.set_high();
            }
        }
    }

    fn set_reset(&mut self, asserted: bool) {
        if let Some(rst) = self.rst.as_mut() {
            if asserted {
                rst.set_low();
            } else {
                rst.set_high();
            }
        }
    }

    fn wait_idle(&mut self) {
        // FIFO empty is not enough: the last byte may still be in the OSR.
        // The machine is done once it stalls on the next pull.
        while !self.sm.tx().empty() {}
        let _ = self.sm.tx().stalled();
        while !self.sm.tx().stalled() {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_divider_for_20mhz_bus() {
        // 125 MHz / 40 MHz = 3.125 -> 800 in U24F8
        assert_eq!(bus_clock_divider(SYS_CLK_HZ, 20_000_000), 800);
    }

    #[test]
    fn test_divider_never_below_one() {
        assert_eq!(bus_clock_divider(SYS_CLK_HZ, 200_000_000), 256);
    }

    #[test]
    fn test_divider_zero_rate_is_slowest_safe() {
        assert_eq!(bus_clock_divider(SYS_CLK_HZ, 0), 0xFFFF_FF00);
    }
}
