//! Parallel (8080-style) panel bus
//!
//! The panel samples the data lines on the rising edge of WR. The DC line
//! selects whether the byte is a command (low) or a parameter/pixel byte
//! (high). There is no read-back or acknowledge path, so a byte clocked with
//! the wrong DC level or a short strobe is silently misinterpreted by the
//! panel.

use crate::gpio::OutputPin;

/// Number of data lines on the bus
pub const BUS_WIDTH: usize = 8;

/// 8-bit parallel bus master
///
/// Implementations own every control and data line of the bus. Only the
/// protocol driver talks to this trait; nothing else gets to strobe.
pub trait ParallelBus {
    /// Drive DC low so following bytes are interpreted as commands
    fn select_command(&mut self);

    /// Drive DC high so following bytes are interpreted as data
    fn select_data(&mut self);

    /// Place one byte on the data lines and strobe WR once
    fn write_byte(&mut self, byte: u8);

    /// Write a run of bytes, one strobe each
    fn write_bytes(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.write_byte(byte);
        }
    }

    /// Assert (true) or release (false) chip select
    fn set_chip_select(&mut self, active: bool);

    /// Assert (true) or release (false) the panel reset line
    fn set_reset(&mut self, asserted: bool);

    /// Block until every byte handed to the bus has left the pins
    ///
    /// Buses that are written synchronously are always idle.
    fn wait_idle(&mut self) {}
}

/// Bit-banged parallel bus over individual GPIO pins
///
/// Every byte costs one pin write per changed data bit plus two writes on
/// WR. Slow, but every edge is under CPU control, which makes it the
/// reference implementation for the direct backend.
pub struct GpioParallelBus<P: OutputPin> {
    /// D0..D7
    data: [P; BUS_WIDTH],
    /// Write strobe (active low, latched on the rising edge)
    wr: P,
    /// Data/command select
    dc: P,
    /// Chip select (active low), if wired
    cs: Option<P>,
    /// Reset (active low), if wired
    rst: Option<P>,
    /// Last byte on the data lines, to skip unchanged bits
    last: Option<u8>,
}

impl<P: OutputPin> GpioParallelBus<P> {
    /// Create a bus from its data lines, WR and DC
    ///
    /// Leaves WR high (idle) and DC in data mode.
    pub fn new(data: [P; BUS_WIDTH], mut wr: P, mut dc: P) -> Self {
        wr.set_high();
        dc.set_high();
        Self {
            data,
            wr,
            dc,
            cs: None,
            rst: None,
            last: None,
        }
    }

    /// Attach a chip select line (starts released)
    pub fn with_chip_select(mut self, mut cs: P) -> Self {
        cs.set_high();
        self.cs = Some(cs);
        self
    }

    /// Attach a reset line (starts released)
    pub fn with_reset(mut self, mut rst: P) -> Self {
        rst.set_high();
        self.rst = Some(rst);
        self
    }

    /// Check whether DC currently selects data
    pub fn is_data_selected(&self) -> bool {
        self.dc.is_set_high()
    }

    /// Release the pins
    pub fn release(self) -> ([P; BUS_WIDTH], P, P, Option<P>, Option<P>) {
        (self.data, self.wr, self.dc, self.cs, self.rst)
    }
}

impl<P: OutputPin> ParallelBus for GpioParallelBus<P> {
    fn select_command(&mut self) {
        self.dc.set_low();
    }

    fn select_data(&mut self) {
        self.dc.set_high();
    }

    fn write_byte(&mut self, byte: u8) {
        let changed = match self.last {
            Some(prev) => prev ^ byte,
            None => 0xFF,
        };

        for (bit, pin) in self.data.iter_mut().enumerate() {
            let mask = 1u8 << bit;
            if changed & mask != 0 {
                pin.set_state(byte & mask != 0);
            }
        }
        self.last = Some(byte);

        // Panel latches D0..D7 on the rising edge
        self.wr.set_low();
        self.wr.set_high();
    }

    fn set_chip_select(&mut self, active: bool) {
        if let Some(cs) = self.cs.as_mut() {
            cs.set_state(!active);
        }
    }

    fn set_reset(&mut self, asserted: bool) {
        if let Some(rst) = self.rst.as_mut() {
            rst.set_state(!asserted);
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use core::cell::RefCell;
    use std::rc::Rc;
    use std::vec::Vec;

    const WR: u8 = 100;
    const DC: u8 = 101;
    const CS: u8 = 102;
    const RST: u8 = 103;

    type EdgeLog = Rc<RefCell<Vec<(u8, bool)>>>;

    /// Mock GPIO pin recording every write into a shared log
    struct MockPin {
        id: u8,
        high: bool,
        log: EdgeLog,
    }

    impl MockPin {
        fn new(id: u8, log: &EdgeLog) -> Self {
            Self {
                id,
                high: false,
                log: log.clone(),
            }
        }
    }

    impl OutputPin for MockPin {
        fn set_high(&mut self) {
            self.high = true;
            self.log.borrow_mut().push((self.id, true));
        }

        fn set_low(&mut self) {
            self.high = false;
            self.log.borrow_mut().push((self.id, false));
        }

        fn is_set_high(&self) -> bool {
            self.high
        }
    }

    fn make_bus(log: &EdgeLog) -> GpioParallelBus<MockPin> {
        let data = core::array::from_fn(|i| MockPin::new(i as u8, log));
        GpioParallelBus::new(data, MockPin::new(WR, log), MockPin::new(DC, log))
            .with_chip_select(MockPin::new(CS, log))
            .with_reset(MockPin::new(RST, log))
    }

    fn data_byte(bus: &GpioParallelBus<MockPin>) -> u8 {
        bus.data
            .iter()
            .enumerate()
            .fold(0u8, |acc, (bit, pin)| acc | ((pin.high as u8) << bit))
    }

    fn strobes(log: &EdgeLog) -> usize {
        log.borrow()
            .windows(2)
            .filter(|w| w[0] == (WR, false) && w[1] == (WR, true))
            .count()
    }

    #[test]
    fn test_idle_state_after_new() {
        let log = EdgeLog::default();
        let bus = make_bus(&log);

        assert!(bus.wr.is_set_high());
        assert!(bus.is_data_selected());
        assert!(bus.cs.as_ref().is_some_and(|cs| cs.is_set_high()));
        assert!(bus.rst.as_ref().is_some_and(|rst| rst.is_set_high()));
    }

    #[test]
    fn test_write_byte_sets_data_lines_and_strobes_once() {
        let log = EdgeLog::default();
        let mut bus = make_bus(&log);
        log.borrow_mut().clear();

        bus.write_byte(0xA5);

        assert_eq!(data_byte(&bus), 0xA5);
        assert_eq!(strobes(&log), 1);

        // Strobe is the last thing that happens, after the data is stable
        let entries = log.borrow();
        let n = entries.len();
        assert_eq!(entries[n - 2], (WR, false));
        assert_eq!(entries[n - 1], (WR, true));
    }

    #[test]
    fn test_one_strobe_per_byte() {
        let log = EdgeLog::default();
        let mut bus = make_bus(&log);
        log.borrow_mut().clear();

        bus.write_bytes(&[0x00, 0xFF, 0x12, 0x12]);

        assert_eq!(strobes(&log), 4);
        assert_eq!(data_byte(&bus), 0x12);
    }

    #[test]
    fn test_unchanged_bits_are_not_rewritten() {
        let log = EdgeLog::default();
        let mut bus = make_bus(&log);
        bus.write_byte(0x0F);
        log.borrow_mut().clear();

        // Only bit 4 changes
        bus.write_byte(0x1F);

        let data_writes = log.borrow().iter().filter(|(id, _)| *id < 8).count();
        assert_eq!(data_writes, 1);
        assert_eq!(data_byte(&bus), 0x1F);
    }

    #[test]
    fn test_command_and_data_select() {
        let log = EdgeLog::default();
        let mut bus = make_bus(&log);

        bus.select_command();
        assert!(!bus.is_data_selected());

        bus.select_data();
        assert!(bus.is_data_selected());
    }

    #[test]
    fn test_chip_select_and_reset_are_active_low() {
        let log = EdgeLog::default();
        let mut bus = make_bus(&log);

        bus.set_chip_select(true);
        bus.set_reset(true);
        assert!(bus.cs.as_ref().is_some_and(|cs| cs.is_set_low()));
        assert!(bus.rst.as_ref().is_some_and(|rst| rst.is_set_low()));

        bus.set_chip_select(false);
        bus.set_reset(false);
        assert!(bus.cs.as_ref().is_some_and(|cs| cs.is_set_high()));
        assert!(bus.rst.as_ref().is_some_and(|rst| rst.is_set_high()));
    }
}
