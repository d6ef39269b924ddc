//! Test doubles for the hardware traits
//!
//! Bus, DMA and cache mocks share one event log so tests can assert on the
//! exact order in which bytes, barriers and transfers reached the
//! "hardware".

#![allow(dead_code)]

extern crate std;

use core::cell::{Cell, RefCell};
use std::rc::Rc;
use std::vec::Vec;

use embedded_hal::delay::DelayNs;
use lumen_hal::{Backlight, CacheControl, Clock, DmaChannel, DmaError, ParallelBus};
use lumen_protocol::commands::{CASET, RAMWR, RASET};
use lumen_protocol::{AddressWindow, CommandTrace};

/// One thing that happened on the mocked hardware
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HwEvent {
    Command(u8),
    Data(u8),
    ChipSelect(bool),
    Reset(bool),
    WriteBack { addr: usize, len: usize },
    DmaStart { addr: usize, len: usize },
}

/// Shared, ordered hardware event log
#[derive(Debug, Clone, Default)]
pub struct HwLog(Rc<RefCell<Vec<HwEvent>>>);

impl HwLog {
    pub fn push(&self, event: HwEvent) {
        self.0.borrow_mut().push(event);
    }

    pub fn events(&self) -> Vec<HwEvent> {
        self.0.borrow().clone()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }

    /// Bytes clocked onto the bus (commands and data)
    pub fn bus_bytes(&self) -> usize {
        self.0
            .borrow()
            .iter()
            .filter(|e| matches!(e, HwEvent::Command(_) | HwEvent::Data(_)))
            .count()
    }

    /// Command/parameter structure of the bus traffic
    pub fn trace(&self) -> CommandTrace<512> {
        let mut trace = CommandTrace::new();
        for event in self.0.borrow().iter() {
            match event {
                HwEvent::Command(c) => trace.push_command(*c),
                HwEvent::Data(d) => trace.push_data(*d),
                _ => {}
            }
        }
        trace
    }

    /// Every RAMWR stream with the window it was addressed to
    pub fn pixel_streams(&self) -> Vec<(AddressWindow, Vec<u8>)> {
        let mut streams = Vec::new();
        let mut caset: Vec<u8> = Vec::new();
        let mut raset: Vec<u8> = Vec::new();
        let mut current: Option<u8> = None;
        let mut payload: Vec<u8> = Vec::new();

        let mut finish = |cmd: Option<u8>, caset: &[u8], raset: &[u8], payload: &mut Vec<u8>| {
            if cmd == Some(RAMWR) && caset.len() == 4 && raset.len() == 4 {
                let window = AddressWindow::from_params(
                    [caset[0], caset[1], caset[2], caset[3]],
                    [raset[0], raset[1], raset[2], raset[3]],
                );
                streams.push((window, core::mem::take(payload)));
            }
            payload.clear();
        };

        for event in self.0.borrow().iter() {
            match event {
                HwEvent::Command(c) => {
                    finish(current, &caset, &raset, &mut payload);
                    match *c {
                        CASET => caset.clear(),
                        RASET => raset.clear(),
                        _ => {}
                    }
                    current = Some(*c);
                }
                HwEvent::Data(d) => match current {
                    Some(CASET) => caset.push(*d),
                    Some(RASET) => raset.push(*d),
                    Some(RAMWR) => payload.push(*d),
                    _ => {}
                },
                _ => {}
            }
        }
        finish(current, &caset, &raset, &mut payload);
        drop(finish);
        streams
    }
}

/// Recording parallel bus
pub struct MockBus {
    log: HwLog,
    data_mode: bool,
    pub idle_waits: u32,
}

impl MockBus {
    pub fn new(log: &HwLog) -> Self {
        Self {
            log: log.clone(),
            data_mode: true,
            idle_waits: 0,
        }
    }
}

impl ParallelBus for MockBus {
    fn select_command(&mut self) {
        self.data_mode = false;
    }

    fn select_data(&mut self) {
        self.data_mode = true;
    }

    fn write_byte(&mut self, byte: u8) {
        let event = if self.data_mode {
            HwEvent::Data(byte)
        } else {
            HwEvent::Command(byte)
        };
        self.log.push(event);
    }

    fn set_chip_select(&mut self, active: bool) {
        self.log.push(HwEvent::ChipSelect(active));
    }

    fn set_reset(&mut self, asserted: bool) {
        self.log.push(HwEvent::Reset(asserted));
    }

    fn wait_idle(&mut self) {
        self.idle_waits += 1;
    }
}

/// DMA channel that finishes after a fixed number of polls, or never
///
/// Started data is copied into the shared log as bus data bytes, as if the
/// engine streamed it out immediately.
pub struct MockDma {
    log: HwLog,
    /// `None` never completes
    polls_to_complete: Option<u32>,
    remaining: Cell<u32>,
    running: Cell<bool>,
    pub starts: u32,
    pub max_len: usize,
}

impl MockDma {
    pub fn new(log: &HwLog, polls_to_complete: Option<u32>) -> Self {
        Self {
            log: log.clone(),
            polls_to_complete,
            remaining: Cell::new(0),
            running: Cell::new(false),
            starts: 0,
            max_len: usize::MAX,
        }
    }

    /// Completes on the first poll
    pub fn instant(log: &HwLog) -> Self {
        Self::new(log, Some(0))
    }

    /// Never completes
    pub fn stuck(log: &HwLog) -> Self {
        Self::new(log, None)
    }
}

impl DmaChannel for MockDma {
    fn start(&mut self, data: &[u8]) -> Result<(), DmaError> {
        if self.running.get() && !self.is_done() {
            return Err(DmaError::Busy);
        }
        if data.len() > self.max_len {
            return Err(DmaError::TooLong);
        }
        self.log.push(HwEvent::DmaStart {
            addr: data.as_ptr() as usize,
            len: data.len(),
        });
        for &b in data {
            self.log.push(HwEvent::Data(b));
        }
        self.starts += 1;
        self.running.set(true);
        self.remaining.set(self.polls_to_complete.unwrap_or(0));
        Ok(())
    }

    fn is_done(&self) -> bool {
        if !self.running.get() {
            return true;
        }
        if self.polls_to_complete.is_none() {
            return false;
        }
        let left = self.remaining.get();
        if left == 0 {
            self.running.set(false);
            true
        } else {
            self.remaining.set(left - 1);
            false
        }
    }

    fn max_transfer_len(&self) -> usize {
        self.max_len
    }
}

/// Cache that records write-backs
pub struct MockCache {
    log: HwLog,
}

impl MockCache {
    pub fn new(log: &HwLog) -> Self {
        Self { log: log.clone() }
    }
}

impl CacheControl for MockCache {
    fn write_back(&mut self, data: &[u8]) {
        self.log.push(HwEvent::WriteBack {
            addr: data.as_ptr() as usize,
            len: data.len(),
        });
    }
}

/// Virtual clock: advances on pauses, plus `step` per read
#[derive(Clone)]
pub struct MockClock {
    now: Rc<Cell<u64>>,
    step: u64,
}

impl MockClock {
    pub fn new() -> Self {
        Self {
            now: Rc::new(Cell::new(0)),
            step: 0,
        }
    }

    /// Every `now_us` read advances time by `step`
    pub fn stepping(step: u64) -> Self {
        Self {
            now: Rc::new(Cell::new(0)),
            step,
        }
    }

    pub fn advance(&self, us: u64) {
        self.now.set(self.now.get() + us);
    }

    pub fn current(&self) -> u64 {
        self.now.get()
    }
}

impl Clock for MockClock {
    fn now_us(&self) -> u64 {
        let t = self.now.get();
        self.now.set(t + self.step);
        t
    }

    fn pause_us(&mut self, us: u32) {
        self.advance(us as u64);
    }
}

/// Delay that only accumulates requested time
#[derive(Default)]
pub struct MockDelay {
    pub total_ns: u64,
}

impl MockDelay {
    pub fn total_ms(&self) -> u64 {
        self.total_ns / 1_000_000
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += ns as u64;
    }
}

/// Backlight remembering its level
#[derive(Default)]
pub struct MockBacklight {
    level: Rc<Cell<u8>>,
}

impl MockBacklight {
    pub fn handle(&self) -> Rc<Cell<u8>> {
        self.level.clone()
    }
}

impl Backlight for MockBacklight {
    fn set_level(&mut self, percent: u8) {
        self.level.set(percent.min(100));
    }

    fn level(&self) -> u8 {
        self.level.get()
    }
}
