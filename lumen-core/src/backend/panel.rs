//! Panel bring-up and power control shared by both backends

use embedded_hal::delay::DelayNs;
use lumen_hal::{Backlight, ParallelBus};
use lumen_protocol::commands::{DISPOFF, DISPON, SLPIN, SLPIN_DELAY_MS, SLPOUT, SLPOUT_DELAY_MS};
use lumen_protocol::{init_sequence, Orientation};

use crate::config::DisplayConfig;
use crate::driver::ProtocolDriver;
use crate::error::DisplayError;

/// Protocol driver plus backlight, with power state
pub struct Panel<B: ParallelBus, L: Backlight> {
    driver: ProtocolDriver<B>,
    backlight: L,
    orientation: Orientation,
    invert: bool,
    brightness: u8,
    initialized: bool,
    powered: bool,
}

impl<B: ParallelBus, L: Backlight> Panel<B, L> {
    /// Wrap a driver; the backlight stays off until `init`
    pub fn new(driver: ProtocolDriver<B>, mut backlight: L, config: &DisplayConfig) -> Self {
        backlight.set_level(0);
        Self {
            driver,
            backlight,
            orientation: config.orientation,
            invert: config.invert_colors,
            brightness: 100,
            initialized: false,
            powered: false,
        }
    }

    /// Reset the controller and run the init sequence
    pub fn init(&mut self, delay: &mut impl DelayNs) {
        self.driver.hardware_reset(delay);
        for step in init_sequence(self.orientation, self.invert).iter() {
            self.driver.write_command_with(step.command, step.params);
            if step.delay_ms > 0 {
                delay.delay_ms(step.delay_ms);
            }
        }
        self.backlight.set_level(self.brightness);
        self.initialized = true;
        self.powered = true;
        debug!("panel initialized, brightness {}", self.brightness);
    }

    /// Sleep or wake the panel
    ///
    /// Waking waits out the SLPOUT settle time before DISPON.
    pub fn set_power(&mut self, on: bool, delay: &mut impl DelayNs) -> Result<(), DisplayError> {
        self.ensure_initialized()?;
        if on == self.powered {
            return Ok(());
        }
        if on {
            self.driver.write_command(SLPOUT);
            delay.delay_ms(SLPOUT_DELAY_MS);
            self.driver.write_command(DISPON);
            self.backlight.set_level(self.brightness);
        } else {
            self.backlight.set_level(0);
            self.driver.write_command(DISPOFF);
            self.driver.write_command(SLPIN);
            delay.delay_ms(SLPIN_DELAY_MS);
        }
        self.powered = on;
        info!("panel power {}", on);
        Ok(())
    }

    /// Set backlight level, clamped to 100
    ///
    /// Before `init` or while powered off the level is only remembered.
    pub fn set_brightness(&mut self, percent: u8) {
        self.brightness = percent.min(100);
        if self.initialized && self.powered {
            self.backlight.set_level(self.brightness);
        }
    }

    pub fn brightness(&self) -> u8 {
        self.brightness
    }

    pub fn is_powered(&self) -> bool {
        self.powered
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn ensure_initialized(&self) -> Result<(), DisplayError> {
        if self.initialized {
            Ok(())
        } else {
            Err(DisplayError::NotInitialized)
        }
    }

    pub fn driver(&self) -> &ProtocolDriver<B> {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut ProtocolDriver<B> {
        &mut self.driver
    }

    pub fn backlight(&self) -> &L {
        &self.backlight
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use core::cell::Cell;
    use std::rc::Rc;
    use crate::mock::{HwEvent, HwLog, MockBacklight, MockBus, MockDelay};
    use lumen_protocol::commands::{MADCTL, SWRESET};
    use lumen_protocol::sequence::validate;

    fn panel(log: &HwLog) -> (Panel<MockBus, MockBacklight>, Rc<Cell<u8>>) {
        let cfg = DisplayConfig::new();
        let backlight = MockBacklight::default();
        let level = backlight.handle();
        let driver = ProtocolDriver::new(MockBus::new(log), &cfg);
        (Panel::new(driver, backlight, &cfg), level)
    }

    #[test]
    fn test_init_matches_reference_sequence() {
        let log = HwLog::default();
        let (mut panel, level) = panel(&log);
        let mut delay = MockDelay::default();

        panel.init(&mut delay);

        let trace = log.trace();
        let reference = init_sequence(Orientation::Landscape, true);
        assert!(validate(&reference, trace.commands()).is_clean());
        assert_eq!(trace.commands()[0].command, SWRESET);
        assert!(trace
            .commands()
            .iter()
            .any(|c| c.command == MADCTL && c.params.as_slice() == [0x60]));
        // Reset pulse plus every settle delay in the table
        let table_ms: u64 = reference.iter().map(|s| s.delay_ms as u64).sum();
        assert_eq!(delay.total_ms(), 140 + table_ms);
        assert_eq!(level.get(), 100);
        assert!(log.events().contains(&HwEvent::Reset(true)));
    }

    #[test]
    fn test_power_cycle() {
        let log = HwLog::default();
        let (mut panel, level) = panel(&log);
        let mut delay = MockDelay::default();
        panel.init(&mut delay);
        panel.set_brightness(40);
        log.clear();

        panel.set_power(false, &mut delay).unwrap();
        assert_eq!(log.events(), [HwEvent::Command(DISPOFF), HwEvent::Command(SLPIN)]);
        assert_eq!(level.get(), 0);

        // Remembered while off
        panel.set_brightness(70);
        assert_eq!(level.get(), 0);

        log.clear();
        let before = delay.total_ms();
        panel.set_power(true, &mut delay).unwrap();
        assert_eq!(log.events(), [HwEvent::Command(SLPOUT), HwEvent::Command(DISPON)]);
        assert_eq!(delay.total_ms() - before, SLPOUT_DELAY_MS as u64);
        assert_eq!(level.get(), 70);
    }

    #[test]
    fn test_power_before_init_is_rejected() {
        let log = HwLog::default();
        let (mut panel, _) = panel(&log);
        log.clear();

        assert_eq!(
            panel.set_power(true, &mut MockDelay::default()),
            Err(DisplayError::NotInitialized)
        );
        assert!(log.events().is_empty());
    }

    #[test]
    fn test_brightness_is_clamped() {
        let log = HwLog::default();
        let (mut panel, level) = panel(&log);
        panel.init(&mut MockDelay::default());

        panel.set_brightness(250);
        assert_eq!(panel.brightness(), 100);
        assert_eq!(level.get(), 100);
    }
}
