//! Panel backlight control

use crate::gpio::OutputPin;

/// Backlight with a brightness level in percent
pub trait Backlight {
    /// Set brightness, 0 (off) to 100 (full)
    fn set_level(&mut self, percent: u8);

    /// Current brightness in percent
    fn level(&self) -> u8;
}

/// On/off backlight on a plain GPIO
///
/// Any non-zero level switches the light on.
pub struct PinBacklight<P: OutputPin> {
    pin: P,
    level: u8,
}

impl<P: OutputPin> PinBacklight<P> {
    /// Create a backlight, initially off
    pub fn new(mut pin: P) -> Self {
        pin.set_low();
        Self { pin, level: 0 }
    }
}

impl<P: OutputPin> Backlight for PinBacklight<P> {
    fn set_level(&mut self, percent: u8) {
        self.level = percent.min(100);
        self.pin.set_state(self.level > 0);
    }

    fn level(&self) -> u8 {
        self.level
    }
}
