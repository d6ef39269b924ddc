//! PWM backlight

use embassy_rp::pwm::{Config as PwmConfig, Pwm};
use lumen_hal::Backlight;

/// PWM counter wrap; 125 MHz / 1000 gives a 125 kHz carrier
const PWM_TOP: u16 = 1000;

/// Backlight dimmed by one PWM slice
///
/// Both slice outputs get the same duty, so either A or B may be wired.
pub struct PwmBacklight<'d> {
    pwm: Pwm<'d>,
    config: PwmConfig,
    level: u8,
}

impl<'d> PwmBacklight<'d> {
    /// Take a configured PWM slice; starts dark
    pub fn new(mut pwm: Pwm<'d>) -> Self {
        let mut config = PwmConfig::default();
        config.top = PWM_TOP;
        config.compare_a = 0;
        config.compare_b = 0;
        pwm.set_config(&config);
        Self {
            pwm,
            config,
            level: 0,
        }
    }
}

impl Backlight for PwmBacklight<'_> {
    fn set_level(&mut self, percent: u8) {
        self.level = percent.min(100);
        let compare = (self.level as u32 * PWM_TOP as u32 / 100) as u16;
        self.config.compare_a = compare;
        self.config.compare_b = compare;
        self.pwm.set_config(&self.config);
    }

    fn level(&self) -> u8 {
        self.level
    }
}
