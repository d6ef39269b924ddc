//! Power-on initialisation sequence
//!
//! Register values are the ones the module vendor ships for 1.9" 170x320
//! ST7789 glass. Porch, gate and VCOM settings are panel-specific; changing
//! them shows up as flicker or washed-out colors, not as an error.

use crate::commands::*;

/// Number of steps in the init sequence
pub const INIT_STEPS: usize = 16;

/// One command of the init sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InitStep {
    /// Command byte
    pub command: u8,
    /// Parameter bytes sent with DC high
    pub params: &'static [u8],
    /// Wait after the command before sending the next one
    pub delay_ms: u32,
}

impl InitStep {
    const fn new(command: u8, params: &'static [u8], delay_ms: u32) -> Self {
        Self {
            command,
            params,
            delay_ms,
        }
    }
}

/// Build the init sequence for an orientation
///
/// # Arguments
/// * `orientation` - Memory access order written to MADCTL
/// * `invert` - Send INVON (IPS glass needs it for correct colors) or INVOFF
pub const fn init_sequence(orientation: Orientation, invert: bool) -> [InitStep; INIT_STEPS] {
    [
        InitStep::new(SWRESET, &[], SWRESET_DELAY_MS),
        InitStep::new(SLPOUT, &[], SLPOUT_DELAY_MS),
        InitStep::new(COLMOD, &[COLMOD_RGB565], 0),
        InitStep::new(MADCTL, orientation.madctl_params(), 0),
        InitStep::new(PORCTRL, &[0x0C, 0x0C, 0x00, 0x33, 0x33], 0),
        InitStep::new(GCTRL, &[0x35], 0),
        InitStep::new(VCOMS, &[0x19], 0),
        InitStep::new(LCMCTRL, &[0x2C], 0),
        InitStep::new(VDVVRHEN, &[0x01], 0),
        InitStep::new(VRHS, &[0x12], 0),
        InitStep::new(VDVS, &[0x20], 0),
        InitStep::new(FRCTRL2, &[0x0F], 0),
        InitStep::new(PWRCTRL1, &[0xA4, 0xA1], 0),
        InitStep::new(if invert { INVON } else { INVOFF }, &[], 0),
        InitStep::new(NORON, &[], 10),
        InitStep::new(DISPON, &[], 10),
    ]
}
