//! Parallel-bus protocol driver
//!
//! The only code allowed to put bytes on the panel bus. Callers get
//! commands, parameters, addressing windows and pixel streams; raw strobing
//! stays behind [`ParallelBus`].
//!
//! DC is left in data mode after every command. A DMA engine streaming
//! pixels after RAMWR never touches DC, so it relies on that.

use embedded_hal::delay::DelayNs;
use lumen_hal::ParallelBus;
use lumen_protocol::commands::{CASET, RAMWR, RASET};
use lumen_protocol::{to_wire, AddressWindow};

use crate::config::DisplayConfig;
use crate::error::DisplayError;
use crate::geometry::DirtyRect;

/// Reset line timing (high, low, high settle) in milliseconds
const RESET_TIMING_MS: (u32, u32, u32) = (10, 10, 120);

/// ST7789 protocol driver over an owned bus
pub struct ProtocolDriver<B: ParallelBus> {
    bus: B,
    width: u16,
    height: u16,
    x_offset: u16,
    y_offset: u16,
    bytes_written: u32,
}

impl<B: ParallelBus> ProtocolDriver<B> {
    /// Take ownership of the bus and select the panel
    pub fn new(bus: B, config: &DisplayConfig) -> Self {
        Self::with_geometry(
            bus,
            config.width,
            config.height,
            config.x_offset,
            config.y_offset,
        )
    }

    /// Create a driver for an explicit visible area and RAM offset
    pub fn with_geometry(mut bus: B, width: u16, height: u16, x_offset: u16, y_offset: u16) -> Self {
        // Single device on the bus: keep it selected
        bus.set_chip_select(true);
        bus.select_data();
        Self {
            bus,
            width,
            height,
            x_offset,
            y_offset,
            bytes_written: 0,
        }
    }

    /// Visible width
    pub fn width(&self) -> u16 {
        self.width
    }

    /// Visible height
    pub fn height(&self) -> u16 {
        self.height
    }

    /// Send one command byte (DC low)
    pub fn write_command(&mut self, command: u8) {
        self.bus.select_command();
        self.bus.write_byte(command);
        self.bus.select_data();
        self.bytes_written = self.bytes_written.wrapping_add(1);
    }

    /// Send one parameter/data byte (DC high)
    pub fn write_data(&mut self, byte: u8) {
        self.bus.select_data();
        self.bus.write_byte(byte);
        self.bytes_written = self.bytes_written.wrapping_add(1);
    }

    /// Send a command followed by its parameters
    pub fn write_command_with(&mut self, command: u8, params: &[u8]) {
        self.write_command(command);
        self.bus.write_bytes(params);
        self.bytes_written = self.bytes_written.wrapping_add(params.len() as u32);
    }

    /// Restrict following pixel data to an inclusive window and start RAMWR
    ///
    /// Coordinates are screen coordinates; the panel RAM offset is added
    /// here. Rejected before any byte is sent if a start is past its end
    /// or the window leaves the visible area.
    pub fn set_address_window(&mut self, x0: u16, y0: u16, x1: u16, y1: u16) -> Result<(), DisplayError> {
        let window = AddressWindow::new(x0, y0, x1, y1);
        if !window.is_ordered() || x1 >= self.width || y1 >= self.height {
            return Err(DisplayError::InvalidCoordinates);
        }

        let ram = window.offset(self.x_offset, self.y_offset);
        self.write_command_with(CASET, &ram.caset());
        self.write_command_with(RASET, &ram.raset());
        self.write_command(RAMWR);
        Ok(())
    }

    /// Address the pixels of a rectangle
    pub fn set_window(&mut self, rect: &DirtyRect) -> Result<(), DisplayError> {
        if rect.is_empty() {
            return Err(DisplayError::InvalidCoordinates);
        }
        self.set_address_window(rect.x, rect.y, rect.x_end(), rect.y_end())
    }

    /// Stream RGB565 pixels, most significant byte first
    ///
    /// Must follow [`Self::set_address_window`].
    pub fn write_pixels(&mut self, pixels: &[u16]) {
        self.bus.select_data();
        for &pixel in pixels {
            self.bus.write_bytes(&to_wire(pixel));
        }
        self.bytes_written = self
            .bytes_written
            .wrapping_add(pixels.len() as u32 * 2);
    }

    /// Pulse the reset line
    pub fn hardware_reset(&mut self, delay: &mut impl DelayNs) {
        let (high_ms, low_ms, settle_ms) = RESET_TIMING_MS;
        self.bus.set_reset(false);
        delay.delay_ms(high_ms);
        self.bus.set_reset(true);
        delay.delay_ms(low_ms);
        self.bus.set_reset(false);
        delay.delay_ms(settle_ms);
    }

    /// Wait until the bus has shifted out everything queued on it
    pub fn wait_idle(&mut self) {
        self.bus.wait_idle();
    }

    /// Bytes sent through this driver (DMA traffic not included)
    pub fn bytes_written(&self) -> u32 {
        self.bytes_written
    }

    /// Borrow the bus
    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Give the bus back
    pub fn into_bus(self) -> B {
        self.bus
    }
}
