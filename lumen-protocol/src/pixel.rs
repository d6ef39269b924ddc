//! RGB565 pixel wire format
//!
//! With COLMOD = 0x55 the panel takes one pixel as two bus bytes, most
//! significant byte first: `RRRRRGGG GGGBBBBB`.

/// Bytes per pixel on the wire
pub const BYTES_PER_PIXEL: usize = 2;

/// Pack 8-bit channels into RGB565
pub const fn rgb565(r: u8, g: u8, b: u8) -> u16 {
    ((r as u16 & 0xF8) << 8) | ((g as u16 & 0xFC) << 3) | (b as u16 >> 3)
}

/// Wire bytes of one pixel, MSB first
#[inline]
pub const fn to_wire(color: u16) -> [u8; 2] {
    color.to_be_bytes()
}

/// Encode pixels into wire order
///
/// Writes `min(src.len(), dst.len() / 2)` pixels and returns the number of
/// bytes written.
pub fn encode_pixels(src: &[u16], dst: &mut [u8]) -> usize {
    let mut written = 0;
    for (pixel, out) in src.iter().zip(dst.chunks_exact_mut(BYTES_PER_PIXEL)) {
        out.copy_from_slice(&to_wire(*pixel));
        written += BYTES_PER_PIXEL;
    }
    written
}

/// Common colors
pub mod colors {
    pub const BLACK: u16 = 0x0000;
    pub const WHITE: u16 = 0xFFFF;
    pub const RED: u16 = 0xF800;
    pub const GREEN: u16 = 0x07E0;
    pub const BLUE: u16 = 0x001F;
    pub const YELLOW: u16 = 0xFFE0;
    pub const CYAN: u16 = 0x07FF;
    pub const MAGENTA: u16 = 0xF81F;
    pub const GRAY: u16 = 0x8410;
}
