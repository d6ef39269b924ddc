//! ST7789 command set
//!
//! Only the commands the engine issues are listed. Values are from the
//! controller datasheet, section "System Function Command Table 1/2".

// System function commands
pub const NOP: u8 = 0x00;
pub const SWRESET: u8 = 0x01;
pub const SLPIN: u8 = 0x10;
pub const SLPOUT: u8 = 0x11;
pub const NORON: u8 = 0x13;
pub const INVOFF: u8 = 0x20;
pub const INVON: u8 = 0x21;
pub const DISPOFF: u8 = 0x28;
pub const DISPON: u8 = 0x29;
pub const CASET: u8 = 0x2A;
pub const RASET: u8 = 0x2B;
pub const RAMWR: u8 = 0x2C;
pub const MADCTL: u8 = 0x36;
pub const COLMOD: u8 = 0x3A;

// Panel function commands
pub const PORCTRL: u8 = 0xB2;
pub const GCTRL: u8 = 0xB7;
pub const VCOMS: u8 = 0xBB;
pub const LCMCTRL: u8 = 0xC0;
pub const VDVVRHEN: u8 = 0xC2;
pub const VRHS: u8 = 0xC3;
pub const VDVS: u8 = 0xC4;
pub const FRCTRL2: u8 = 0xC6;
pub const PWRCTRL1: u8 = 0xD0;

/// COLMOD parameter: 16 bits per pixel, 65K colors
pub const COLMOD_RGB565: u8 = 0x55;

/// Settle time after SWRESET
pub const SWRESET_DELAY_MS: u32 = 150;

/// Settle time after SLPOUT before the next command
pub const SLPOUT_DELAY_MS: u32 = 120;

/// Settle time after SLPIN before the next command
pub const SLPIN_DELAY_MS: u32 = 5;

/// Memory access order (MADCTL MY/MX/MV bits)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Orientation {
    Portrait,
    /// Row/column exchange, the usual mounting for 320x170 modules
    #[default]
    Landscape,
    PortraitFlipped,
    LandscapeFlipped,
}

impl Orientation {
    /// MADCTL parameter byte
    pub const fn madctl(self) -> u8 {
        match self {
            Orientation::Portrait => 0x00,
            Orientation::Landscape => 0x60,
            Orientation::PortraitFlipped => 0xC0,
            Orientation::LandscapeFlipped => 0xA0,
        }
    }

    /// MADCTL parameter as a static slice for init tables
    pub const fn madctl_params(self) -> &'static [u8] {
        match self {
            Orientation::Portrait => &[0x00],
            Orientation::Landscape => &[0x60],
            Orientation::PortraitFlipped => &[0xC0],
            Orientation::LandscapeFlipped => &[0xA0],
        }
    }

    /// Decode a MADCTL byte
    pub const fn from_madctl(value: u8) -> Option<Self> {
        match value {
            0x00 => Some(Orientation::Portrait),
            0x60 => Some(Orientation::Landscape),
            0xC0 => Some(Orientation::PortraitFlipped),
            0xA0 => Some(Orientation::LandscapeFlipped),
            _ => None,
        }
    }

    /// Whether rows and columns are exchanged
    pub const fn is_landscape(self) -> bool {
        matches!(self, Orientation::Landscape | Orientation::LandscapeFlipped)
    }
}

/// Human-readable command mnemonic, for logs
pub fn command_name(command: u8) -> &'static str {
    match command {
        NOP => "NOP",
        SWRESET => "SWRESET",
        SLPIN => "SLPIN",
        SLPOUT => "SLPOUT",
        NORON => "NORON",
        INVOFF => "INVOFF",
        INVON => "INVON",
        DISPOFF => "DISPOFF",
        DISPON => "DISPON",
        CASET => "CASET",
        RASET => "RASET",
        RAMWR => "RAMWR",
        MADCTL => "MADCTL",
        COLMOD => "COLMOD",
        PORCTRL => "PORCTRL",
        GCTRL => "GCTRL",
        VCOMS => "VCOMS",
        LCMCTRL => "LCMCTRL",
        VDVVRHEN => "VDVVRHEN",
        VRHS => "VRHS",
        VDVS => "VDVS",
        FRCTRL2 => "FRCTRL2",
        PWRCTRL1 => "PWRCTRL1",
        _ => "UNKNOWN",
    }
}
