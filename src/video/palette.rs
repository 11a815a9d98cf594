use bytemuck::{Pod, Zeroable};

/// Packed `0x00RRGGBB` pixel as stored in the framebuffer.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Pod, Zeroable)]
pub struct Rgb(pub u32);

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self(((r as u32) << 16) | ((g as u32) << 8) | b as u32)
    }

    pub const fn r(self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub const fn g(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub const fn b(self) -> u8 {
        self.0 as u8
    }
}

/// Fixed UI palette entries used by the scope grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaletteColor {
    /// Scope background.
    Background,
    Desktop,
    DesktopLight,
    DesktopDark,
    /// Waveform and centre line.
    Waveform,
    /// Channel numbers.
    Number,
    /// Outline around numbers drawn on top of the mute overlay.
    Outline,
    Record,
    MuteOverlay,
}

impl PaletteColor {
    pub const fn rgb(self) -> Rgb {
        match self {
            Self::Background => Rgb::new(0x00, 0x00, 0x00),
            Self::Desktop => Rgb::new(0x49, 0x69, 0x8d),
            Self::DesktopLight => Rgb::new(0x8a, 0xaa, 0xca),
            Self::DesktopDark => Rgb::new(0x1c, 0x30, 0x49),
            Self::Waveform => Rgb::new(0xff, 0xff, 0xff),
            Self::Number => Rgb::new(0xab, 0xcd, 0xff),
            Self::Outline => Rgb::new(0x00, 0x00, 0x00),
            Self::Record => Rgb::new(0xe0, 0x20, 0x20),
            Self::MuteOverlay => Rgb::new(0x6d, 0x8d, 0xad),
        }
    }
}

impl From<PaletteColor> for Rgb {
    fn from(color: PaletteColor) -> Self {
        color.rgb()
    }
}
