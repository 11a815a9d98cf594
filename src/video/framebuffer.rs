use super::bitmaps::Mask;
use super::palette::{PaletteColor, Rgb};

pub const SCREEN_WIDTH: usize = 632;
pub const SCREEN_HEIGHT: usize = 400;

/// Bevel direction of a framework box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameworkStyle {
    /// Light top-left edge, filled with the desktop colour.
    Raised,
    /// Dark top-left edge, filled with the scope background.
    Sunken,
}

/// Packed-pixel screen buffer. All drawing calls clip to the screen.
#[derive(Clone, PartialEq, Eq)]
pub struct Framebuffer {
    pixels: Box<[Rgb]>,
}

impl std::fmt::Debug for Framebuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Framebuffer")
            .field("width", &SCREEN_WIDTH)
            .field("height", &SCREEN_HEIGHT)
            .finish()
    }
}

impl Default for Framebuffer {
    fn default() -> Self {
        Self::new(PaletteColor::Background)
    }
}

impl Framebuffer {
    pub fn new(fill: PaletteColor) -> Self {
        Self {
            pixels: vec![fill.rgb(); SCREEN_WIDTH * SCREEN_HEIGHT].into_boxed_slice(),
        }
    }

    pub fn width(&self) -> usize {
        SCREEN_WIDTH
    }

    pub fn height(&self) -> usize {
        SCREEN_HEIGHT
    }

    pub fn pixels(&self) -> &[Rgb] {
        &self.pixels
    }

    /// Raw `u32` pixel bytes in native endianness, ready for texture upload.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels[..])
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<Rgb> {
        Self::index(x, y).map(|i| self.pixels[i])
    }

    fn index(x: i32, y: i32) -> Option<usize> {
        let x = usize::try_from(x).ok().filter(|&x| x < SCREEN_WIDTH)?;
        let y = usize::try_from(y).ok().filter(|&y| y < SCREEN_HEIGHT)?;
        Some(y * SCREEN_WIDTH + x)
    }

    pub fn clear(&mut self, color: PaletteColor) {
        self.pixels.fill(color.rgb());
    }

    pub fn plot(&mut self, x: i32, y: i32, color: PaletteColor) {
        if let Some(i) = Self::index(x, y) {
            self.pixels[i] = color.rgb();
        }
    }

    pub fn fill_rect(&mut self, x: i32, y: i32, w: u16, h: u16, color: PaletteColor) {
        let x0 = x.clamp(0, SCREEN_WIDTH as i32);
        let x1 = (x + i32::from(w)).clamp(0, SCREEN_WIDTH as i32);
        let y0 = y.clamp(0, SCREEN_HEIGHT as i32);
        let y1 = (y + i32::from(h)).clamp(0, SCREEN_HEIGHT as i32);
        if x0 >= x1 {
            return;
        }

        let rgb = color.rgb();
        for row in y0..y1 {
            let start = row as usize * SCREEN_WIDTH;
            self.pixels[start + x0 as usize..start + x1 as usize].fill(rgb);
        }
    }

    pub fn clear_rect(&mut self, x: i32, y: i32, w: u16, h: u16) {
        self.fill_rect(x, y, w, h, PaletteColor::Background);
    }

    pub fn hline(&mut self, x: i32, y: i32, w: u16, color: PaletteColor) {
        self.fill_rect(x, y, w, 1, color);
    }

    pub fn vline(&mut self, x: i32, y: i32, h: u16, color: PaletteColor) {
        self.fill_rect(x, y, 1, h, color);
    }

    /// Integer Bresenham line, both endpoints inclusive.
    pub fn line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: PaletteColor) {
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let (mut x, mut y) = (x0, y0);
        let mut err = dx + dy;

        loop {
            self.plot(x, y, color);
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    /// Bevelled box: two-pixel edges, interior filled.
    pub fn framework(&mut self, x: i32, y: i32, w: u16, h: u16, style: FrameworkStyle) {
        let (fill, top_left, bottom_right) = match style {
            FrameworkStyle::Raised => (
                PaletteColor::Desktop,
                PaletteColor::DesktopLight,
                PaletteColor::DesktopDark,
            ),
            FrameworkStyle::Sunken => (
                PaletteColor::Background,
                PaletteColor::DesktopDark,
                PaletteColor::DesktopLight,
            ),
        };
        if w < 2 || h < 2 {
            self.fill_rect(x, y, w, h, fill);
            return;
        }

        self.fill_rect(x + 1, y + 1, w - 2, h - 2, fill);
        self.hline(x, y, w - 1, top_left);
        self.vline(x, y + 1, h - 2, top_left);
        self.hline(x + 1, y + i32::from(h) - 1, w - 1, bottom_right);
        self.vline(x + i32::from(w) - 1, y, h - 1, bottom_right);
    }

    /// Draws every lit pixel of `mask` in `color`; unlit pixels are left as is.
    pub fn blit_mask(&mut self, x: i32, y: i32, mask: &Mask, color: PaletteColor) {
        for (mx, my) in mask.lit_pixels() {
            self.plot(x + i32::from(mx), y + i32::from(my), color);
        }
    }

    /// Binary PPM (P6) encoding of the whole screen.
    pub fn to_ppm(&self) -> Vec<u8> {
        let header = format!("P6\n{SCREEN_WIDTH} {SCREEN_HEIGHT}\n255\n");
        let mut out = Vec::with_capacity(header.len() + self.pixels.len() * 3);
        out.extend_from_slice(header.as_bytes());
        for px in self.pixels.iter() {
            out.extend_from_slice(&[px.r(), px.g(), px.b()]);
        }
        out
    }
}
