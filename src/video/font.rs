//! Tiny digit font for channel numbers.

use super::framebuffer::Framebuffer;
use super::palette::PaletteColor;

pub const GLYPH_WIDTH: u16 = 5;
pub const GLYPH_HEIGHT: u16 = 7;
/// Horizontal distance between consecutive digits.
pub const ADVANCE: i32 = 7;

// Low five bits per row, bit 4 is the leftmost column.
const DIGITS: [[u8; GLYPH_HEIGHT as usize]; 10] = [
    [0x0e, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0e],
    [0x04, 0x0c, 0x04, 0x04, 0x04, 0x04, 0x0e],
    [0x0e, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1f],
    [0x1f, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0e],
    [0x02, 0x06, 0x0a, 0x12, 0x1f, 0x02, 0x02],
    [0x1f, 0x10, 0x1e, 0x01, 0x01, 0x11, 0x0e],
    [0x06, 0x08, 0x10, 0x1e, 0x11, 0x11, 0x0e],
    [0x1f, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
    [0x0e, 0x11, 0x11, 0x0e, 0x11, 0x11, 0x0e],
    [0x0e, 0x11, 0x11, 0x0f, 0x01, 0x02, 0x0c],
];

fn glyph_pixels(digit: u8) -> impl Iterator<Item = (i32, i32)> {
    let rows = DIGITS.get(usize::from(digit)).copied().unwrap_or_default();
    rows.into_iter().enumerate().flat_map(|(y, row)| {
        (0..GLYPH_WIDTH)
            .filter(move |x| row & (0x10 >> x) != 0)
            .map(move |x| (i32::from(x), y as i32))
    })
}

impl Framebuffer {
    /// Draws one decimal digit with its top-left corner at `(x, y)`.
    pub fn draw_digit(&mut self, x: i32, y: i32, digit: u8, color: PaletteColor) {
        for (gx, gy) in glyph_pixels(digit) {
            self.plot(x + gx, y + gy, color);
        }
    }

    /// Draws a digit with a one pixel outline so it stays legible on any background.
    pub fn draw_digit_outlined(&mut self, x: i32, y: i32, digit: u8, color: PaletteColor) {
        for (gx, gy) in glyph_pixels(digit) {
            for (dx, dy) in [(-1, 0), (1, 0), (0, -1), (0, 1)] {
                self.plot(x + gx + dx, y + gy + dy, PaletteColor::Outline);
            }
        }
        self.draw_digit(x, y, digit, color);
    }

    /// Draws a one or two digit number left-aligned at `(x, y)`.
    pub fn draw_number(&mut self, x: i32, y: i32, value: u8, color: PaletteColor, outlined: bool) {
        let digits = if value < 10 {
            [Some(value), None]
        } else {
            [Some((value / 10) % 10), Some(value % 10)]
        };
        for (i, digit) in digits.into_iter().flatten().enumerate() {
            let gx = x + i as i32 * ADVANCE;
            if outlined {
                self.draw_digit_outlined(gx, y, digit, color);
            } else {
                self.draw_digit(gx, y, digit, color);
            }
        }
    }
}
