//! One-bit masks blitted in a single palette colour.

use std::borrow::Cow;

/// Row-major, MSB-first bit mask. Each row is padded to a whole byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    width: u16,
    height: u16,
    bits: Cow<'static, [u8]>,
}

const fn stride(width: u16) -> usize {
    (width as usize).div_ceil(8)
}

impl Mask {
    pub const fn from_static(width: u16, height: u16, bits: &'static [u8]) -> Self {
        assert!(bits.len() == stride(width) * height as usize);
        Self {
            width,
            height,
            bits: Cow::Borrowed(bits),
        }
    }

    /// Builds a mask by evaluating `lit` for every pixel.
    pub fn from_fn(width: u16, height: u16, mut lit: impl FnMut(u16, u16) -> bool) -> Self {
        let stride = stride(width);
        let mut bits = vec![0u8; stride * usize::from(height)];
        for y in 0..height {
            for x in 0..width {
                if lit(x, y) {
                    bits[usize::from(y) * stride + usize::from(x / 8)] |= 0x80 >> (x % 8);
                }
            }
        }
        Self {
            width,
            height,
            bits: Cow::Owned(bits),
        }
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn is_set(&self, x: u16, y: u16) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let byte = self.bits[usize::from(y) * stride(self.width) + usize::from(x / 8)];
        byte & (0x80 >> (x % 8)) != 0
    }

    /// Coordinates of every lit pixel, row by row.
    pub fn lit_pixels(&self) -> impl Iterator<Item = (u16, u16)> + '_ {
        (0..self.height)
            .flat_map(move |y| (0..self.width).map(move |x| (x, y)))
            .filter(|&(x, y)| self.is_set(x, y))
    }
}

/// Badge drawn in the lower-left corner of a channel armed for recording.
pub const REC_BADGE: Mask = Mask::from_static(
    13,
    4,
    &[
        0b0111_1111, 0b1111_0000, //
        0b1111_1111, 0b1111_1000, //
        0b1111_1111, 0b1111_1000, //
        0b0111_1111, 0b1111_0000, //
    ],
);

pub const REC_BADGE_OFFSET_Y: u16 = 31;

/// Overlay covering a muted channel's slot: a border with both diagonals.
pub fn mute_overlay(width: u16, height: u16) -> Mask {
    let (w, h) = (u32::from(width.max(1)), u32::from(height.max(1)));
    Mask::from_fn(width, height, |x, y| {
        let (x, y) = (u32::from(x), u32::from(y));
        let border = x == 0 || y == 0 || x + 1 == w || y + 1 == h;
        // Diagonals, two pixels thick so narrow overlays stay readable.
        let down = (y * w).abs_diff(x * h) <= w.max(h);
        let up = (y * w).abs_diff((w - 1 - x) * h) <= w.max(h);
        border || down || up
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rec_badge_has_rounded_corners() {
        assert!(!REC_BADGE.is_set(0, 0));
        assert!(REC_BADGE.is_set(1, 0));
        assert!(REC_BADGE.is_set(12, 1));
        assert!(!REC_BADGE.is_set(12, 3));
        assert!(!REC_BADGE.is_set(13, 1));
    }

    #[test]
    fn mute_overlay_matches_requested_size() {
        let mask = mute_overlay(56, 25);
        assert_eq!((mask.width(), mask.height()), (56, 25));
        assert!(mask.is_set(0, 0));
        assert!(mask.is_set(55, 24));
        assert!(mask.is_set(28, 12));
        assert!(!mask.is_set(28, 2));
    }

    #[test]
    fn from_fn_packs_rows_msb_first() {
        let mask = Mask::from_fn(10, 2, |x, y| x == 9 && y == 1);
        assert_eq!(mask.lit_pixels().collect::<Vec<_>>(), vec![(9, 1)]);
    }
}
