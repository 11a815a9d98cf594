//! Scope grid geometry: two rows of slots whose widths depend on the channel count.

use super::{MAX_VOICES, SCOPE_HEIGHT};

/// Slot widths per channel, indexed by `channels / 2 - 1`.
const SCOPE_WIDTHS: [[u16; MAX_VOICES]; MAX_VOICES / 2] = [
    pad(&[285, 285]),
    pad(&[141, 141, 141, 141]),
    pad(&[93, 93, 93, 93, 93, 93]),
    pad(&[69, 69, 69, 69, 69, 69, 69, 69]),
    pad(&[55, 55, 55, 54, 54, 55, 55, 55, 54, 54]),
    pad(&[45; 12]),
    pad(&[39, 38, 38, 38, 38, 38, 38, 39, 38, 38, 38, 38, 38, 38]),
    pad(&[33; 16]),
    pad(&[29; 18]),
    pad(&[
        26, 26, 26, 26, 26, 26, 26, 26, 25, 25, 26, 26, 26, 26, 26, 26, 26, 26, 25, 25,
    ]),
    pad(&[
        24, 24, 23, 23, 23, 23, 23, 23, 23, 23, 23, 24, 24, 23, 23, 23, 23, 23, 23, 23, 23, 23,
    ]),
    pad(&[21; 24]),
    pad(&[
        20, 20, 19, 19, 19, 19, 19, 19, 19, 19, 19, 19, 19, 20, 20, 19, 19, 19, 19, 19, 19, 19,
        19, 19, 19, 19,
    ]),
    pad(&[
        18, 18, 18, 18, 18, 18, 18, 18, 17, 17, 17, 17, 17, 17, 18, 18, 18, 18, 18, 18, 18, 18,
        17, 17, 17, 17, 17, 17,
    ]),
    pad(&[
        17, 17, 17, 16, 16, 16, 16, 16, 16, 16, 16, 16, 16, 16, 16, 17, 17, 17, 16, 16, 16, 16,
        16, 16, 16, 16, 16, 16, 16, 16,
    ]),
    pad(&[15; 32]),
];

/// Mute overlay size per row of the width table.
const MUTE_OVERLAY_SIZES: [(u16, u16); MAX_VOICES / 2] = [
    (162, 27),
    (111, 27),
    (76, 26),
    (56, 25),
    (42, 25),
    (35, 25),
    (28, 24),
    (24, 24),
    (21, 24),
    (21, 24),
    (17, 24),
    (17, 24),
    (12, 24),
    (12, 24),
    (9, 24),
    (9, 24),
];

const fn pad(widths: &[u16]) -> [u16; MAX_VOICES] {
    let mut out = [0; MAX_VOICES];
    let mut i = 0;
    while i < widths.len() {
        out[i] = widths[i];
        i += 1;
    }
    out
}

pub const FRAMEWORK_X: u16 = 0;
pub const FRAMEWORK_Y: u16 = 92;
pub const FRAMEWORK_WIDTH: u16 = 291;
pub const FRAMEWORK_HEIGHT: u16 = 81;

const SLOT_X: u16 = 3;
const SLOT_GAP: u16 = 3;
const ROW_Y: [u16; 2] = [95, 134];
const CENTER_OFFSET: u16 = 17;

const AREA_X: std::ops::RangeInclusive<u16> = 3..=288;
const AREA_Y: std::ops::RangeInclusive<u16> = 95..=169;
const ROW_GAP_Y: std::ops::RangeInclusive<u16> = 131..=133;

/// Placement of one channel's scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeSlot {
    pub channel: usize,
    pub x: u16,
    pub y: u16,
    pub width: u16,
    /// Row of the zero line.
    pub center_y: u16,
}

impl ScopeSlot {
    pub const HEIGHT: u16 = SCOPE_HEIGHT as u16;

    /// Outer framework around the slot: (x, y, width, height).
    pub fn frame_rect(&self) -> (u16, u16, u16, u16) {
        (self.x - 1, self.y - 1, self.width + 2, Self::HEIGHT + 2)
    }
}

/// What a pointer position hits in the scope area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    Channel(usize),
    /// Inside the scope area but between slots.
    Framework,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeLayout {
    channels: usize,
}

impl ScopeLayout {
    /// `channels` is rounded down to even and clamped to `2..=MAX_VOICES`.
    pub fn new(channels: usize) -> Self {
        Self {
            channels: (channels & !1).clamp(2, MAX_VOICES),
        }
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn per_row(&self) -> usize {
        self.channels / 2
    }

    fn table_row(&self) -> usize {
        self.per_row() - 1
    }

    pub fn widths(&self) -> &'static [u16] {
        &SCOPE_WIDTHS[self.table_row()][..self.channels]
    }

    pub fn mute_overlay_size(&self) -> (u16, u16) {
        MUTE_OVERLAY_SIZES[self.table_row()]
    }

    pub fn slots(&self) -> impl Iterator<Item = ScopeSlot> + '_ {
        let per_row = self.per_row();
        let widths = self.widths();
        (0..2).flat_map(move |row| {
            let mut x = SLOT_X;
            let y = ROW_Y[row];
            widths[row * per_row..(row + 1) * per_row]
                .iter()
                .enumerate()
                .map(move |(col, &width)| {
                    let slot = ScopeSlot {
                        channel: row * per_row + col,
                        x,
                        y,
                        width,
                        center_y: y + CENTER_OFFSET,
                    };
                    x += width + SLOT_GAP;
                    slot
                })
        })
    }

    pub fn slot(&self, channel: usize) -> Option<ScopeSlot> {
        self.slots().nth(channel)
    }

    /// Classifies a pointer position. `None` means outside the scope area.
    pub fn hit(&self, x: u16, y: u16) -> Option<HitTarget> {
        if !AREA_X.contains(&x) || !AREA_Y.contains(&y) {
            return None;
        }
        if ROW_GAP_Y.contains(&y) {
            return Some(HitTarget::Framework);
        }

        let row = usize::from(y >= ROW_Y[1]);
        let per_row = self.per_row();
        let mut left = SLOT_X;
        for (col, &width) in self.widths()[..per_row].iter().enumerate() {
            if (left..left + width).contains(&x) {
                return Some(HitTarget::Channel(row * per_row + col));
            }
            left += width + SLOT_GAP;
        }
        Some(HitTarget::Framework)
    }

    pub fn hit_test(&self, x: u16, y: u16) -> Option<usize> {
        match self.hit(x, y)? {
            HitTarget::Channel(channel) => Some(channel),
            HitTarget::Framework => None,
        }
    }
}
