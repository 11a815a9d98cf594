//! Fixed-point playback cursor arithmetic shared by the tracking loop and the render pass.
//!
//! Positions are in sample frames, deltas are 16.16 fixed point. The same
//! stepping rules run at two rates: once per tracking tick and once per
//! rendered pixel.

/// One whole sample in 16.16 fixed point.
pub const FRAC_ONE: u64 = 1 << 16;
const FRAC_MASK: u64 = FRAC_ONE - 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopType {
    #[default]
    None,
    Forward,
    PingPong,
}

impl LoopType {
    /// Decodes the low two bits of a sample type byte. Both bits set loops forward.
    pub fn from_flags(flags: u8) -> Self {
        match flags & 3 {
            0 => Self::None,
            2 => Self::PingPong,
            _ => Self::Forward,
        }
    }

    pub fn is_looping(self) -> bool {
        self != Self::None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

impl Direction {
    #[inline]
    fn apply(self, step: i64) -> i64 {
        match self {
            Self::Forward => step,
            Self::Backward => -step,
        }
    }
}

/// Loop-normalized sample bounds. For looping samples `length` is the loop end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoopBounds {
    pub length: i32,
    pub loop_start: i32,
    pub loop_length: i32,
    pub loop_type: LoopType,
}

impl LoopBounds {
    /// Offset into the loop for an overshoot, collapsing degenerate loops to zero.
    #[inline]
    fn wrap(&self, overflow: i64) -> i64 {
        if self.loop_length < 2 {
            0
        } else {
            overflow % i64::from(self.loop_length)
        }
    }
}

/// Integer position, 16-bit fraction and ping-pong direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor {
    pub position: i32,
    pub frac: u32,
    pub direction: Direction,
}

impl Cursor {
    pub fn at(position: i32) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }
}

/// Moves `cursor` by `delta` and applies loop wrap or ping-pong reflection.
///
/// Returns the new integer position, or `None` once a non-looping sample runs
/// past its end. The cursor is left untouched in that case.
pub fn advance(bounds: &LoopBounds, cursor: &mut Cursor, delta: u32) -> Option<i32> {
    let acc = u64::from(cursor.frac) + u64::from(delta);
    if acc < FRAC_ONE {
        cursor.frac = acc as u32;
        return Some(cursor.position);
    }

    let step = (acc >> 16) as i64;
    let mut position = i64::from(cursor.position) + cursor.direction.apply(step);
    let mut direction = cursor.direction;

    let length = i64::from(bounds.length);
    let loop_start = i64::from(bounds.loop_start);

    match direction {
        Direction::Backward => {
            if position < loop_start {
                direction = Direction::Forward;
                position = loop_start + bounds.wrap(loop_start - position - 1);
            }
        }
        Direction::Forward if position >= length => match bounds.loop_type {
            LoopType::None => return None,
            LoopType::Forward => {
                position = loop_start + bounds.wrap(position - length);
            }
            LoopType::PingPong => {
                direction = Direction::Backward;
                position = (length - 1) - bounds.wrap(position - length);
            }
        },
        Direction::Forward => {}
    }

    debug_assert!(
        (0..length).contains(&position),
        "cursor {position} escaped bounds {bounds:?}"
    );

    cursor.frac = (acc & FRAC_MASK) as u32;
    cursor.position = position as i32;
    cursor.direction = direction;
    Some(cursor.position)
}
