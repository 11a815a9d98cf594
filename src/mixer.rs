//! Types shared with the replayer/mixer.
//!
//! The scope engine never reads live mixer state. The replayer hands it
//! sample buffers through [`SampleRef`], a per-frame [`ChannelSync`] snapshot,
//! and accepts mute requests through [`MixerControl`].

use std::sync::Arc;

/// Instrument number used by the sample editor for live previews.
pub const PREVIEW_INSTRUMENT: u8 = 129;

/// Storage width of a sample buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SampleKind {
    #[default]
    Signed8,
    Signed16,
}

impl SampleKind {
    /// Bit set in a sample type byte for 16-bit data.
    pub const FLAG_16BIT: u8 = 16;

    pub fn from_flags(flags: u8) -> Self {
        if flags & Self::FLAG_16BIT != 0 {
            Self::Signed16
        } else {
            Self::Signed8
        }
    }

    pub fn bytes_per_frame(self) -> u32 {
        match self {
            Self::Signed8 => 1,
            Self::Signed16 => 2,
        }
    }

    pub fn frames_to_bytes(self, frames: u32) -> u32 {
        frames.saturating_mul(self.bytes_per_frame())
    }
}

/// Immutable PCM data of one sample. Editors replace the buffer instead of
/// mutating it, so a scope holding a reference always reads valid memory.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleData {
    Pcm8(Box<[i8]>),
    Pcm16(Box<[i16]>),
}

impl SampleData {
    pub fn kind(&self) -> SampleKind {
        match self {
            Self::Pcm8(_) => SampleKind::Signed8,
            Self::Pcm16(_) => SampleKind::Signed16,
        }
    }

    pub fn frames(&self) -> usize {
        match self {
            Self::Pcm8(data) => data.len(),
            Self::Pcm16(data) => data.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.frames() == 0
    }

    /// Raw sample at `frame`, widened to i32. Out-of-range reads are silent.
    #[inline]
    pub fn frame(&self, frame: usize) -> i32 {
        match self {
            Self::Pcm8(data) => data.get(frame).map_or(0, |&s| i32::from(s)),
            Self::Pcm16(data) => data.get(frame).map_or(0, |&s| i32::from(s)),
        }
    }
}

pub type SampleRef = Arc<SampleData>;

/// Sample header as the replayer stores it. Lengths are in bytes.
#[derive(Debug, Clone)]
pub struct SampleHeader {
    pub data: Option<SampleRef>,
    pub length: u32,
    pub loop_start: u32,
    pub loop_length: u32,
    /// Loop type in bits 0-1, 16-bit flag in bit 4.
    pub flags: u8,
}

impl SampleHeader {
    pub fn from_data(data: SampleData, loop_start: u32, loop_length: u32, flags: u8) -> Self {
        let kind = data.kind();
        let length = kind.frames_to_bytes(data.frames() as u32);
        let flags = match kind {
            SampleKind::Signed8 => flags & !SampleKind::FLAG_16BIT,
            SampleKind::Signed16 => flags | SampleKind::FLAG_16BIT,
        };
        Self {
            data: Some(Arc::new(data)),
            length,
            loop_start,
            loop_length,
            flags,
        }
    }
}

/// Per-channel status bits carried by a sync snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpdateStatus(u8);

impl UpdateStatus {
    pub const VOLUME: Self = Self(1);
    pub const PERIOD: Self = Self(2);
    pub const TRIGGER: Self = Self(4);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

impl std::ops::BitOr for UpdateStatus {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

/// One channel of a sync snapshot, already consistent when produced.
#[derive(Debug, Clone, Default)]
pub struct SyncChannel {
    pub status: UpdateStatus,
    /// Final channel volume, 0..=256.
    pub final_volume: u16,
    /// Output frequency derived from the channel's final period.
    pub frequency_hz: u32,
    pub sample: Option<SampleHeader>,
    pub instrument: u8,
    pub sample_number: u8,
    /// Start offset in frames (9xx effect or editor range start).
    pub start_offset: u32,
}

/// Snapshot of all channels taken by the replayer at tick time.
#[derive(Debug, Clone, Default)]
pub struct ChannelSync {
    pub channels: Vec<SyncChannel>,
}

/// Sample-editor state the sync handler reads and updates.
#[derive(Debug, Clone, Copy, Default)]
pub struct EditorLink {
    pub current_instrument: u8,
    pub current_sample: u8,
    /// One-shot offset added to the next preview trigger, then cleared.
    pub preview_offset: u32,
    /// Channel whose cursor the sample editor follows.
    pub live_channel: Option<usize>,
}

/// Capability the scope UI calls to silence or re-enable a replayer channel.
///
/// Disabling a channel must reset its live mixing state (volume, pan,
/// effect) and clear any held envelope sustain.
pub trait MixerControl {
    fn set_channel_enabled(&mut self, channel: usize, enabled: bool);
}

/// Mixing state of one replayer voice, as far as muting is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoiceState {
    pub off: bool,
    pub effect_type: u8,
    pub effect_param: u8,
    pub real_volume: u8,
    pub out_volume: u8,
    pub old_volume: u8,
    pub final_volume: u16,
    pub out_pan: u8,
    pub old_pan: u8,
    pub final_pan: u8,
    pub status: UpdateStatus,
    pub env_sustain_active: bool,
}

impl Default for VoiceState {
    fn default() -> Self {
        Self {
            off: false,
            effect_type: 0,
            effect_param: 0,
            real_volume: 0,
            out_volume: 0,
            old_volume: 0,
            final_volume: 0,
            out_pan: 128,
            old_pan: 128,
            final_pan: 128,
            status: UpdateStatus::empty(),
            env_sustain_active: false,
        }
    }
}

impl VoiceState {
    pub fn set_enabled(&mut self, enabled: bool) {
        self.off = !enabled;
        if self.off {
            self.silence();
        }
    }

    fn silence(&mut self) {
        *self = Self {
            off: true,
            status: UpdateStatus::VOLUME,
            ..Self::default()
        };
    }
}

impl MixerControl for [VoiceState] {
    fn set_channel_enabled(&mut self, channel: usize, enabled: bool) {
        if let Some(voice) = self.get_mut(channel) {
            voice.set_enabled(enabled);
        }
    }
}
