//! Per-channel scope state.

use super::latch::{LatchRing, Trigger};
use super::position::{self, Cursor, LoopBounds, LoopType};
use super::SCOPE_HEIGHT;
use crate::mixer::{SampleKind, SampleRef};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicI8, AtomicU32, Ordering};
use tracing::debug;

/// Playback state owned by the tracking loop.
#[derive(Debug, Clone, Default)]
pub struct ScopeState {
    pub active: bool,
    pub kind: SampleKind,
    pub sample: Option<SampleRef>,
    pub bounds: LoopBounds,
    pub cursor: Cursor,
}

impl ScopeState {
    /// Replaces the state with a freshly latched trigger.
    ///
    /// Lengths arrive in bytes and are converted to frames, loop bounds are
    /// clamped to the buffer, and an offset already past the end leaves the
    /// channel inactive.
    pub fn latch(&mut self, trigger: Trigger) {
        self.active = false;
        self.cursor = Cursor::default();

        let Some(sample) = trigger.data else {
            self.sample = None;
            return;
        };

        let kind = SampleKind::from_flags(trigger.flags);
        let per_frame = kind.bytes_per_frame();
        debug_assert!(
            kind == SampleKind::Signed8
                || (trigger.length | trigger.loop_start | trigger.loop_length) & 1 == 0,
            "16-bit sample bounds must be even"
        );

        let buffer_frames = if sample.kind() == kind {
            u32::try_from(sample.frames()).unwrap_or(u32::MAX)
        } else {
            0
        };
        let length = (trigger.length / per_frame).min(buffer_frames);
        let loop_start = (trigger.loop_start / per_frame).min(length);
        let loop_length = (trigger.loop_length / per_frame).min(length - loop_start);

        let mut loop_type = LoopType::from_flags(trigger.flags);
        if loop_length < 1 {
            loop_type = LoopType::None;
        }

        let end = if loop_type.is_looping() {
            loop_start + loop_length
        } else {
            length
        };

        self.kind = kind;
        self.sample = Some(sample);
        self.bounds = LoopBounds {
            length: clamp_i32(end),
            loop_start: clamp_i32(loop_start),
            loop_length: clamp_i32(loop_length),
            loop_type,
        };

        if end == 0 || trigger.start_offset >= end {
            debug!(
                "[scopes] trigger offset {} outside sample of {} frames; channel idle",
                trigger.start_offset, end
            );
            return;
        }

        self.cursor = Cursor::at(clamp_i32(trigger.start_offset));
        self.active = true;
    }

    /// Advances the tracking cursor, deactivating at the end of an unlooped sample.
    pub fn step(&mut self, delta: u32) {
        if self.active && position::advance(&self.bounds, &mut self.cursor, delta).is_none() {
            self.active = false;
        }
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }

    /// Current frame offset, if the cursor is valid.
    pub fn position(&self) -> Option<u32> {
        (self.active && (0..self.bounds.length).contains(&self.cursor.position))
            .then_some(self.cursor.position as u32)
    }
}

fn clamp_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// Display parameters written by the replayer side, read by both loops.
#[derive(Debug, Default)]
pub struct ScopeParams {
    volume: AtomicI8,
    frequency_hz: AtomicU32,
    tracking_delta: AtomicU32,
    display_delta: AtomicU32,
}

impl ScopeParams {
    /// Scales a final channel volume (0..=256) to scope pixels.
    pub fn set_volume(&self, final_volume: u16) {
        let scaled = (u32::from(final_volume.min(256)) * SCOPE_HEIGHT as u32) / 256;
        self.volume.store(scaled as i8, Ordering::Relaxed);
    }

    /// Converts an output frequency to per-tick and per-pixel 16.16 deltas.
    pub fn set_rate(&self, frequency_hz: u32, tick_rate_hz: f64) {
        self.frequency_hz.store(frequency_hz, Ordering::Relaxed);
        self.display_delta
            .store(frequency_hz.saturating_mul(16), Ordering::Relaxed);
        self.retune(tick_rate_hz);
    }

    /// Recomputes the per-tick delta of the last reported frequency for a new tick rate.
    pub fn retune(&self, tick_rate_hz: f64) {
        let frequency_hz = self.frequency_hz.load(Ordering::Relaxed);
        let per_tick = (f64::from(frequency_hz) * 65_536.0 / tick_rate_hz.max(1.0)).round();
        self.tracking_delta
            .store(per_tick.min(f64::from(u32::MAX)) as u32, Ordering::Relaxed);
    }

    pub fn frequency_hz(&self) -> u32 {
        self.frequency_hz.load(Ordering::Relaxed)
    }

    pub fn volume(&self) -> i8 {
        self.volume.load(Ordering::Relaxed)
    }

    pub fn tracking_delta(&self) -> u32 {
        self.tracking_delta.load(Ordering::Relaxed)
    }

    pub fn display_delta(&self) -> u32 {
        self.display_delta.load(Ordering::Relaxed)
    }
}

/// Coherent copy of a channel taken for one rendered frame.
#[derive(Debug, Clone, Default)]
pub struct ScopeSnapshot {
    pub state: ScopeState,
    pub volume: i8,
    pub display_delta: u32,
}

impl ScopeSnapshot {
    pub fn is_drawable(&self) -> bool {
        self.state.active && self.state.sample.is_some() && self.volume > 0
    }
}

/// Everything the engine keeps for one channel.
#[derive(Debug, Default)]
pub struct ScopeChannel {
    pub(crate) latch: LatchRing,
    pub(crate) params: ScopeParams,
    pub(crate) state: Mutex<ScopeState>,
}

impl ScopeChannel {
    /// Full-struct copy of the channel as of now.
    pub fn snapshot(&self) -> ScopeSnapshot {
        let state = self.state.lock().clone();
        ScopeSnapshot {
            state,
            volume: self.params.volume(),
            display_delta: self.params.display_delta(),
        }
    }

    pub fn params(&self) -> &ScopeParams {
        &self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mixer::SampleData;
    use crate::scope::position::Direction;
    use std::sync::Arc;

    fn pcm8(frames: usize) -> Option<SampleRef> {
        Some(Arc::new(SampleData::Pcm8(vec![0; frames].into())))
    }

    fn pcm16(frames: usize) -> Option<SampleRef> {
        Some(Arc::new(SampleData::Pcm16(vec![0; frames].into())))
    }

    #[test]
    fn latch_activates_at_start_offset() {
        let mut state = ScopeState::default();
        state.latch(Trigger {
            data: pcm8(1000),
            length: 1000,
            start_offset: 123,
            ..Trigger::default()
        });
        assert!(state.active);
        assert_eq!(state.position(), Some(123));
        assert_eq!(state.cursor.direction, Direction::Forward);
        assert_eq!(state.bounds.loop_type, LoopType::None);
    }

    #[test]
    fn empty_or_missing_buffers_deactivate() {
        let mut state = ScopeState::default();
        state.latch(Trigger {
            data: pcm8(100),
            length: 100,
            ..Trigger::default()
        });
        assert!(state.active);

        state.latch(Trigger {
            data: pcm8(100),
            length: 0,
            ..Trigger::default()
        });
        assert!(!state.active);

        state.latch(Trigger {
            data: None,
            length: 100,
            ..Trigger::default()
        });
        assert!(!state.active);
        assert!(state.sample.is_none());
    }

    #[test]
    fn offset_past_end_deactivates() {
        let mut state = ScopeState::default();
        state.latch(Trigger {
            data: pcm8(100),
            length: 100,
            start_offset: 100,
            ..Trigger::default()
        });
        assert!(!state.active);
        assert_eq!(state.position(), None);
    }

    #[test]
    fn sixteen_bit_lengths_are_halved() {
        let mut state = ScopeState::default();
        state.latch(Trigger {
            data: pcm16(500),
            length: 1000,
            loop_start: 200,
            loop_length: 600,
            flags: 16 | 1,
            start_offset: 10,
        });
        assert_eq!(state.kind, SampleKind::Signed16);
        assert_eq!(state.bounds.loop_start, 100);
        assert_eq!(state.bounds.loop_length, 300);
        assert_eq!(state.bounds.length, 400);
        assert_eq!(state.bounds.loop_type, LoopType::Forward);
        assert_eq!(state.position(), Some(10));
    }

    #[test]
    fn loop_bounds_are_clamped_to_buffer() {
        let mut state = ScopeState::default();
        state.latch(Trigger {
            data: pcm8(100),
            length: 5000,
            loop_start: 80,
            loop_length: 500,
            flags: 2,
            start_offset: 0,
        });
        assert_eq!(state.bounds.length, 100);
        assert_eq!(state.bounds.loop_start, 80);
        assert_eq!(state.bounds.loop_length, 20);
        assert_eq!(state.bounds.loop_type, LoopType::PingPong);
    }

    #[test]
    fn zero_length_loop_falls_back_to_one_shot() {
        let mut state = ScopeState::default();
        state.latch(Trigger {
            data: pcm8(100),
            length: 100,
            loop_start: 100,
            loop_length: 40,
            flags: 1,
            start_offset: 0,
        });
        assert_eq!(state.bounds.loop_type, LoopType::None);
        assert_eq!(state.bounds.length, 100);
    }

    #[test]
    fn both_loop_bits_loop_forward() {
        let mut state = ScopeState::default();
        state.latch(Trigger {
            data: pcm8(100),
            length: 100,
            loop_start: 20,
            loop_length: 50,
            flags: 3,
            start_offset: 60,
        });
        assert_eq!(state.bounds.loop_type, LoopType::Forward);
        assert_eq!(state.bounds.length, 70);

        state.step(20 << 16);
        assert!(state.active);
        assert_eq!(state.position(), Some(30));
        assert_eq!(state.cursor.direction, Direction::Forward);
    }

    #[test]
    fn step_deactivates_at_sample_end() {
        let mut state = ScopeState::default();
        state.latch(Trigger {
            data: pcm8(4),
            length: 4,
            start_offset: 2,
            ..Trigger::default()
        });
        state.step(1 << 16);
        assert_eq!(state.position(), Some(3));
        state.step(1 << 16);
        assert!(!state.active);
    }

    #[test]
    fn params_scale_volume_and_rates() {
        let params = ScopeParams::default();
        params.set_volume(256);
        assert_eq!(params.volume(), SCOPE_HEIGHT as i8);
        params.set_volume(128);
        assert_eq!(params.volume(), 18);

        params.set_rate(6000, 60.0);
        assert_eq!(params.tracking_delta(), 100 << 16);
        assert_eq!(params.display_delta(), 6000 << 4);
    }

    #[test]
    fn retune_rescales_tracking_but_not_display_delta() {
        let params = ScopeParams::default();
        params.set_rate(6000, 60.0);
        params.retune(120.0);
        assert_eq!(params.frequency_hz(), 6000);
        assert_eq!(params.tracking_delta(), 50 << 16);
        assert_eq!(params.display_delta(), 6000 << 4);
    }

    #[test]
    fn snapshot_is_detached_from_live_state() {
        let channel = ScopeChannel::default();
        channel.state.lock().latch(Trigger {
            data: pcm8(10),
            length: 10,
            ..Trigger::default()
        });
        let snapshot = channel.snapshot();
        channel.state.lock().step(3 << 16);
        assert_eq!(snapshot.state.position(), Some(0));
        assert_eq!(channel.state.lock().position(), Some(3));
    }
}
