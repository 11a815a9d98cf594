//! Fixed-capacity channel container shared by the replayer, tracking and display contexts.

use super::latch::Trigger;
use super::state::{ScopeChannel, ScopeSnapshot};
use super::{MAX_VOICES, ScopeError, ScopeResult};
use crate::mixer::{ChannelSync, EditorLink, PREVIEW_INSTRUMENT, SampleHeader, UpdateStatus};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tracing::warn;

const DEFAULT_TICK_RATE_HZ: f64 = 60.0;
const UPDATE_WAIT_LIMIT: Duration = Duration::from_millis(50);

#[derive(Debug)]
pub struct ScopeBank {
    channels: Box<[ScopeChannel]>,
    channel_count: AtomicUsize,
    tick_rate_bits: AtomicU64,
    updating: AtomicBool,
    mixing_suspended: AtomicBool,
}

impl Default for ScopeBank {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_RATE_HZ)
    }
}

impl ScopeBank {
    pub fn new(tick_rate_hz: f64) -> Self {
        Self {
            channels: (0..MAX_VOICES).map(|_| ScopeChannel::default()).collect(),
            channel_count: AtomicUsize::new(8),
            tick_rate_bits: AtomicU64::new(tick_rate_hz.to_bits()),
            updating: AtomicBool::new(false),
            mixing_suspended: AtomicBool::new(false),
        }
    }

    /// Sets the number of song channels. Must be even and within `2..=MAX_VOICES`.
    pub fn set_channel_count(&self, count: usize) -> ScopeResult<()> {
        if count < 2 || count > MAX_VOICES || count % 2 != 0 {
            return Err(ScopeError::InvalidChannelCount(count));
        }
        self.channel_count.store(count, Ordering::Relaxed);
        Ok(())
    }

    pub fn channel_count(&self) -> usize {
        self.channel_count.load(Ordering::Relaxed)
    }

    pub fn channel(&self, channel: usize) -> Option<&ScopeChannel> {
        self.channels.get(channel)
    }

    pub(crate) fn active_channels(&self) -> &[ScopeChannel] {
        &self.channels[..self.channel_count().min(self.channels.len())]
    }

    pub fn tick_rate_hz(&self) -> f64 {
        f64::from_bits(self.tick_rate_bits.load(Ordering::Relaxed))
    }

    /// Changes the tracking rate and rescales every channel's per-tick delta to it.
    pub(crate) fn set_tick_rate_hz(&self, hz: f64) {
        self.tick_rate_bits.store(hz.to_bits(), Ordering::Relaxed);
        for ch in self.channels.iter() {
            ch.params.retune(hz);
        }
    }

    /// Set by the replayer while sample memory is being rewritten; scopes draw flat.
    pub fn set_mixing_suspended(&self, suspended: bool) {
        self.mixing_suspended.store(suspended, Ordering::Relaxed);
    }

    pub fn mixing_suspended(&self) -> bool {
        self.mixing_suspended.load(Ordering::Relaxed)
    }

    /// Advisory flag raised while a tracking tick is in progress.
    pub fn is_updating(&self) -> bool {
        self.updating.load(Ordering::Acquire)
    }

    pub(crate) fn set_updating(&self, updating: bool) {
        self.updating.store(updating, Ordering::Release);
    }

    pub fn notify_volume(&self, channel: usize, final_volume: u16) {
        if let Some(ch) = self.channel(channel) {
            ch.params.set_volume(final_volume);
        }
    }

    pub fn notify_rate(&self, channel: usize, frequency_hz: u32) {
        if let Some(ch) = self.channel(channel) {
            ch.params.set_rate(frequency_hz, self.tick_rate_hz());
        }
    }

    /// Publishes new sample metadata for pickup on the next tracking tick.
    pub fn notify_trigger(&self, channel: usize, trigger: Trigger) {
        if let Some(ch) = self.channel(channel) {
            ch.latch.publish(trigger);
        }
    }

    /// Applies one replayer sync snapshot: volume, rate and triggers per channel.
    pub fn handle_channel_sync(&self, sync: &ChannelSync, editor: &mut EditorLink) {
        for (index, ch) in sync.channels.iter().enumerate().take(self.channel_count()) {
            if ch.status.contains(UpdateStatus::VOLUME) {
                self.notify_volume(index, ch.final_volume);
            }
            if ch.status.contains(UpdateStatus::PERIOD) {
                self.notify_rate(index, ch.frequency_hz);
            }
            if !ch.status.contains(UpdateStatus::TRIGGER) {
                continue;
            }
            let Some(header) = &ch.sample else {
                continue;
            };

            let preview = ch.instrument == PREVIEW_INSTRUMENT;
            let start_offset = if preview {
                let offset = ch.start_offset.saturating_add(editor.preview_offset);
                editor.preview_offset = 0;
                offset
            } else {
                ch.start_offset
            };
            self.notify_trigger(index, trigger_from_header(header, start_offset));

            if preview
                || (ch.instrument == editor.current_instrument
                    && ch.sample_number == editor.current_sample)
            {
                editor.live_channel = Some(index);
            }
        }
    }

    /// Frame offset of the channel's cursor, or `None` while a trigger is in
    /// flight, the state is busy, or the channel is idle.
    pub fn query_cursor(&self, channel: usize) -> Option<u32> {
        let ch = self.channel(channel)?;
        if ch.latch.is_pending() {
            return None;
        }
        let position = ch.state.try_lock()?.position()?;
        (!ch.latch.is_pending()).then_some(position)
    }

    pub fn snapshot(&self, channel: usize) -> Option<ScopeSnapshot> {
        self.channel(channel).map(ScopeChannel::snapshot)
    }

    /// Drops pending triggers and silences every channel.
    pub fn stop_all(&self) {
        let started = Instant::now();
        while self.is_updating() {
            if started.elapsed() > UPDATE_WAIT_LIMIT {
                warn!("[scopes] tick still running after {UPDATE_WAIT_LIMIT:?}; stopping anyway");
                break;
            }
            std::thread::yield_now();
        }

        for ch in self.channels.iter() {
            ch.latch.discard();
            ch.state.lock().deactivate();
        }
    }
}

fn trigger_from_header(header: &SampleHeader, start_offset: u32) -> Trigger {
    Trigger {
        data: header.data.clone(),
        length: header.length,
        loop_start: header.loop_start,
        loop_length: header.loop_length,
        flags: header.flags,
        start_offset,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mixer::{SampleData, SyncChannel};
    use crate::scope::tracker;

    fn header(frames: usize) -> SampleHeader {
        SampleHeader::from_data(SampleData::Pcm8(vec![1; frames].into()), 0, 0, 0)
    }

    fn sync_trigger(instrument: u8, sample_number: u8, start_offset: u32) -> SyncChannel {
        SyncChannel {
            status: UpdateStatus::VOLUME | UpdateStatus::PERIOD | UpdateStatus::TRIGGER,
            final_volume: 256,
            frequency_hz: 8363,
            sample: Some(header(1000)),
            instrument,
            sample_number,
            start_offset,
        }
    }

    #[test]
    fn rejects_odd_or_out_of_range_channel_counts() {
        let bank = ScopeBank::default();
        assert!(bank.set_channel_count(0).is_err());
        assert!(bank.set_channel_count(7).is_err());
        assert!(bank.set_channel_count(MAX_VOICES + 2).is_err());
        assert!(bank.set_channel_count(32).is_ok());
        assert_eq!(bank.channel_count(), 32);
    }

    #[test]
    fn sync_updates_params_and_latches_trigger() {
        let bank = ScopeBank::default();
        let mut editor = EditorLink::default();
        let sync = ChannelSync {
            channels: vec![sync_trigger(1, 0, 40)],
        };
        bank.handle_channel_sync(&sync, &mut editor);

        let ch = bank.channel(0).expect("channel 0");
        assert_eq!(ch.params().volume(), 36);
        assert!(ch.params().tracking_delta() > 0);
        assert!(ch.latch.is_pending());
        assert_eq!(bank.query_cursor(0), None);

        tracker::tick(&bank, &mut [0; MAX_VOICES]);
        assert_eq!(bank.query_cursor(0), Some(40));
    }

    #[test]
    fn preview_trigger_consumes_one_shot_offset() {
        let bank = ScopeBank::default();
        let mut editor = EditorLink {
            preview_offset: 100,
            ..EditorLink::default()
        };
        let sync = ChannelSync {
            channels: vec![SyncChannel::default(), sync_trigger(PREVIEW_INSTRUMENT, 0, 5)],
        };

        bank.handle_channel_sync(&sync, &mut editor);
        tracker::tick(&bank, &mut [0; MAX_VOICES]);

        assert_eq!(bank.query_cursor(1), Some(105));
        assert_eq!(editor.preview_offset, 0);
        assert_eq!(editor.live_channel, Some(1));
    }

    #[test]
    fn live_channel_follows_current_instrument_sample() {
        let bank = ScopeBank::default();
        let mut editor = EditorLink {
            current_instrument: 3,
            current_sample: 1,
            ..EditorLink::default()
        };
        let sync = ChannelSync {
            channels: vec![
                sync_trigger(2, 1, 0),
                sync_trigger(3, 0, 0),
                sync_trigger(3, 1, 0),
            ],
        };
        bank.handle_channel_sync(&sync, &mut editor);
        assert_eq!(editor.live_channel, Some(2));
    }

    #[test]
    fn channels_beyond_song_count_are_ignored() {
        let bank = ScopeBank::default();
        bank.set_channel_count(2).expect("valid count");
        let mut editor = EditorLink::default();
        let sync = ChannelSync {
            channels: vec![sync_trigger(1, 0, 0); 4],
        };
        bank.handle_channel_sync(&sync, &mut editor);
        assert!(bank.channel(1).expect("ch1").latch.is_pending());
        assert!(!bank.channel(2).expect("ch2").latch.is_pending());
    }

    #[test]
    fn stop_all_discards_pending_and_active_channels() {
        let bank = ScopeBank::default();
        let mut editor = EditorLink::default();
        let sync = ChannelSync {
            channels: vec![sync_trigger(1, 0, 0), sync_trigger(1, 0, 0)],
        };
        bank.handle_channel_sync(&sync, &mut editor);
        tracker::tick(&bank, &mut [0; MAX_VOICES]);
        bank.notify_trigger(1, trigger_from_header(&header(10), 0));

        bank.stop_all();

        assert_eq!(bank.query_cursor(0), None);
        assert!(!bank.channel(1).expect("ch1").latch.is_pending());
        tracker::tick(&bank, &mut [0; MAX_VOICES]);
        assert_eq!(bank.query_cursor(1), None);
    }

    #[test]
    fn tick_rate_change_rescales_sounding_channels() {
        let bank = ScopeBank::default();
        bank.notify_rate(0, 6000);
        bank.notify_trigger(0, trigger_from_header(&header(20_000), 0));
        tracker::tick(&bank, &mut [0; MAX_VOICES]);

        bank.set_tick_rate_hz(120.0);
        let ch = bank.channel(0).expect("channel 0");
        assert_eq!(ch.params().tracking_delta(), 50 << 16);

        let mut carry = [0; MAX_VOICES];
        for _ in 0..120 {
            tracker::tick(&bank, &mut carry);
        }
        assert_eq!(bank.query_cursor(0), Some(6000));
    }

    #[test]
    fn out_of_range_channels_are_ignored() {
        let bank = ScopeBank::default();
        bank.notify_volume(MAX_VOICES, 64);
        bank.notify_rate(MAX_VOICES + 1, 8363);
        bank.notify_trigger(MAX_VOICES, Trigger::default());
        assert_eq!(bank.query_cursor(MAX_VOICES), None);
        assert!(bank.snapshot(MAX_VOICES).is_none());
    }
}
