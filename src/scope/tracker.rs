//! Tracking loop: advances every channel's cursor once per fixed tick.

use super::bank::ScopeBank;
use super::timing::TickClock;
use super::MAX_VOICES;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};

/// Runs one tracking tick over the song's channels.
///
/// `carry` counts ticks a channel missed because its state was held by a
/// render snapshot; those ticks are folded into the next successful step.
pub fn tick(bank: &ScopeBank, carry: &mut [u32; MAX_VOICES]) {
    bank.set_updating(true);

    for (channel, missed) in bank.active_channels().iter().zip(carry.iter_mut()) {
        let Some(mut state) = channel.state.try_lock() else {
            *missed = missed.saturating_add(1);
            continue;
        };

        // A freshly triggered channel does not step on its trigger tick.
        if channel.latch.consume(|trigger| state.latch(trigger)).is_some() {
            *missed = 0;
            continue;
        }

        if state.active {
            let delta = channel
                .params
                .tracking_delta()
                .saturating_mul(missed.saturating_add(1));
            state.step(delta);
        }
        *missed = 0;
    }

    bank.set_updating(false);
}

/// Body of the tracking thread. Returns once `running` is cleared.
pub(crate) fn run(bank: Arc<ScopeBank>, running: Arc<AtomicBool>, mut clock: TickClock) {
    let mut carry = [0u32; MAX_VOICES];
    let mut resyncs = 0u64;

    info!("[tracker] started at {:.2} Hz", clock.rate_hz());

    while running.load(Ordering::Acquire) {
        tick(&bank, &mut carry);

        if let Some(behind) = clock.wait_next() {
            resyncs += 1;
            warn!("[tracker] fell {behind} ticks behind schedule; resynchronised");
        }
    }

    info!("[tracker] stopped after {} ticks ({resyncs} resyncs)", clock.ticks());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mixer::SampleData;
    use crate::scope::latch::Trigger;
    use crate::scope::position::LoopType;
    use crate::scope::view::ScopeView;
    use crate::video::Framebuffer;
    use std::thread;

    const ONE: u32 = 1 << 16;

    fn looping_trigger(
        frames: usize,
        loop_start: u32,
        loop_length: u32,
        flags: u8,
        offset: u32,
    ) -> Trigger {
        let data: Vec<i8> = (0..frames).map(|i| (i % 256) as u8 as i8).collect();
        Trigger {
            data: Some(Arc::new(SampleData::Pcm8(data.into()))),
            length: frames as u32,
            loop_start,
            loop_length,
            flags,
            start_offset: offset,
        }
    }

    fn bank_with_rate(delta: u32) -> ScopeBank {
        let bank = ScopeBank::default();
        for ch in 0..bank.channel_count() {
            // 60 Hz ticks: frequency = delta * 60 / 65536
            bank.notify_rate(ch, (u64::from(delta) * 60 / 65_536) as u32);
        }
        bank
    }

    #[test]
    fn trigger_tick_does_not_step() {
        let bank = bank_with_rate(ONE);
        let mut carry = [0; MAX_VOICES];
        bank.notify_trigger(0, looping_trigger(1000, 0, 0, 0, 17));

        tick(&bank, &mut carry);
        assert_eq!(bank.query_cursor(0), Some(17));

        tick(&bank, &mut carry);
        assert_eq!(bank.query_cursor(0), Some(18));
    }

    #[test]
    fn zero_length_trigger_deactivates_after_one_tick() {
        let bank = bank_with_rate(ONE);
        let mut carry = [0; MAX_VOICES];
        bank.notify_trigger(0, looping_trigger(100, 0, 0, 0, 0));
        tick(&bank, &mut carry);
        assert!(bank.query_cursor(0).is_some());

        let mut empty = looping_trigger(100, 10, 20, 1, 5);
        empty.length = 0;
        bank.notify_trigger(0, empty);
        tick(&bank, &mut carry);
        assert_eq!(bank.query_cursor(0), None);
        assert!(!bank.snapshot(0).expect("channel").state.active);
    }

    #[test]
    fn ping_pong_reflects_over_150_ticks() {
        let bank = bank_with_rate(ONE);
        let mut carry = [0; MAX_VOICES];
        bank.notify_trigger(0, looping_trigger(1000, 900, 100, 2, 950));
        tick(&bank, &mut carry);

        for _ in 0..50 {
            tick(&bank, &mut carry);
        }
        let state = bank.snapshot(0).expect("channel").state;
        assert_eq!(state.bounds.loop_type, LoopType::PingPong);
        assert_eq!(state.cursor.position, 999);

        for _ in 50..150 {
            tick(&bank, &mut carry);
        }
        let state = bank.snapshot(0).expect("channel").state;
        assert!(state.cursor.position >= 900);
        assert_eq!(state.cursor.direction, crate::scope::position::Direction::Forward);
    }

    #[test]
    fn contended_channel_carries_missed_ticks() {
        let bank = bank_with_rate(ONE);
        let mut carry = [0; MAX_VOICES];
        bank.notify_trigger(0, looping_trigger(1000, 0, 0, 0, 0));
        tick(&bank, &mut carry);

        {
            let _held = bank.channel(0).expect("channel").state.lock();
            tick(&bank, &mut carry);
            tick(&bank, &mut carry);
        }
        assert_eq!(carry[0], 2);

        tick(&bank, &mut carry);
        assert_eq!(bank.query_cursor(0), Some(3));
        assert_eq!(carry[0], 0);
    }

    #[test]
    fn channels_are_independent() {
        let bank = bank_with_rate(ONE);
        let mut carry = [0; MAX_VOICES];
        bank.notify_trigger(0, looping_trigger(10, 0, 0, 0, 8));
        bank.notify_trigger(1, looping_trigger(1000, 0, 0, 0, 0));
        tick(&bank, &mut carry);
        tick(&bank, &mut carry);
        tick(&bank, &mut carry);
        assert_eq!(bank.query_cursor(0), None);
        assert_eq!(bank.query_cursor(1), Some(2));
    }

    #[test]
    fn concurrent_render_never_sees_out_of_range_cursor() {
        let bank = Arc::new(bank_with_rate(ONE * 37));
        let done = Arc::new(AtomicBool::new(false));

        let tracker = {
            let bank = Arc::clone(&bank);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let mut carry = [0; MAX_VOICES];
                let mut n = 0u32;
                while !done.load(Ordering::Acquire) {
                    if n % 16 == 0 {
                        let frames = 64 + (n as usize % 512);
                        let offset = (n * 7) % (frames as u32 + 8);
                        let trigger = looping_trigger(frames, 32, 30, (n % 3) as u8, offset);
                        bank.notify_trigger(0, trigger);
                    }
                    tick(&bank, &mut carry);
                    n = n.wrapping_add(1);
                }
            })
        };

        let mut view = ScopeView::default();
        let mut fb = Framebuffer::default();
        for _ in 0..2_000 {
            let snapshot = bank.snapshot(0).expect("channel");
            if snapshot.state.active {
                let pos = snapshot.state.cursor.position;
                assert!((0..snapshot.state.bounds.length).contains(&pos));
            }
            view.render_frame(&bank, &mut fb);
        }

        done.store(true, Ordering::Release);
        tracker.join().expect("tracker panicked");
    }
}
