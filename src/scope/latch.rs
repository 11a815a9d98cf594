//! Lock-free trigger handoff between the replayer and the tracking loop.
//!
//! The producer fills the next ring slot and then publishes its ticket with a
//! release store. The tracking loop acquires the ticket, reads the slot it
//! names and only then marks the ticket consumed. Sample buffers are swapped in
//! and out of the slot through `ArcSwapOption`, so a slot overwritten mid-read
//! can only ever yield stale metadata, never a dangling buffer.

use super::NUM_LATCH_BUFFERS;
use crate::mixer::{SampleData, SampleRef};
use arc_swap::ArcSwapOption;
use std::sync::atomic::{AtomicU8, AtomicU32, Ordering};

/// Trigger metadata as published by the replayer. Lengths are in bytes.
#[derive(Debug, Clone, Default)]
pub struct Trigger {
    pub data: Option<SampleRef>,
    pub length: u32,
    pub loop_start: u32,
    pub loop_length: u32,
    /// Loop type in bits 0-1, 16-bit flag in bit 4.
    pub flags: u8,
    pub start_offset: u32,
}

#[derive(Debug, Default)]
struct LatchSlot {
    data: ArcSwapOption<SampleData>,
    length: AtomicU32,
    loop_start: AtomicU32,
    loop_length: AtomicU32,
    flags: AtomicU8,
    start_offset: AtomicU32,
}

impl LatchSlot {
    fn store(&self, trigger: Trigger) {
        self.length.store(trigger.length, Ordering::Relaxed);
        self.loop_start.store(trigger.loop_start, Ordering::Relaxed);
        self.loop_length.store(trigger.loop_length, Ordering::Relaxed);
        self.flags.store(trigger.flags, Ordering::Relaxed);
        self.start_offset
            .store(trigger.start_offset, Ordering::Relaxed);
        self.data.store(trigger.data);
    }

    fn take(&self) -> Trigger {
        Trigger {
            data: self.data.swap(None),
            length: self.length.load(Ordering::Relaxed),
            loop_start: self.loop_start.load(Ordering::Relaxed),
            loop_length: self.loop_length.load(Ordering::Relaxed),
            flags: self.flags.load(Ordering::Relaxed),
            start_offset: self.start_offset.load(Ordering::Relaxed),
        }
    }
}

/// Ring of trigger slots for one channel.
#[derive(Debug)]
pub struct LatchRing {
    slots: [LatchSlot; NUM_LATCH_BUFFERS],
    next_ticket: AtomicU32,
    latched: AtomicU32,
    consumed: AtomicU32,
}

impl Default for LatchRing {
    fn default() -> Self {
        Self::new()
    }
}

impl LatchRing {
    pub fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| LatchSlot::default()),
            next_ticket: AtomicU32::new(0),
            latched: AtomicU32::new(0),
            consumed: AtomicU32::new(0),
        }
    }

    /// Writes `trigger` into the next slot and raises the pending flag.
    /// Never blocks; an unconsumed older trigger is simply superseded.
    pub fn publish(&self, trigger: Trigger) {
        let ticket = self
            .next_ticket
            .fetch_add(1, Ordering::Relaxed)
            .wrapping_add(1);
        self.slots[slot_index(ticket)].store(trigger);
        self.latched.store(ticket, Ordering::Release);
    }

    pub fn is_pending(&self) -> bool {
        self.latched.load(Ordering::Acquire) != self.consumed.load(Ordering::Acquire)
    }

    /// Hands the latest pending trigger to `apply`, then clears the flag.
    pub fn consume<R>(&self, apply: impl FnOnce(Trigger) -> R) -> Option<R> {
        let ticket = self.latched.load(Ordering::Acquire);
        if ticket == self.consumed.load(Ordering::Relaxed) {
            return None;
        }

        let result = apply(self.slots[slot_index(ticket)].take());
        self.consumed.store(ticket, Ordering::Release);
        Some(result)
    }

    /// Drops any pending trigger without reading it.
    pub fn discard(&self) {
        let ticket = self.latched.load(Ordering::Acquire);
        self.consumed.store(ticket, Ordering::Release);
    }
}

#[inline]
fn slot_index(ticket: u32) -> usize {
    ticket as usize % NUM_LATCH_BUFFERS
}
