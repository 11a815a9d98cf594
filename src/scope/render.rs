//! Render pass: paints channel snapshots into the framebuffer once per frame.

use super::bank::ScopeBank;
use super::layout::{
    FRAMEWORK_HEIGHT, FRAMEWORK_WIDTH, FRAMEWORK_X, FRAMEWORK_Y, ScopeLayout, ScopeSlot,
};
use super::position::{self, Cursor};
use super::state::ScopeSnapshot;
use super::view::ScopeView;
use crate::mixer::SampleKind;
use crate::video::bitmaps::{self, REC_BADGE, REC_BADGE_OFFSET_Y};
use crate::video::{Framebuffer, FrameworkStyle, PaletteColor};

const MUTE_OVERLAY_OFFSET_Y: i32 = 6;

impl ScopeView {
    /// Paints every channel slot for the current layout.
    ///
    /// Reads the bank only through snapshots; the tracking state is never
    /// written from here.
    pub fn render_frame(&mut self, bank: &ScopeBank, fb: &mut Framebuffer) {
        if !self.visible {
            return;
        }

        let layout = ScopeLayout::new(bank.channel_count());
        if self.framework_dirty || layout.channels() != self.laid_out_channels {
            self.draw_framework(&layout, fb);
        }

        let suspended = bank.mixing_suspended();
        for slot in layout.slots() {
            let ch = slot.channel;
            if self.slot_dirty[ch] {
                self.redraw_slot(&layout, slot, fb);
            }
            if self.muted[ch] {
                continue;
            }

            let snapshot = bank.snapshot(ch).unwrap_or_default();
            if snapshot.is_drawable() && !suspended {
                self.was_cleared[ch] = false;
                fb.clear_rect(i32::from(slot.x), i32::from(slot.y), slot.width, ScopeSlot::HEIGHT);
                draw_trace(fb, slot, &snapshot, self.lined);
            } else if !self.was_cleared[ch] {
                fb.clear_rect(i32::from(slot.x), i32::from(slot.y), slot.width, ScopeSlot::HEIGHT);
                fb.hline(
                    i32::from(slot.x),
                    i32::from(slot.center_y),
                    slot.width,
                    PaletteColor::Waveform,
                );
                self.was_cleared[ch] = true;
            }

            if self.channel_numbers {
                draw_channel_number(fb, slot, false);
            }
            if self.record[ch] {
                fb.blit_mask(
                    i32::from(slot.x),
                    i32::from(slot.y + REC_BADGE_OFFSET_Y),
                    &REC_BADGE,
                    PaletteColor::Record,
                );
            }
        }
    }

    /// Draws the outer framework and every slot's frame and mute overlay.
    pub fn draw_framework(&mut self, layout: &ScopeLayout, fb: &mut Framebuffer) {
        fb.framework(
            i32::from(FRAMEWORK_X),
            i32::from(FRAMEWORK_Y),
            FRAMEWORK_WIDTH,
            FRAMEWORK_HEIGHT,
            FrameworkStyle::Raised,
        );
        for slot in layout.slots() {
            self.redraw_slot(layout, slot, fb);
        }
        self.framework_dirty = false;
        self.laid_out_channels = layout.channels();
    }

    fn redraw_slot(&mut self, layout: &ScopeLayout, slot: ScopeSlot, fb: &mut Framebuffer) {
        let ch = slot.channel;
        let (fx, fy, fw, fh) = slot.frame_rect();
        fb.framework(i32::from(fx), i32::from(fy), fw, fh, FrameworkStyle::Sunken);

        if self.muted[ch] {
            let (w, h) = layout.mute_overlay_size();
            let x = i32::from(fx) + (i32::from(slot.width) - i32::from(w)) / 2;
            let overlay = bitmaps::mute_overlay(w, h);
            fb.blit_mask(
                x,
                i32::from(fy) + MUTE_OVERLAY_OFFSET_Y,
                &overlay,
                PaletteColor::MuteOverlay,
            );
            if self.channel_numbers {
                draw_channel_number(fb, slot, true);
            }
        }

        self.slot_dirty[ch] = false;
        self.was_cleared[ch] = false;
    }
}

fn draw_channel_number(fb: &mut Framebuffer, slot: ScopeSlot, outlined: bool) {
    let number = u8::try_from(slot.channel + 1).unwrap_or(u8::MAX);
    fb.draw_number(
        i32::from(slot.x),
        i32::from(slot.y) + 1,
        number,
        PaletteColor::Number,
        outlined,
    );
}

/// Display-rate walk over a snapshot, yielding one scaled sample per pixel.
///
/// Once a non-looping sample runs out the walk keeps yielding silence.
struct Trace<'a> {
    snapshot: &'a ScopeSnapshot,
    cursor: Cursor,
    live: bool,
}

impl<'a> Trace<'a> {
    fn new(snapshot: &'a ScopeSnapshot) -> Self {
        Self {
            snapshot,
            cursor: Cursor {
                frac: 0,
                ..snapshot.state.cursor
            },
            live: snapshot.state.active,
        }
    }

    fn sample(&self) -> i32 {
        let Some(data) = self.snapshot.state.sample.as_deref().filter(|_| self.live) else {
            return 0;
        };
        let raw = data.frame(usize::try_from(self.cursor.position).unwrap_or(usize::MAX));
        let volume = i32::from(self.snapshot.volume);
        match self.snapshot.state.kind {
            SampleKind::Signed8 => (raw * volume) >> 8,
            SampleKind::Signed16 => (raw * volume) >> 16,
        }
    }
}

impl Iterator for Trace<'_> {
    type Item = i32;

    fn next(&mut self) -> Option<i32> {
        let value = self.sample();
        if self.live {
            let bounds = &self.snapshot.state.bounds;
            self.live =
                position::advance(bounds, &mut self.cursor, self.snapshot.display_delta).is_some();
        }
        Some(value)
    }
}

fn draw_trace(fb: &mut Framebuffer, slot: ScopeSlot, snapshot: &ScopeSnapshot, lined: bool) {
    let center = i32::from(slot.center_y);
    let left = i32::from(slot.x);
    let width = i32::from(slot.width);
    let mut trace = Trace::new(snapshot);

    if lined {
        let mut y1 = center - trace.next().unwrap_or(0);
        for x in left..left + width - 1 {
            let y2 = center - trace.next().unwrap_or(0);
            fb.line(x, y1, x + 1, y2, PaletteColor::Waveform);
            y1 = y2;
        }
    } else {
        for (x, sample) in (left..left + width).zip(trace) {
            fb.plot(x, center - sample, PaletteColor::Waveform);
        }
    }
}
