//! Mouse handling for the scope grid: mute, solo and record arming.

use super::layout::{HitTarget, ScopeLayout};
use super::view::ScopeView;
use crate::mixer::MixerControl;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MouseButtons {
    pub left: bool,
    pub right: bool,
}

impl MouseButtons {
    pub const LEFT: Self = Self {
        left: true,
        right: false,
    };
    pub const RIGHT: Self = Self {
        left: false,
        right: true,
    };
    pub const BOTH: Self = Self {
        left: true,
        right: true,
    };
}

impl ScopeView {
    pub fn hit_test(&self, channel_count: usize, x: u16, y: u16) -> Option<usize> {
        if !self.visible {
            return None;
        }
        ScopeLayout::new(channel_count).hit_test(x, y)
    }

    /// Handles a button press. Returns `true` if the press landed on the
    /// scope grid and should not be passed on to other widgets.
    ///
    /// Left toggles mute, both buttons solo, anything else toggles record.
    pub fn handle_mouse_down<M: MixerControl + ?Sized>(
        &mut self,
        channel_count: usize,
        x: u16,
        y: u16,
        buttons: MouseButtons,
        mixer: &mut M,
    ) -> bool {
        if !self.visible {
            return false;
        }

        let layout = ScopeLayout::new(channel_count);
        let channel = match layout.hit(x, y) {
            None => return false,
            Some(HitTarget::Framework) => return true,
            Some(HitTarget::Channel(channel)) => channel,
        };

        match (buttons.left, buttons.right) {
            (true, true) => self.solo(channel, layout.channels(), mixer),
            (true, false) => self.toggle_mute(channel, mixer),
            _ => self.toggle_record(channel),
        }
        true
    }

    pub fn toggle_mute<M: MixerControl + ?Sized>(&mut self, channel: usize, mixer: &mut M) {
        let muted = !self.is_muted(channel);
        self.set_muted(channel, muted, mixer);
    }

    /// Sets a channel's mute flag and enables or silences its mixer voice.
    pub fn set_muted<M: MixerControl + ?Sized>(
        &mut self,
        channel: usize,
        muted: bool,
        mixer: &mut M,
    ) {
        let Some(flag) = self.muted.get_mut(channel) else {
            return;
        };
        *flag = muted;
        mixer.set_channel_enabled(channel, !muted);
        self.request_slot(channel);
    }

    /// Solos `channel`, or unmutes everything if another channel was already muted.
    pub fn solo<M: MixerControl + ?Sized>(
        &mut self,
        channel: usize,
        channel_count: usize,
        mixer: &mut M,
    ) {
        let channel_count = channel_count.min(self.muted.len());
        let others_muted = (0..channel_count).any(|ch| ch != channel && self.muted[ch]);

        if others_muted {
            debug!("[scopes] restoring all {channel_count} channels");
            for ch in 0..channel_count {
                self.set_muted(ch, false, mixer);
            }
        } else {
            debug!("[scopes] solo channel {}", channel + 1);
            for ch in 0..channel_count {
                self.set_muted(ch, ch != channel, mixer);
            }
        }
    }

    /// Arms or disarms multichannel recording on `channel`; the mixer is untouched.
    pub fn toggle_record(&mut self, channel: usize) {
        if let Some(flag) = self.record.get_mut(channel) {
            *flag ^= true;
            self.request_slot(channel);
        }
    }

    /// Clears every mute flag without touching the mixer, as done when a new song is loaded.
    pub fn unmute_all(&mut self) {
        self.muted.fill(false);
        self.was_cleared.fill(false);
        self.request_framework();
    }
}
