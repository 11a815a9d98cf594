//! Display-thread state of the scope grid.

use super::MAX_VOICES;
use crate::settings::ScopeSettings;

/// Per-channel flags and draw options owned by the display thread.
///
/// Mute and record flags live here rather than in the bank: they are only
/// touched by the UI and by the render pass, both on the display thread.
#[derive(Debug, Clone)]
pub struct ScopeView {
    pub(crate) lined: bool,
    pub(crate) channel_numbers: bool,
    pub(crate) visible: bool,
    pub(crate) muted: [bool; MAX_VOICES],
    pub(crate) record: [bool; MAX_VOICES],
    pub(crate) was_cleared: [bool; MAX_VOICES],
    pub(crate) slot_dirty: [bool; MAX_VOICES],
    pub(crate) framework_dirty: bool,
    pub(crate) laid_out_channels: usize,
}

impl Default for ScopeView {
    fn default() -> Self {
        Self {
            lined: false,
            channel_numbers: false,
            visible: true,
            muted: [false; MAX_VOICES],
            record: [false; MAX_VOICES],
            was_cleared: [false; MAX_VOICES],
            slot_dirty: [false; MAX_VOICES],
            framework_dirty: true,
            laid_out_channels: 0,
        }
    }
}

impl ScopeView {
    pub fn new(settings: &ScopeSettings) -> Self {
        let mut view = Self::default();
        view.apply_settings(settings);
        view
    }

    pub fn apply_settings(&mut self, settings: &ScopeSettings) {
        if self.lined != settings.lined_scopes || self.channel_numbers != settings.channel_numbers {
            self.lined = settings.lined_scopes;
            self.channel_numbers = settings.channel_numbers;
            self.request_framework();
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Hides or shows the grid. Showing it schedules a full framework redraw.
    pub fn set_visible(&mut self, visible: bool) {
        if visible && !self.visible {
            self.request_framework();
        }
        self.visible = visible;
    }

    pub fn is_muted(&self, channel: usize) -> bool {
        self.muted.get(channel).copied().unwrap_or(false)
    }

    pub fn is_recording(&self, channel: usize) -> bool {
        self.record.get(channel).copied().unwrap_or(false)
    }

    /// Channels whose mute flag is set, in order.
    pub fn muted_channels(&self) -> impl Iterator<Item = usize> + '_ {
        self.muted
            .iter()
            .enumerate()
            .filter_map(|(channel, &muted)| muted.then_some(channel))
    }

    /// Redraws the outer framework and every slot on the next frame.
    pub fn request_framework(&mut self) {
        self.framework_dirty = true;
    }

    pub(crate) fn request_slot(&mut self, channel: usize) {
        if let Some(dirty) = self.slot_dirty.get_mut(channel) {
            *dirty = true;
        }
        if let Some(cleared) = self.was_cleared.get_mut(channel) {
            *cleared = false;
        }
    }
}
