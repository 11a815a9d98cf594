//! User-facing scope configuration.

pub mod persistence;

pub use persistence::SettingsManager;

use crate::scope::MAX_VOICES;
use serde::{Deserialize, Serialize};

const TICK_RATE_RANGE: (f64, f64) = (10.0, 1000.0);
const MAX_SPIN_MARGIN_US: u64 = 5_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopeSettings {
    /// Connect consecutive columns with lines instead of plotting points.
    pub lined_scopes: bool,
    pub channel_numbers: bool,
    /// Tracking loop rate, nominally the display's vertical blank rate.
    pub tick_rate_hz: f64,
    /// How long before a tick deadline the tracker stops sleeping and yields.
    pub spin_margin_us: u64,
    pub channel_count: usize,
}

impl Default for ScopeSettings {
    fn default() -> Self {
        Self {
            lined_scopes: false,
            channel_numbers: false,
            tick_rate_hz: 60.0,
            spin_margin_us: 1_000,
            channel_count: 8,
        }
    }
}

impl ScopeSettings {
    pub fn sanitize(&mut self) {
        let (min_rate, max_rate) = TICK_RATE_RANGE;
        self.tick_rate_hz = if self.tick_rate_hz.is_finite() {
            self.tick_rate_hz.clamp(min_rate, max_rate)
        } else {
            Self::default().tick_rate_hz
        };
        self.spin_margin_us = self.spin_margin_us.min(MAX_SPIN_MARGIN_US);
        self.channel_count = (self.channel_count & !1).clamp(2, MAX_VOICES);
    }

    pub fn sanitized(mut self) -> Self {
        self.sanitize();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_clamps_out_of_range_values() {
        let settings = ScopeSettings {
            tick_rate_hz: 5_000.0,
            spin_margin_us: 60_000,
            channel_count: 33,
            ..ScopeSettings::default()
        }
        .sanitized();
        assert_eq!(settings.tick_rate_hz, 1000.0);
        assert_eq!(settings.spin_margin_us, MAX_SPIN_MARGIN_US);
        assert_eq!(settings.channel_count, 32);

        let settings = ScopeSettings {
            tick_rate_hz: f64::NAN,
            channel_count: 1,
            ..ScopeSettings::default()
        }
        .sanitized();
        assert_eq!(settings.tick_rate_hz, 60.0);
        assert_eq!(settings.channel_count, 2);
    }

    #[test]
    fn odd_channel_counts_round_down() {
        let settings = ScopeSettings {
            channel_count: 11,
            ..ScopeSettings::default()
        }
        .sanitized();
        assert_eq!(settings.channel_count, 10);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let settings: ScopeSettings =
            serde_json::from_str(r#"{ "lined_scopes": true }"#).expect("valid json");
        assert!(settings.lined_scopes);
        assert_eq!(settings.channel_count, 8);
        assert_eq!(settings.tick_rate_hz, 60.0);
    }
}
