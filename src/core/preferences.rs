//! Current speech preferences
//!
//! Defaults merged into requests that leave pitch, rate or volume unset. The
//! hint delay follows the rate.

use std::time::Duration;

pub const DEFAULT_RATE: f32 = 1.0;
pub const DEFAULT_PITCH: f32 = 1.0;
pub const DEFAULT_VOLUME: f32 = 1.0;

/// Base pause before a delayed utterance, at rate 1.0
const BASE_HINT_DELAY_MS: f64 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Preferences {
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            rate: DEFAULT_RATE,
            pitch: DEFAULT_PITCH,
            volume: DEFAULT_VOLUME,
        }
    }
}

impl Preferences {
    pub fn new(rate: f32, pitch: f32, volume: f32) -> Self {
        Self { rate, pitch, volume }
    }

    pub fn is_muted(&self) -> bool {
        self.volume <= 0.0
    }

    /// Pause inserted before a delayed utterance: `1000ms / rate`
    pub fn hint_delay(&self) -> Duration {
        if !self.rate.is_finite() || self.rate <= 0.0 {
            return Duration::from_millis(BASE_HINT_DELAY_MS as u64);
        }
        Duration::from_secs_f64(BASE_HINT_DELAY_MS / f64::from(self.rate) / 1000.0)
    }
}
