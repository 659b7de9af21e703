//! Tunable interaction timings and window geometry.
//!
//! The delays encode UX judgement (how long a pointer may be "in transit" between
//! adjacent panels, how eager panels are to appear), so they are defaults, not constants.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::OverlayError;

pub const DEFAULT_PASSTHROUGH_DECAY_MS: u64 = 150;
pub const DEFAULT_PANEL_SHOW_DELAY_MS: u64 = 500;
pub const DEFAULT_PANEL_HIDE_DELAY_MS: u64 = 500;
pub const DEFAULT_MAX_MOVE_DELTA: f64 = 100.0;
pub const DEFAULT_WINDOW_SIZE: f64 = 500.0;
pub const DEFAULT_LINKED_PANEL_GAP: f64 = 5.0;
pub const DEFAULT_BUBBLE_MS: u64 = 5_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OverlayConfig {
    pub passthrough_decay_ms: u64,
    pub panel_show_delay_ms: u64,
    pub panel_hide_delay_ms: u64,
    /// Per-event clamp for window drag deltas, applied on both sides of the channel.
    pub max_move_delta: f64,
    pub window_width: f64,
    pub window_height: f64,
    pub linked_panel_gap: f64,
    pub bubble_default_ms: u64,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            passthrough_decay_ms: DEFAULT_PASSTHROUGH_DECAY_MS,
            panel_show_delay_ms: DEFAULT_PANEL_SHOW_DELAY_MS,
            panel_hide_delay_ms: DEFAULT_PANEL_HIDE_DELAY_MS,
            max_move_delta: DEFAULT_MAX_MOVE_DELTA,
            window_width: DEFAULT_WINDOW_SIZE,
            window_height: DEFAULT_WINDOW_SIZE,
            linked_panel_gap: DEFAULT_LINKED_PANEL_GAP,
            bubble_default_ms: DEFAULT_BUBBLE_MS,
        }
    }
}

impl OverlayConfig {
    /// Load overrides from the environment.
    ///
    /// Reads:
    /// - `DESKPET_DECAY_MS`, `DESKPET_SHOW_DELAY_MS`, `DESKPET_HIDE_DELAY_MS`
    /// - `DESKPET_MAX_MOVE_DELTA`
    /// - `DESKPET_WINDOW_W`, `DESKPET_WINDOW_H`
    /// - `DESKPET_PANEL_GAP`, `DESKPET_BUBBLE_MS`
    ///
    /// Unparseable values fall back to the default; parsed values are clamped.
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            passthrough_decay_ms: env_u64("DESKPET_DECAY_MS", d.passthrough_decay_ms).clamp(0, 5_000),
            panel_show_delay_ms: env_u64("DESKPET_SHOW_DELAY_MS", d.panel_show_delay_ms).clamp(0, 10_000),
            panel_hide_delay_ms: env_u64("DESKPET_HIDE_DELAY_MS", d.panel_hide_delay_ms).clamp(0, 10_000),
            max_move_delta: env_f64("DESKPET_MAX_MOVE_DELTA", d.max_move_delta).clamp(1.0, 10_000.0),
            window_width: env_f64("DESKPET_WINDOW_W", d.window_width).clamp(100.0, 8_000.0),
            window_height: env_f64("DESKPET_WINDOW_H", d.window_height).clamp(100.0, 8_000.0),
            linked_panel_gap: env_f64("DESKPET_PANEL_GAP", d.linked_panel_gap).clamp(0.0, 200.0),
            bubble_default_ms: env_u64("DESKPET_BUBBLE_MS", d.bubble_default_ms).clamp(0, 600_000),
        }
    }

    /// Parse a JSON config document. Missing keys keep their defaults.
    pub fn from_json_str(raw: &str) -> Result<Self, OverlayError> {
        let config: Self = serde_json::from_str(raw)
            .map_err(|e| OverlayError::InvalidConfig(format!("config parse failed: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), OverlayError> {
        let finite_positive = |v: f64| v.is_finite() && v > 0.0;
        if !finite_positive(self.max_move_delta) {
            return Err(OverlayError::InvalidConfig("maxMoveDelta must be > 0".into()));
        }
        if !finite_positive(self.window_width) || !finite_positive(self.window_height) {
            return Err(OverlayError::InvalidConfig("window size must be > 0".into()));
        }
        if !self.linked_panel_gap.is_finite() || self.linked_panel_gap < 0.0 {
            return Err(OverlayError::InvalidConfig("linkedPanelGap must be >= 0".into()));
        }
        Ok(())
    }

    pub fn passthrough_decay(&self) -> Duration {
        Duration::from_millis(self.passthrough_decay_ms)
    }

    pub fn panel_show_delay(&self) -> Duration {
        Duration::from_millis(self.panel_show_delay_ms)
    }

    pub fn panel_hide_delay(&self) -> Duration {
        Duration::from_millis(self.panel_hide_delay_ms)
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_f64(key: &str, default: f64) -> f64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(default)
}
