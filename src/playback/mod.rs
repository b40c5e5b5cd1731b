//! Real-time frame replay.
//!
//! - `engine`: `ReplayEngine` state and command surface
//! - `scheduler`: frame-advance step, buffering and speed rescheduling
//! - `clock`: the virtual clock ticking alongside the frames
//! - `event`: events delivered to the single listener

pub mod engine;
pub mod event;
mod clock;
mod scheduler;

pub use engine::ReplayEngine;
pub use event::{EventKind, EventListener, ReplayEvent};

use serde::{Deserialize, Serialize};

/// Slowest playback speed multiplier
pub const MIN_SPEED: u32 = 1;
/// Fastest playback speed multiplier
pub const MAX_SPEED: u32 = 16;
/// Virtual milliseconds added per clock tick
pub const DEFAULT_TIME_TICK_RATE: f64 = 1000.0;

/// Playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Stopped,
    Paused,
    Playing,
    /// Playing, but waiting at the live edge for more frames
    Buffering,
}

/// Whether the frame sequence may still grow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamingMode {
    /// The sequence is complete; reaching its end finishes playback
    #[default]
    Unavailable,
    /// The sequence is still being appended to; reaching its end buffers
    Available,
}

/// Playback configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    pub speed: u32, // 1 = real-time, 2 = 2x speed
    pub time_tick_rate_ms: f64,
    pub streaming_mode: StreamingMode,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            speed: MIN_SPEED,
            time_tick_rate_ms: DEFAULT_TIME_TICK_RATE,
            streaming_mode: StreamingMode::Unavailable,
        }
    }
}

impl PlaybackConfig {
    /// Speed clamped to the supported range and rounded down to a power of two
    pub fn normalized_speed(&self) -> u32 {
        let speed = self.speed.clamp(MIN_SPEED, MAX_SPEED);
        1 << (u32::BITS - 1 - speed.leading_zeros())
    }

    /// Tick rate, falling back to the default for non-positive values
    pub fn normalized_tick_rate(&self) -> f64 {
        if self.time_tick_rate_ms > 0.0 && self.time_tick_rate_ms.is_finite() {
            self.time_tick_rate_ms
        } else {
            DEFAULT_TIME_TICK_RATE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_speed() {
        let mut config = PlaybackConfig::default();
        assert_eq!(config.normalized_speed(), 1);

        config.speed = 0;
        assert_eq!(config.normalized_speed(), 1);
        config.speed = 6;
        assert_eq!(config.normalized_speed(), 4);
        config.speed = 16;
        assert_eq!(config.normalized_speed(), 16);
        config.speed = 100;
        assert_eq!(config.normalized_speed(), 16);
    }

    #[test]
    fn test_normalized_tick_rate() {
        let mut config = PlaybackConfig::default();
        assert_eq!(config.normalized_tick_rate(), 1000.0);
        config.time_tick_rate_ms = 250.0;
        assert_eq!(config.normalized_tick_rate(), 250.0);
        config.time_tick_rate_ms = -5.0;
        assert_eq!(config.normalized_tick_rate(), 1000.0);
    }

    #[test]
    fn test_config_partial_json() {
        let config: PlaybackConfig =
            serde_json::from_str(r#"{"speed": 4, "streaming_mode": "available"}"#).unwrap();
        assert_eq!(config.speed, 4);
        assert_eq!(config.streaming_mode, StreamingMode::Available);
        assert_eq!(config.time_tick_rate_ms, DEFAULT_TIME_TICK_RATE);
    }
}
