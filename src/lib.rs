//! Real-time replay of timestamped frame recordings.
//!
//! `playback::ReplayEngine` reproduces the recorded spacing of frames at an
//! adjustable speed, with pause/resume, seeking, single stepping and a
//! virtual clock. It drives two one-shot timers through the host-provided
//! `timer::TimerService` and reads time from a `timer::WallClock`.
//!
//! `runtime::Player` hosts an engine on tokio; `input` loads recordings
//! from CSV or JSON Lines files and can follow a file that is still being
//! written.

pub mod config;
pub mod core;
pub mod error;
pub mod input;
pub mod playback;
pub mod runtime;
pub mod timer;

pub use crate::core::{Frame, FrameSequence};
pub use error::{ReplayError, Result};
pub use playback::{
    EventKind, PlaybackConfig, PlaybackState, ReplayEngine, ReplayEvent, StreamingMode,
};
