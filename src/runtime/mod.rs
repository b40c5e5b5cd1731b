//! Tokio host for a `ReplayEngine`.

pub mod control;
pub mod player;
pub mod source;

pub use control::{parse_control, Control};
pub use player::{Command, Player, PlayerHandle, PlayerStatus};
pub use source::FrameSource;
