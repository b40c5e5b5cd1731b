pub mod frame;

pub use frame::{format_millis, Frame, FrameSequence};
