use crate::core::Frame;
use std::fmt;

/// Event delivered to the engine's listener
#[derive(Debug, PartialEq)]
pub enum ReplayEvent<'a, P> {
    Start,
    Resume,
    Pause,
    Stop,
    /// A frame is now showing
    Tick(&'a Frame<P>),
    /// Virtual clock value in milliseconds
    TimeTick(f64),
    /// A frame was selected by seeking
    SelectedFrame(&'a Frame<P>),
    /// The speed multiplier changed (new value)
    SpeedChange(u32),
    Finished,
    BufferingStart,
    BufferingCompleted,
}

/// Payload-free discriminant of a `ReplayEvent`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Start,
    Resume,
    Pause,
    Stop,
    Tick,
    TimeTick,
    SelectedFrame,
    SpeedChange,
    Finished,
    BufferingStart,
    BufferingCompleted,
}

/// The single event listener an engine delivers to
pub type EventListener<P> = Box<dyn FnMut(&ReplayEvent<'_, P>) + Send>;

impl<P> ReplayEvent<'_, P> {
    pub fn kind(&self) -> EventKind {
        match self {
            ReplayEvent::Start => EventKind::Start,
            ReplayEvent::Resume => EventKind::Resume,
            ReplayEvent::Pause => EventKind::Pause,
            ReplayEvent::Stop => EventKind::Stop,
            ReplayEvent::Tick(_) => EventKind::Tick,
            ReplayEvent::TimeTick(_) => EventKind::TimeTick,
            ReplayEvent::SelectedFrame(_) => EventKind::SelectedFrame,
            ReplayEvent::SpeedChange(_) => EventKind::SpeedChange,
            ReplayEvent::Finished => EventKind::Finished,
            ReplayEvent::BufferingStart => EventKind::BufferingStart,
            ReplayEvent::BufferingCompleted => EventKind::BufferingCompleted,
        }
    }

    /// Frame carried by `Tick` and `SelectedFrame`
    pub fn frame(&self) -> Option<&Frame<P>> {
        match self {
            ReplayEvent::Tick(frame) | ReplayEvent::SelectedFrame(frame) => Some(frame),
            _ => None,
        }
    }

    /// Virtual time carried by `TimeTick`
    pub fn virtual_time(&self) -> Option<f64> {
        match self {
            ReplayEvent::TimeTick(ms) => Some(*ms),
            _ => None,
        }
    }
}

impl EventKind {
    /// Stable wire name of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Start => "REPLAY_START",
            EventKind::Resume => "REPLAY_RESUME",
            EventKind::Pause => "REPLAY_PAUSE",
            EventKind::Stop => "REPLAY_STOP",
            EventKind::Tick => "TICK_EVENT",
            EventKind::TimeTick => "TIME_TICK_EVENT",
            EventKind::SelectedFrame => "SELECTED_FRAME_EVENT",
            EventKind::SpeedChange => "SPEED_CHANGE_EVENT",
            EventKind::Finished => "REPLAY_FINISHED",
            EventKind::BufferingStart => "REPLAY_BUFFERING",
            EventKind::BufferingCompleted => "REPLAY_BUFFERING_COMPLETED",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
