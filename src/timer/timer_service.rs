use std::fmt;

/// Which of the engine's two timers a handle belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Shows the next frame
    FrameAdvance,
    /// Emits the next virtual clock tick
    TimeTick,
}

/// Opaque identifier of a scheduled one-shot timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(pub u64);

impl fmt::Display for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

/// Cancellable one-shot timer scheduler supplied by the host
///
/// When a timer expires the host hands its handle back to
/// `ReplayEngine::on_timer_fired`. Implementations:
/// - `TokioTimers` for real-time playback
/// - `SimulatedTimeline` for tests and dry runs
pub trait TimerService: Send {
    /// Schedule a timer firing after `delay_ms` milliseconds.
    ///
    /// A non-positive delay means "fire as soon as possible".
    fn schedule(&mut self, kind: TimerKind, delay_ms: f64) -> TimerHandle;

    /// Cancel a pending timer. Unknown or already fired handles are ignored.
    fn cancel(&mut self, handle: TimerHandle);
}

/// Wall-clock reader supplied by the host
pub trait WallClock: Send {
    /// Milliseconds elapsed since an arbitrary fixed origin
    fn now_ms(&self) -> f64;
}
