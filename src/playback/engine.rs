use crate::core::{Frame, FrameSequence};
use crate::playback::event::{EventListener, ReplayEvent};
use crate::playback::{PlaybackConfig, PlaybackState, StreamingMode, MAX_SPEED, MIN_SPEED};
use crate::timer::{TimerHandle, TimerService, WallClock};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Replays a frame sequence with its original timing
///
/// Owns two one-shot timers: one showing the next frame, one driving the
/// virtual clock. The host schedules them through `TimerService` and hands
/// every expired handle back to `on_timer_fired`.
pub struct ReplayEngine<P> {
    pub(super) frames: FrameSequence<P>,
    pub(super) started: bool,
    pub(super) resumed: bool,
    pub(super) waiting: bool,
    pub(super) speed: u32,
    /// Next frame to show; at the live edge, the last frame shown
    pub(super) last_index: usize,
    /// Wall time the last frame was shown
    pub(super) last_timestamp: f64,
    /// Wall time buffering started, while buffering
    pub(super) buffering_since: Option<f64>,
    /// Live-edge frame already shown before buffering
    pub(super) live_edge_shown: Option<usize>,
    pub(super) frame_timer: Option<TimerHandle>,
    pub(super) time_timer: Option<TimerHandle>,
    pub(super) time_value: f64,
    /// Last value the clock emitted, kept as a floor while playing
    pub(super) last_emitted_time: Option<f64>,
    pub(super) time_next_timestamp: f64,
    pub(super) time_tick_rate: f64,
    pub(super) streaming_mode: StreamingMode,
    pub(super) timers: Box<dyn TimerService>,
    clock: Box<dyn WallClock>,
    listener: Option<EventListener<P>>,
}

impl<P> ReplayEngine<P> {
    pub fn new(
        frames: impl Into<FrameSequence<P>>,
        timers: impl TimerService + 'static,
        clock: impl WallClock + 'static,
    ) -> Self {
        Self::with_config(frames, &PlaybackConfig::default(), timers, clock)
    }

    pub fn with_config(
        frames: impl Into<FrameSequence<P>>,
        config: &PlaybackConfig,
        timers: impl TimerService + 'static,
        clock: impl WallClock + 'static,
    ) -> Self {
        Self {
            frames: frames.into(),
            started: false,
            resumed: false,
            waiting: false,
            speed: config.normalized_speed(),
            last_index: 0,
            last_timestamp: 0.0,
            buffering_since: None,
            live_edge_shown: None,
            frame_timer: None,
            time_timer: None,
            time_value: 0.0,
            last_emitted_time: None,
            time_next_timestamp: 0.0,
            time_tick_rate: config.normalized_tick_rate(),
            streaming_mode: config.streaming_mode,
            timers: Box::new(timers),
            clock: Box::new(clock),
            listener: None,
        }
    }

    /// Register the listener, replacing any previous one
    pub fn set_event_listener<F>(&mut self, listener: F)
    where
        F: FnMut(&ReplayEvent<'_, P>) + Send + 'static,
    {
        self.listener = Some(Box::new(listener));
    }

    pub fn clear_event_listener(&mut self) {
        self.listener = None;
    }

    pub(super) fn emit(&mut self, event: ReplayEvent<'_, P>) {
        if let Some(listener) = self.listener.as_mut() {
            listener(&event);
        }
    }

    pub(super) fn now(&self) -> f64 {
        self.clock.now_ms()
    }

    /// Cancel both pending timers
    pub(super) fn cancel_timers(&mut self) {
        if let Some(handle) = self.frame_timer.take() {
            self.timers.cancel(handle);
        }
        if let Some(handle) = self.time_timer.take() {
            self.timers.cancel(handle);
        }
    }

    /// Start playback from the current position
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        debug!("Starting replay at frame {}", self.last_index);
        self.started = true;
        self.emit(ReplayEvent::Start);
        self.resume();
    }

    /// Stop playback and rewind to the first frame
    pub fn stop(&mut self) {
        if !self.started {
            return;
        }
        self.pause();
        self.started = false;
        self.last_index = 0;
        self.live_edge_shown = None;
        self.last_emitted_time = None;
        debug!("Replay stopped");
        self.emit(ReplayEvent::Stop);
    }

    /// Pause playback, dropping both pending timers.
    ///
    /// Pausing while buffering abandons the buffering episode; resuming
    /// re-checks the live edge.
    pub fn pause(&mut self) {
        if !self.resumed {
            return;
        }
        self.resumed = false;
        self.cancel_timers();
        self.waiting = false;
        self.buffering_since = None;
        debug!("Replay paused at frame {}", self.last_index);
        self.emit(ReplayEvent::Pause);
    }

    /// Resume playback, showing the frame at the current position at once.
    ///
    /// Resuming a stopped engine starts it.
    pub fn resume(&mut self) {
        if self.resumed {
            return;
        }
        if !self.started {
            self.start();
            return;
        }
        self.resumed = true;
        debug!("Replay resumed at frame {}", self.last_index);
        self.emit(ReplayEvent::Resume);
        self.on_tick();
    }

    pub fn toggle_pause(&mut self) {
        if self.resumed {
            self.pause();
        } else {
            self.resume();
        }
    }

    /// Replace the frame sequence.
    ///
    /// New frames end an ongoing buffering wait.
    pub fn set_frames(&mut self, frames: impl Into<FrameSequence<P>>) {
        self.frames = frames.into();
        trace!("Frame sequence replaced ({} frames)", self.frames.len());
        if self.waiting {
            self.on_buffering_completed();
        }
    }

    /// Seek to `index`, rescheduling from there when playing
    pub fn set_position(&mut self, index: usize) {
        self.last_index = index;
        self.live_edge_shown = None;
        self.last_emitted_time = None;

        let frames = Arc::clone(&self.frames);
        match frames.get(index) {
            Some(frame) => {
                self.emit(ReplayEvent::SelectedFrame(frame));
                self.emit(ReplayEvent::TimeTick(frame.time as f64));
            }
            None => warn!(
                "Position {} is outside the {} loaded frames",
                index,
                frames.len()
            ),
        }

        if self.resumed {
            self.pause();
            self.resume();
        }
    }

    /// Step one frame forward
    pub fn next_frame(&mut self) {
        self.last_index = self.last_index.saturating_add(1);
        self.live_edge_shown = None;
        self.on_tick();
    }

    /// Step one frame back, stopping at the first frame
    pub fn prev_frame(&mut self) {
        self.last_index = self.last_index.saturating_sub(1);
        self.live_edge_shown = None;
        self.last_emitted_time = None;
        self.on_tick();
    }

    /// Double the speed, up to `MAX_SPEED`
    pub fn increase_speed(&mut self) {
        self.speed = (self.speed * 2).min(MAX_SPEED);
        self.on_speed_changed();
    }

    /// Halve the speed, down to `MIN_SPEED`
    pub fn decrease_speed(&mut self) {
        self.speed = (self.speed / 2).max(MIN_SPEED);
        self.on_speed_changed();
    }

    fn on_speed_changed(&mut self) {
        debug!("Replay speed set to {}x", self.speed);
        self.reschedule_after_speed_change();
        let speed = self.speed;
        self.emit(ReplayEvent::SpeedChange(speed));
    }

    pub fn set_streaming_mode(&mut self, mode: StreamingMode) {
        self.streaming_mode = mode;
    }

    /// Route an expired timer to its handler.
    ///
    /// Handles that are no longer pending (cancelled, replaced) are ignored.
    pub fn on_timer_fired(&mut self, handle: TimerHandle) {
        if self.frame_timer == Some(handle) {
            self.frame_timer = None;
            self.on_tick();
        } else if self.time_timer == Some(handle) {
            self.time_timer = None;
            self.on_time_tick();
        } else {
            trace!("Ignoring stale {}", handle);
        }
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn is_resumed(&self) -> bool {
        self.resumed
    }

    pub fn is_waiting(&self) -> bool {
        self.waiting
    }

    pub fn speed(&self) -> u32 {
        self.speed
    }

    pub fn frames(&self) -> &FrameSequence<P> {
        &self.frames
    }

    /// Current position (index into the frames)
    pub fn position(&self) -> usize {
        self.last_index
    }

    /// Frame at the current position, if any
    pub fn current_frame(&self) -> Option<&Frame<P>> {
        self.frames.get(self.last_index)
    }

    pub fn streaming_mode(&self) -> StreamingMode {
        self.streaming_mode
    }

    /// Value the virtual clock will report on its next tick
    pub fn time_value(&self) -> f64 {
        self.time_value
    }

    pub fn state(&self) -> PlaybackState {
        match (self.started, self.resumed, self.waiting) {
            (false, _, _) => PlaybackState::Stopped,
            (true, false, _) => PlaybackState::Paused,
            (true, true, true) => PlaybackState::Buffering,
            (true, true, false) => PlaybackState::Playing,
        }
    }
}
