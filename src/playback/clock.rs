use crate::playback::engine::ReplayEngine;
use crate::playback::event::ReplayEvent;
use crate::timer::TimerKind;
use tracing::trace;

impl<P> ReplayEngine<P> {
    /// Re-align the virtual clock with a frame that was just shown.
    ///
    /// A clock tick still in the future keeps its phase and the value is
    /// interpolated from the frame time; an overdue one ticks right away
    /// from the frame time.
    pub(super) fn sync_time_tick(&mut self, frame_time: i64) {
        let remaining = self.time_next_timestamp - self.now();
        if remaining > 0.0 {
            self.time_value = frame_time as f64 + (self.time_tick_rate - remaining);
            self.schedule_time_tick(remaining);
        } else {
            self.time_value = frame_time as f64;
            self.on_time_tick();
        }
    }

    /// Emit the clock value and schedule the next tick.
    ///
    /// A frame shown just before a tick interpolates past the next frame's
    /// value, so the emitted value is floored at the last one until a seek,
    /// a step back or a stop.
    pub(super) fn on_time_tick(&mut self) {
        let value = match self.last_emitted_time {
            Some(floor) => self.time_value.max(floor),
            None => self.time_value,
        };
        self.emit(ReplayEvent::TimeTick(value));
        self.last_emitted_time = Some(value);
        self.time_value = value + self.time_tick_rate;

        let delay = self.time_tick_rate / self.speed as f64;
        self.time_next_timestamp = self.now() + delay;
        trace!("Clock at {}ms, next tick in {:.1}ms", value, delay);
        self.schedule_time_tick(delay);
    }

    fn schedule_time_tick(&mut self, delay: f64) {
        if let Some(handle) = self.time_timer.take() {
            self.timers.cancel(handle);
        }
        self.time_timer = Some(self.timers.schedule(TimerKind::TimeTick, delay));
    }
}
