use crate::playback::engine::ReplayEngine;
use crate::playback::event::ReplayEvent;
use crate::playback::StreamingMode;
use crate::timer::TimerKind;
use std::sync::Arc;
use tracing::{debug, trace};

impl<P> ReplayEngine<P> {
    /// Show the frame at the current position and, while playing, schedule
    /// the next one after the recorded gap scaled by the speed.
    ///
    /// Runs from the frame timer, from `resume`, from manual stepping and
    /// when buffering completes.
    pub(super) fn on_tick(&mut self) {
        let frames = Arc::clone(&self.frames);
        let index = self.last_index;
        let already_shown = self.live_edge_shown == Some(index);

        // No successor to schedule: this is the end of the known frames
        if index >= frames.len().saturating_sub(1) {
            if index < frames.len() && !already_shown {
                self.emit(ReplayEvent::Tick(&frames[index]));
                self.last_timestamp = self.now();
            }

            match self.streaming_mode {
                StreamingMode::Available if self.resumed => {
                    if index < frames.len() {
                        self.live_edge_shown = Some(index);
                    }
                    self.on_buffering_required();
                }
                // Paused at the live edge: more frames may still come
                StreamingMode::Available => {}
                StreamingMode::Unavailable => {
                    debug!("Replay finished after {} frames", frames.len());
                    self.emit(ReplayEvent::Finished);
                    self.stop();
                }
            }
            return;
        }

        let frame = &frames[index];
        if already_shown {
            trace!("Frame {} already shown at the live edge", index);
        } else {
            self.emit(ReplayEvent::Tick(frame));
            self.last_timestamp = self.now();
        }

        if !self.resumed {
            return;
        }

        let now = self.now();
        let next_delta = frame.gap_to(&frames[index + 1]) as f64;
        let buffering_lost = self.buffering_since.map_or(0.0, |since| now - since);
        let delay = (next_delta - buffering_lost) / self.speed as f64;
        trace!(
            "Frame {} shown; next in {:.1}ms (gap {}ms, buffering {:.1}ms, {}x)",
            index,
            delay,
            next_delta,
            buffering_lost,
            self.speed
        );

        self.cancel_timers();
        self.frame_timer = Some(self.timers.schedule(TimerKind::FrameAdvance, delay));
        self.sync_time_tick(frame.time);

        self.live_edge_shown = None;
        self.last_index += 1;
    }

    /// Enter buffering at the live edge
    pub(super) fn on_buffering_required(&mut self) {
        self.waiting = true;
        self.cancel_timers();
        debug!("Buffering at frame {}", self.last_index);
        self.emit(ReplayEvent::BufferingStart);
        // Keep the start of an episode that is still open
        let now = self.now();
        self.buffering_since.get_or_insert(now);
    }

    /// Leave buffering, resuming the schedule when playing
    pub(super) fn on_buffering_completed(&mut self) {
        self.waiting = false;
        if self.resumed {
            self.on_tick();
        }
        debug!("Buffering completed at frame {}", self.last_index);
        self.emit(ReplayEvent::BufferingCompleted);
        // The advance above may have hit the edge again
        if !self.waiting {
            self.buffering_since = None;
        }
    }

    /// Re-arm both timers for the new speed.
    ///
    /// The frame delay is recomputed from the interval that led to the
    /// current position; the clock only has its remaining wait divided by
    /// the new speed.
    pub(super) fn reschedule_after_speed_change(&mut self) {
        if !self.resumed || self.waiting {
            return;
        }
        self.cancel_timers();

        let Some(interval) = self.previous_interval() else {
            self.on_tick();
            return;
        };

        let speed = self.speed as f64;
        let delay = interval as f64 / speed;
        let now = self.now();
        let elapsed = now - self.last_timestamp;

        if elapsed < delay {
            trace!("Rescheduling frame {} in {:.1}ms", self.last_index, delay - elapsed);
            self.frame_timer = Some(self.timers.schedule(TimerKind::FrameAdvance, delay - elapsed));

            let clock_delay = (self.time_next_timestamp - now) / speed;
            self.time_next_timestamp = now + clock_delay;
            self.time_timer = Some(self.timers.schedule(TimerKind::TimeTick, clock_delay));
        } else {
            self.on_tick();
        }
    }

    /// Recorded gap between the previous frame and the current position
    fn previous_interval(&self) -> Option<i64> {
        let previous = self.frames.get(self.last_index.checked_sub(1)?)?;
        let current = self.frames.get(self.last_index)?;
        Some(previous.gap_to(current))
    }
}
