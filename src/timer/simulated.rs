use crate::playback::ReplayEngine;
use crate::timer::timer_service::{TimerHandle, TimerKind, TimerService, WallClock};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A timer waiting on the simulated timeline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingTimer {
    pub handle: TimerHandle,
    pub kind: TimerKind,
    /// Simulated time at which the timer fires
    pub due_ms: f64,
}

#[derive(Debug, Default)]
struct TimelineState {
    now_ms: f64,
    next_id: u64,
    pending: Vec<PendingTimer>,
}

/// Deterministic timer service and clock sharing one simulated timeline
///
/// Time only moves when the owner pops the next timer or advances it
/// explicitly, so replay timing can be checked exactly. Clones share state:
/// hand one clone to the engine as its `TimerService`, another as its
/// `WallClock`, and keep a third to drive the simulation.
#[derive(Debug, Clone, Default)]
pub struct SimulatedTimeline {
    state: Arc<Mutex<TimelineState>>,
}

impl SimulatedTimeline {
    /// Create a timeline starting at time zero
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, TimelineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current simulated time
    pub fn now(&self) -> f64 {
        self.state().now_ms
    }

    /// Move time forward without firing anything
    pub fn advance_by(&self, ms: f64) {
        let mut state = self.state();
        state.now_ms += ms.max(0.0);
    }

    /// All pending timers, in firing order
    pub fn pending(&self) -> Vec<PendingTimer> {
        let mut pending = self.state().pending.clone();
        pending.sort_by(|a, b| a.due_ms.total_cmp(&b.due_ms).then(a.handle.cmp(&b.handle)));
        pending
    }

    /// Number of pending timers of the given kind
    pub fn pending_count(&self, kind: TimerKind) -> usize {
        self.state().pending.iter().filter(|t| t.kind == kind).count()
    }

    /// Remove the earliest timer and move time to its due point.
    ///
    /// Timers due at the same instant fire in scheduling order.
    pub fn pop_next(&self) -> Option<PendingTimer> {
        let mut state = self.state();
        let idx = state
            .pending
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| a.due_ms.total_cmp(&b.due_ms).then(a.handle.cmp(&b.handle)))
            .map(|(idx, _)| idx)?;
        let timer = state.pending.remove(idx);
        if timer.due_ms > state.now_ms {
            state.now_ms = timer.due_ms;
        }
        Some(timer)
    }

    /// Fire the earliest pending timer into the engine.
    ///
    /// Returns false once nothing is pending.
    pub fn fire_next<P>(&self, engine: &mut ReplayEngine<P>) -> bool {
        match self.pop_next() {
            Some(timer) => {
                engine.on_timer_fired(timer.handle);
                true
            }
            None => false,
        }
    }

    /// Fire timers in order until none is due at or before `deadline_ms`.
    ///
    /// Time ends at `deadline_ms` (or later, if it was already past it).
    pub fn run_until<P>(&self, engine: &mut ReplayEngine<P>, deadline_ms: f64) {
        while self
            .pending()
            .first()
            .is_some_and(|timer| timer.due_ms <= deadline_ms)
        {
            self.fire_next(engine);
        }
        let mut state = self.state();
        if state.now_ms < deadline_ms {
            state.now_ms = deadline_ms;
        }
    }

    /// Fire timers until nothing is pending or `max_fires` is reached.
    ///
    /// Returns the number of timers fired.
    pub fn run_to_idle<P>(&self, engine: &mut ReplayEngine<P>, max_fires: usize) -> usize {
        let mut fired = 0;
        while fired < max_fires && self.fire_next(engine) {
            fired += 1;
        }
        fired
    }
}

impl TimerService for SimulatedTimeline {
    fn schedule(&mut self, kind: TimerKind, delay_ms: f64) -> TimerHandle {
        let mut state = self.state();
        state.next_id += 1;
        let handle = TimerHandle(state.next_id);
        // NaN and negative delays fire immediately
        let delay = if delay_ms > 0.0 { delay_ms } else { 0.0 };
        let due_ms = state.now_ms + delay;
        state.pending.push(PendingTimer { handle, kind, due_ms });
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        self.state().pending.retain(|t| t.handle != handle);
    }
}

impl WallClock for SimulatedTimeline {
    fn now_ms(&self) -> f64 {
        self.now()
    }
}
