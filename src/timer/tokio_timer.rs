use crate::timer::timer_service::{TimerHandle, TimerKind, TimerService, WallClock};
use std::collections::HashMap;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant};
use tracing::trace;

/// Timer service backed by tokio sleep tasks
///
/// Each scheduled timer is a spawned task that sleeps and then posts its
/// handle on the fired channel. Must be used from within a tokio runtime.
pub struct TokioTimers {
    fired_tx: mpsc::UnboundedSender<TimerHandle>,
    tasks: HashMap<TimerHandle, JoinHandle<()>>,
    next_id: u64,
}

impl TokioTimers {
    /// Create a timer service and the receiver its fired handles arrive on
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TimerHandle>) {
        let (fired_tx, fired_rx) = mpsc::unbounded_channel();
        let timers = Self {
            fired_tx,
            tasks: HashMap::new(),
            next_id: 0,
        };
        (timers, fired_rx)
    }

    /// Number of timers that have not fired or been cancelled yet
    pub fn active_count(&self) -> usize {
        self.tasks.values().filter(|task| !task.is_finished()).count()
    }

    fn prune_finished(&mut self) {
        self.tasks.retain(|_, task| !task.is_finished());
    }
}

/// Convert a millisecond delay into a sleep duration, treating NaN and
/// non-positive values as zero
pub fn delay_duration(delay_ms: f64) -> Duration {
    if delay_ms > 0.0 && delay_ms.is_finite() {
        Duration::from_secs_f64(delay_ms / 1000.0)
    } else {
        Duration::ZERO
    }
}

impl TimerService for TokioTimers {
    fn schedule(&mut self, kind: TimerKind, delay_ms: f64) -> TimerHandle {
        self.prune_finished();
        self.next_id += 1;
        let handle = TimerHandle(self.next_id);
        let delay = delay_duration(delay_ms);
        trace!("Scheduling {:?} {} in {:?}", kind, handle, delay);

        let fired_tx = self.fired_tx.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Receiver gone means the player has shut down
            let _ = fired_tx.send(handle);
        });
        self.tasks.insert(handle, task);
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        if let Some(task) = self.tasks.remove(&handle) {
            task.abort();
        }
    }
}

impl Drop for TokioTimers {
    fn drop(&mut self) {
        for (_, task) in self.tasks.drain() {
            task.abort();
        }
    }
}

/// Wall clock over tokio's monotonic instant
///
/// Follows paused/advanced time in tokio tests.
#[derive(Debug, Clone, Copy)]
pub struct TokioClock {
    origin: Instant,
}

impl TokioClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

impl WallClock for TokioClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}
