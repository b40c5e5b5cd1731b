pub mod timer_service;
pub mod simulated;
pub mod tokio_timer;

pub use timer_service::{TimerHandle, TimerKind, TimerService, WallClock};
pub use simulated::{PendingTimer, SimulatedTimeline};
pub use tokio_timer::{TokioClock, TokioTimers};
