use crate::core::FrameSequence;
use crate::error::{ReplayError, Result};
use crate::playback::{PlaybackConfig, PlaybackState, ReplayEngine, ReplayEvent, StreamingMode};
use crate::runtime::source::FrameSource;
use crate::timer::{TimerHandle, TokioClock, TokioTimers};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Duration, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Commands buffered between handles and the player task
const COMMAND_BUFFER: usize = 64;

/// Control message for a running `Player`
pub enum Command<P> {
    Start,
    Stop,
    Pause,
    Resume,
    TogglePause,
    SetFrames(FrameSequence<P>),
    SetPosition(usize),
    NextFrame,
    PrevFrame,
    IncreaseSpeed,
    DecreaseSpeed,
    SetStreamingMode(StreamingMode),
    Status(oneshot::Sender<PlayerStatus>),
    Shutdown,
}

/// Snapshot of the engine inside a running player
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerStatus {
    pub state: PlaybackState,
    pub position: usize,
    pub frame_count: usize,
    pub speed: u32,
    pub streaming_mode: StreamingMode,
}

/// Runs a `ReplayEngine` on a tokio task
///
/// All engine calls happen on that one task: timer expiries, handle
/// commands and source updates are funnelled through `tokio::select!`.
pub struct Player<P> {
    engine: ReplayEngine<P>,
    fired: mpsc::UnboundedReceiver<TimerHandle>,
    commands: mpsc::Receiver<Command<P>>,
    source: Option<Box<dyn FrameSource<P>>>,
    poll_interval: Duration,
}

/// Cloneable sender of commands to a `Player`
pub struct PlayerHandle<P> {
    tx: mpsc::Sender<Command<P>>,
}

impl<P> Clone for PlayerHandle<P> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<P: Send + Sync + 'static> Player<P> {
    /// Create a player and its handle. Must be called inside a tokio runtime.
    pub fn new(frames: impl Into<FrameSequence<P>>, config: &PlaybackConfig) -> (Self, PlayerHandle<P>) {
        let (timers, fired) = TokioTimers::new();
        let engine = ReplayEngine::with_config(frames, config, timers, TokioClock::new());
        let (tx, commands) = mpsc::channel(COMMAND_BUFFER);

        let player = Self {
            engine,
            fired,
            commands,
            source: None,
            poll_interval: Duration::from_millis(500),
        };
        (player, PlayerHandle { tx })
    }

    /// Register the engine's event listener
    pub fn set_event_listener<F>(&mut self, listener: F)
    where
        F: FnMut(&ReplayEvent<'_, P>) + Send + 'static,
    {
        self.engine.set_event_listener(listener);
    }

    /// Poll `source` for new frames every `poll_interval`
    pub fn with_source(
        mut self,
        source: impl FrameSource<P> + 'static,
        poll_interval: Duration,
    ) -> Self {
        self.source = Some(Box::new(source));
        self.poll_interval = poll_interval.max(Duration::from_millis(1));
        self
    }

    pub fn engine(&self) -> &ReplayEngine<P> {
        &self.engine
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Process timers, commands and source updates until shut down
    pub async fn run(mut self) {
        let mut poll = tokio::time::interval(self.poll_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!("Player running with {} frames", self.engine.frames().len());

        loop {
            tokio::select! {
                Some(handle) = self.fired.recv() => self.engine.on_timer_fired(handle),
                command = self.commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.apply(command),
                },
                _ = poll.tick(), if self.source.is_some() => self.poll_source().await,
            }
        }

        self.engine.stop();
        info!("Player shut down");
    }

    fn apply(&mut self, command: Command<P>) {
        match command {
            Command::Start => self.engine.start(),
            Command::Stop => self.engine.stop(),
            Command::Pause => self.engine.pause(),
            Command::Resume => self.engine.resume(),
            Command::TogglePause => self.engine.toggle_pause(),
            Command::SetFrames(frames) => self.engine.set_frames(frames),
            Command::SetPosition(index) => self.engine.set_position(index),
            Command::NextFrame => self.engine.next_frame(),
            Command::PrevFrame => self.engine.prev_frame(),
            Command::IncreaseSpeed => self.engine.increase_speed(),
            Command::DecreaseSpeed => self.engine.decrease_speed(),
            Command::SetStreamingMode(mode) => self.engine.set_streaming_mode(mode),
            Command::Status(reply) => {
                // Requester may have given up waiting
                let _ = reply.send(self.status());
            }
            Command::Shutdown => {}
        }
    }

    fn status(&self) -> PlayerStatus {
        PlayerStatus {
            state: self.engine.state(),
            position: self.engine.position(),
            frame_count: self.engine.frames().len(),
            speed: self.engine.speed(),
            streaming_mode: self.engine.streaming_mode(),
        }
    }

    async fn poll_source(&mut self) {
        let Some(source) = self.source.as_mut() else {
            return;
        };
        match source.poll_frames().await {
            Ok(Some(frames)) => {
                debug!("{} supplied {} frames", source.name(), frames.len());
                self.engine.set_frames(frames);
            }
            Ok(None) => {}
            Err(e) => warn!("Frame source {} failed: {}", source.name(), e),
        }
    }
}

impl<P> PlayerHandle<P> {
    pub async fn send(&self, command: Command<P>) -> Result<()> {
        self.tx
            .send(command)
            .await
            .map_err(|_| ReplayError::PlayerClosed)
    }

    pub async fn start(&self) -> Result<()> {
        self.send(Command::Start).await
    }

    pub async fn stop(&self) -> Result<()> {
        self.send(Command::Stop).await
    }

    pub async fn pause(&self) -> Result<()> {
        self.send(Command::Pause).await
    }

    pub async fn resume(&self) -> Result<()> {
        self.send(Command::Resume).await
    }

    pub async fn toggle_pause(&self) -> Result<()> {
        self.send(Command::TogglePause).await
    }

    pub async fn set_frames(&self, frames: impl Into<FrameSequence<P>>) -> Result<()> {
        self.send(Command::SetFrames(frames.into())).await
    }

    pub async fn seek(&self, index: usize) -> Result<()> {
        self.send(Command::SetPosition(index)).await
    }

    pub async fn step_forward(&self) -> Result<()> {
        self.send(Command::NextFrame).await
    }

    pub async fn step_back(&self) -> Result<()> {
        self.send(Command::PrevFrame).await
    }

    pub async fn speed_up(&self) -> Result<()> {
        self.send(Command::IncreaseSpeed).await
    }

    pub async fn slow_down(&self) -> Result<()> {
        self.send(Command::DecreaseSpeed).await
    }

    pub async fn set_streaming_mode(&self, mode: StreamingMode) -> Result<()> {
        self.send(Command::SetStreamingMode(mode)).await
    }

    pub async fn status(&self) -> Result<PlayerStatus> {
        let (reply, response) = oneshot::channel();
        self.send(Command::Status(reply)).await?;
        response.await.map_err(|_| ReplayError::PlayerClosed)
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.send(Command::Shutdown).await
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Frame;
    use crate::playback::EventKind;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};
    use tokio::time::Instant;

    type Kinds = Arc<Mutex<Vec<(EventKind, Option<i64>)>>>;

    fn frames(times: &[i64]) -> Vec<Frame<u32>> {
        times.iter().map(|&t| Frame::new(t, 0)).collect()
    }

    fn recording_player(
        times: &[i64],
        config: &PlaybackConfig,
    ) -> (Player<u32>, PlayerHandle<u32>, Kinds, mpsc::UnboundedReceiver<EventKind>) {
        let (mut player, handle) = Player::new(frames(times), config);
        let kinds: Kinds = Arc::new(Mutex::new(Vec::new()));
        let (notify_tx, notify_rx) = mpsc::unbounded_channel();
        let sink = Arc::clone(&kinds);
        player.set_event_listener(move |event| {
            sink.lock()
                .unwrap()
                .push((event.kind(), event.frame().map(|f| f.time)));
            let _ = notify_tx.send(event.kind());
        });
        (player, handle, kinds, notify_rx)
    }

    async fn wait_for(notify: &mut mpsc::UnboundedReceiver<EventKind>, kind: EventKind) {
        tokio::time::timeout(Duration::from_secs(60), async {
            while let Some(seen) = notify.recv().await {
                if seen == kind {
                    return;
                }
            }
        })
        .await
        .expect("event not seen in time");
    }

    fn tick_times(kinds: &Kinds) -> Vec<i64> {
        kinds
            .lock()
            .unwrap()
            .iter()
            .filter(|(kind, _)| *kind == EventKind::Tick)
            .filter_map(|(_, time)| *time)
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_plays_to_finish_in_real_time() {
        let (player, handle, kinds, mut notify) =
            recording_player(&[0, 100, 300], &PlaybackConfig::default());
        let task = player.spawn();

        let started = Instant::now();
        handle.start().await.unwrap();
        wait_for(&mut notify, EventKind::Stop).await;
        let elapsed = started.elapsed();

        assert_eq!(tick_times(&kinds), vec![0, 100, 300]);
        assert!(
            elapsed >= Duration::from_millis(300) && elapsed < Duration::from_millis(320),
            "elapsed = {:?}",
            elapsed
        );

        handle.shutdown().await.unwrap();
        task.await.unwrap();
        assert!(handle.is_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_and_pause() {
        let (player, handle, _kinds, _notify) =
            recording_player(&[0, 1000, 2000], &PlaybackConfig::default());
        let task = player.spawn();

        handle.start().await.unwrap();
        let status = handle.status().await.unwrap();
        assert_eq!(status.state, PlaybackState::Playing);
        assert_eq!(status.position, 1);
        assert_eq!(status.frame_count, 3);

        handle.pause().await.unwrap();
        handle.speed_up().await.unwrap();
        let status = handle.status().await.unwrap();
        assert_eq!(status.state, PlaybackState::Paused);
        assert_eq!(status.speed, 2);

        handle.shutdown().await.unwrap();
        task.await.unwrap();
        assert!(matches!(handle.start().await, Err(ReplayError::PlayerClosed)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_handles_stops_player() {
        let (player, handle, kinds, _notify) =
            recording_player(&[0, 5000], &PlaybackConfig::default());
        let task = player.spawn();
        handle.start().await.unwrap();
        drop(handle);
        task.await.unwrap();

        let seen: Vec<EventKind> = kinds.lock().unwrap().iter().map(|(k, _)| *k).collect();
        assert_eq!(seen.last(), Some(&EventKind::Stop));
    }

    /// Source releasing one more frame after a few polls
    struct DelayedSource {
        polls: usize,
        release_on: usize,
        frames: Vec<Frame<u32>>,
    }

    #[async_trait]
    impl FrameSource<u32> for DelayedSource {
        fn name(&self) -> &str {
            "delayed"
        }

        async fn poll_frames(&mut self) -> Result<Option<Vec<Frame<u32>>>> {
            self.polls += 1;
            if self.polls == self.release_on {
                Ok(Some(self.frames.clone()))
            } else {
                Ok(None)
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_source_ends_buffering() {
        let config = PlaybackConfig {
            streaming_mode: StreamingMode::Available,
            ..PlaybackConfig::default()
        };
        let (player, handle, kinds, mut notify) = recording_player(&[0, 100], &config);
        let source = DelayedSource {
            polls: 0,
            release_on: 5,
            frames: frames(&[0, 100, 200]),
        };
        let task = player
            .with_source(source, Duration::from_millis(50))
            .spawn();

        handle.start().await.unwrap();
        wait_for(&mut notify, EventKind::BufferingCompleted).await;
        wait_for(&mut notify, EventKind::BufferingStart).await;

        assert_eq!(tick_times(&kinds), vec![0, 100, 200]);
        let status = handle.status().await.unwrap();
        assert_eq!(status.state, PlaybackState::Buffering);
        assert_eq!(status.frame_count, 3);

        handle.shutdown().await.unwrap();
        task.await.unwrap();
    }
}
