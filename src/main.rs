use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use replay_engine::config::Settings;
use replay_engine::core::format_millis;
use replay_engine::input::{self, FileFollower, Record};
use replay_engine::runtime::{parse_control, Control, Player, PlayerHandle};
use replay_engine::timer::SimulatedTimeline;
use replay_engine::{ReplayEngine, ReplayEvent, StreamingMode};
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Upper bound on timers fired in a dry run
const DRY_RUN_MAX_FIRES: usize = 10_000_000;

/// Replay a timestamped recording with its original timing
#[derive(Parser, Debug)]
#[command(name = "replay", version, about)]
struct Cli {
    /// Recording to play (CSV or JSON Lines)
    file: PathBuf,

    /// Playback speed multiplier (1-16, rounded down to a power of two)
    #[arg(short, long)]
    speed: Option<u32>,

    /// Keep re-reading the file and wait for new frames at its end
    #[arg(short, long)]
    follow: bool,

    /// How often a followed file is re-read, in milliseconds
    #[arg(long = "poll-ms", value_name = "MS")]
    poll_ms: Option<u64>,

    /// Virtual milliseconds per clock tick
    #[arg(long = "tick-rate", value_name = "MS")]
    tick_rate: Option<f64>,

    /// Settings file to use instead of the user's config directory
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Play instantly on a simulated clock and print virtual timestamps
    #[arg(long)]
    dry_run: bool,

    /// Log engine decisions to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = load_settings(&cli)?;
    let frames = input::load_file(&cli.file)
        .with_context(|| format!("Failed to load {}", cli.file.display()))?;
    info!("Loaded {} frames from {}", frames.len(), cli.file.display());

    if cli.dry_run {
        dry_run(frames, &settings);
        return Ok(());
    }
    play(&cli, frames, &settings).await
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "replay_engine=debug,replay=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Stored settings with command-line overrides applied
fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = match &cli.config {
        Some(path) => Settings::load_from(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?,
        None => Settings::load(),
    };

    if let Some(speed) = cli.speed {
        settings.playback.speed = speed;
    }
    if let Some(rate) = cli.tick_rate {
        settings.playback.time_tick_rate_ms = rate;
    }
    if let Some(poll) = cli.poll_ms {
        settings.follow_poll_ms = poll;
    }
    if cli.follow {
        settings.playback.streaming_mode = StreamingMode::Available;
    }
    Ok(settings)
}

fn describe(event: &ReplayEvent<'_, Record>) -> String {
    match event {
        ReplayEvent::Tick(frame) | ReplayEvent::SelectedFrame(frame) => {
            let payload = serde_json::to_string(&frame.payload).unwrap_or_default();
            format!("{} {} {}", event.kind(), frame.time_label(), payload)
        }
        ReplayEvent::TimeTick(value) => format!("{} {}", event.kind(), format_millis(*value as i64)),
        ReplayEvent::SpeedChange(speed) => format!("{} {}x", event.kind(), speed),
        _ => event.kind().to_string(),
    }
}

/// Play the whole recording on a simulated timeline
fn dry_run(frames: Vec<replay_engine::Frame<Record>>, settings: &Settings) {
    let timeline = SimulatedTimeline::new();
    let mut config = settings.playback.clone();
    // A finite recording; nothing would ever end the buffering
    config.streaming_mode = StreamingMode::Unavailable;

    let mut engine = ReplayEngine::with_config(frames, &config, timeline.clone(), timeline.clone());
    let clock = timeline.clone();
    engine.set_event_listener(move |event| {
        println!("[{}] {}", format_millis(clock.now() as i64), describe(event));
    });

    engine.start();
    let fired = timeline.run_to_idle(&mut engine, DRY_RUN_MAX_FIRES);
    if fired == DRY_RUN_MAX_FIRES {
        warn!("Dry run stopped after {} timers", fired);
    }
}

async fn play(cli: &Cli, frames: Vec<replay_engine::Frame<Record>>, settings: &Settings) -> Result<()> {
    let known = frames.len();
    let (mut player, handle) = Player::new(frames, &settings.playback);

    let (done_tx, mut done_rx) = mpsc::unbounded_channel();
    player.set_event_listener(move |event| {
        println!("[{}] {}", Local::now().format("%H:%M:%S%.3f"), describe(event));
        if let ReplayEvent::Finished = event {
            let _ = done_tx.send(());
        }
    });

    if cli.follow {
        let follower = FileFollower::new(&cli.file, known);
        player = player.with_source(follower, settings.follow_poll_interval());
    }

    let task = player.spawn();
    handle.start().await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    loop {
        tokio::select! {
            _ = done_rx.recv() => break,
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
            line = lines.next_line(), if stdin_open => match line? {
                Some(line) => {
                    if !handle_line(&handle, &line).await? {
                        break;
                    }
                }
                None => stdin_open = false,
            },
        }
    }

    handle.shutdown().await.ok();
    task.await.context("Player task failed")?;
    Ok(())
}

/// Apply one stdin line; returns false when the user quits
async fn handle_line(handle: &PlayerHandle<Record>, line: &str) -> Result<bool> {
    match parse_control(line) {
        Some(Control::Command(command)) => handle.send(command).await?,
        Some(Control::Status) => {
            let status = handle.status().await?;
            eprintln!(
                "{:?} at frame {}/{} ({}x, {:?})",
                status.state, status.position, status.frame_count, status.speed, status.streaming_mode
            );
        }
        Some(Control::Quit) => return Ok(false),
        None if line.trim().is_empty() => {}
        None => eprintln!("Unknown command: {}", line.trim()),
    }
    Ok(true)
}
