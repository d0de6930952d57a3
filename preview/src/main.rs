//! Terminal preview for stair animations
//!
//! Loads an animation config, drives it against an in-memory sink and prints
//! one bar per channel at a fixed frame interval.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use embassy_time::{Duration, Instant};
use stairled_composer::{
    AnimationConfig, Channel, Clock, Easing, IntervalTicks, MAX_BRIGHTNESS, ManualClock,
    ManualTicks, MemorySink, SinkHandle, StairAnimation, SystemClock, TickOutcome, TickSource,
};
use tracing_subscriber::EnvFilter;

/// Width of a full-brightness bar in characters
const BAR_WIDTH: usize = 40;

#[derive(Parser, Debug)]
#[command(author, version, about = "Preview stair animations in the terminal", long_about = None)]
struct Cli {
    /// Animation config (JSON)
    config: PathBuf,

    /// Number of stair channels, numbered from 0
    #[arg(short, long, default_value_t = 18)]
    channels: u16,

    /// Override the configured easing curve
    #[arg(short, long)]
    easing: Option<Easing>,

    /// Loop the animation
    #[arg(short = 'l', long = "loop")]
    looping: bool,

    /// Pause between ticks in milliseconds
    #[arg(long, default_value_t = 2)]
    tick_ms: u64,

    /// Print a frame every N milliseconds
    #[arg(long, default_value_t = 100)]
    frame_ms: u64,

    /// Stop after this many milliseconds (required to end a looping preview)
    #[arg(long)]
    run_for_ms: Option<u64>,

    /// Simulate time instead of waiting for the wall clock
    #[arg(long)]
    simulate: bool,
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let json = std::fs::read_to_string(&cli.config)?;
    let mut config = AnimationConfig::from_json(&json)?;
    if let Some(easing) = cli.easing {
        config.easing = Some(easing.as_str().into());
    }
    config.looping |= cli.looping;
    if config.looping && cli.run_for_ms.is_none() {
        tracing::warn!("looping without --run-for-ms; interrupt to stop");
    }

    let sink = SinkHandle::new(MemorySink::with_channels(0..cli.channels));
    let channels: Vec<Channel> = (0..cli.channels).collect();

    if cli.simulate {
        let clock = ManualClock::from_millis(0);
        let animation = StairAnimation::from_config(
            config,
            sink.clone(),
            clock.clone(),
            ManualTicks::new(),
        )?;
        simulate(animation, &clock, &sink, &channels, cli);
    } else {
        let ticks = IntervalTicks::new(Duration::from_millis(cli.tick_ms));
        let animation = StairAnimation::from_config(config, sink.clone(), SystemClock, ticks)?;
        play(animation, sink, channels, cli);
    }
    Ok(())
}

/// Step a manual clock frame by frame and print every frame.
fn simulate(
    mut animation: StairAnimation<ManualClock, ManualTicks>,
    clock: &ManualClock,
    sink: &SinkHandle,
    channels: &[Channel],
    cli: &Cli,
) {
    let step = Duration::from_millis(cli.tick_ms.max(1));
    let frame_every = Duration::from_millis(cli.frame_ms.max(1));
    let limit = cli.run_for_ms.map(Duration::from_millis);
    let origin = clock.now();
    let mut next_frame = origin;

    animation.start();
    loop {
        let now = clock.now();
        if now >= next_frame {
            print_frame(now.duration_since(origin), sink, channels);
            next_frame += frame_every;
        }
        if limit.is_some_and(|limit| now.duration_since(origin) >= limit) {
            animation.stop();
            break;
        }
        if !animation.runner().ticks().is_pending() {
            break;
        }
        clock.advance(step);
        if animation.runner_mut().tick() == TickOutcome::Finished {
            print_frame(clock.now().duration_since(origin), sink, channels);
            break;
        }
    }
}

/// Run on the wall clock, printing frames from a hook.
fn play(
    mut animation: StairAnimation<SystemClock, IntervalTicks>,
    sink: SinkHandle,
    channels: Vec<Channel>,
    cli: &Cli,
) {
    let frame_every = Duration::from_millis(cli.frame_ms.max(1));
    let origin = Instant::now();
    let mut next_frame = origin;
    animation.runner_mut().add_hook(move |_, status| {
        let Some(now) = status.current_time else {
            return;
        };
        if now >= next_frame {
            print_frame(now.saturating_duration_since(origin), &sink, &channels);
            next_frame = now + frame_every;
        }
    });

    if let Some(limit) = cli.run_for_ms {
        let handle = animation.runner().handle();
        std::thread::spawn(move || {
            std::thread::sleep(std::time::Duration::from_millis(limit));
            if handle.stop().is_err() {
                tracing::warn!("control queue full, stop dropped");
            }
        });
    }

    tracing::info!(name = animation.name(), "playing");
    animation.start();
    animation.runner_mut().run();
    tracing::info!(cycles = animation.runner().cycles(), "done");
}

#[allow(clippy::print_stdout)]
fn print_frame(elapsed: Duration, sink: &SinkHandle, channels: &[Channel]) {
    let levels = sink.snapshot(channels);
    println!("t={:>6}ms", elapsed.as_millis());
    for (channel, level) in channels.iter().zip(levels) {
        let width = usize::from(level) * BAR_WIDTH / usize::from(MAX_BRIGHTNESS);
        println!("  {channel:>3} {level:>4} |{:<BAR_WIDTH$}|", "#".repeat(width));
    }
}
