//! Live processing command.

use super::common::{EffectArgs, describe_effect};
use clap::Args;
use echoline_config::{SessionConfig, default_session_path};
use echoline_io::{
    CpalCatalog, ProcessorState, StopReason, start_processing_with_effect, stop_processing,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// How often the main thread checks for Ctrl+C and loop exit.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Grace period for the loop thread after termination is requested.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Args)]
pub struct RunArgs {
    /// Session file (TOML); defaults to the user config session if present
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Input device name (exact, case-insensitive)
    #[arg(long)]
    input: Option<String>,

    /// Output device name (exact, case-insensitive)
    #[arg(long)]
    output: Option<String>,

    /// Sample rate in Hz
    #[arg(long)]
    sample_rate: Option<u32>,

    /// Samples per frame
    #[arg(long)]
    frame_size: Option<usize>,

    #[command(flatten)]
    effect: EffectArgs,

    /// Stop after this many seconds
    #[arg(long)]
    duration: Option<f64>,

    /// Print input/output levels while running
    #[arg(long)]
    meter: bool,
}

/// Merge the session file and command-line flags; flags win.
fn resolve_session(args: &RunArgs) -> anyhow::Result<SessionConfig> {
    let mut session = match &args.config {
        Some(path) => SessionConfig::load(path)?,
        None => SessionConfig::load_or_default(default_session_path())?,
    };

    if let Some(input) = &args.input {
        session.input_device = Some(input.clone());
    }
    if let Some(output) = &args.output {
        session.output_device = Some(output.clone());
    }
    if let Some(rate) = args.sample_rate {
        session.sample_rate = rate;
    }
    if let Some(frame_size) = args.frame_size {
        session.frame_size = frame_size;
    }
    session.effect = args.effect.resolve(&session.effect)?;
    session.validate()?;
    Ok(session)
}

pub fn run(args: RunArgs) -> anyhow::Result<()> {
    if let Some(secs) = args.duration
        && !(secs.is_finite() && secs > 0.0)
    {
        anyhow::bail!("--duration must be a positive number of seconds");
    }

    let session = resolve_session(&args)?;
    let Some(input) = session.input_device.as_deref() else {
        anyhow::bail!("No input device. Use --input or set input_device in the session file");
    };
    let Some(output) = session.output_device.as_deref() else {
        anyhow::bail!("No output device. Use --output or set output_device in the session file");
    };

    let catalog = CpalCatalog::new();
    let handle = start_processing_with_effect(
        &catalog,
        input,
        output,
        session.sample_rate,
        session.frame_size,
        session.effect.build(),
    )?;

    println!("Real-time processing");
    println!("  Input:  {}", input);
    println!("  Output: {}", output);
    println!("  Sample rate: {} Hz", session.sample_rate);
    println!("  Frame size: {} samples", session.frame_size);
    println!("  Effect: {}", describe_effect(&session.effect));
    println!("\nPress Ctrl+C to stop...\n");

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        println!("\nStopping...");
        r.store(false, Ordering::SeqCst);
    })?;

    let started = Instant::now();
    let deadline = args.duration.map(|secs| started + Duration::from_secs_f64(secs));
    let mut last_meter = started;

    while running.load(Ordering::SeqCst) && handle.state() == ProcessorState::Running {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            break;
        }
        if args.meter && last_meter.elapsed() >= Duration::from_millis(500) {
            last_meter = Instant::now();
            println!(
                "  in {:>7.1} dB   out {:>7.1} dB   frames {}",
                handle.input_signal().level_db(),
                handle.output_signal().level_db(),
                handle.frames_processed()
            );
        }
        std::thread::sleep(POLL_INTERVAL);
    }

    stop_processing(&handle);
    if !handle.wait_timeout(SHUTDOWN_TIMEOUT) {
        tracing::warn!("processing thread did not stop within {:?}", SHUTDOWN_TIMEOUT);
        anyhow::bail!("processing thread did not stop");
    }
    let frames = handle.frames_processed();
    let reason = handle.join();

    println!(
        "Stopped after {:.1}s, {} frame(s): {}",
        started.elapsed().as_secs_f64(),
        frames,
        reason
    );
    match reason {
        StopReason::Terminated => Ok(()),
        other => anyhow::bail!("processing ended unexpectedly: {other}"),
    }
}
