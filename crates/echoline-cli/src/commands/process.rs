//! File-based processing command.
//!
//! Runs the live pipeline with a WAV file standing in for each device.

use super::common::{EffectArgs, describe_effect};
use clap::Args;
use echoline_config::{DEFAULT_FRAME_SIZE, EffectConfig};
use echoline_io::{AudioProcessor, Line, StopReason, WavCaptureLine, WavPlaybackLine};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Args)]
pub struct ProcessArgs {
    /// Input WAV file (mono, 16-bit)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output WAV file
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Samples per frame
    #[arg(long, default_value_t = DEFAULT_FRAME_SIZE)]
    frame_size: usize,

    #[command(flatten)]
    effect: EffectArgs,
}

pub fn run(args: ProcessArgs) -> anyhow::Result<()> {
    if args.frame_size == 0 {
        anyhow::bail!("--frame-size must be greater than 0");
    }
    let effect = args.effect.resolve(&EffectConfig::None)?;

    println!("Reading {}...", args.input.display());
    let input = WavCaptureLine::open(&args.input)?;
    let format = input.format();
    println!(
        "  {} samples, {} Hz, {:.2}s",
        input.len(),
        format.sample_rate,
        f64::from(input.len()) / f64::from(format.sample_rate.max(1))
    );

    let output = WavPlaybackLine::create(&args.output, format)?;
    println!("Effect: {}", describe_effect(&effect));

    let handle = AudioProcessor::new(Box::new(input), Box::new(output), args.frame_size)?
        .with_effect(effect.build())
        .start()?;
    while !handle.wait_timeout(Duration::from_millis(100)) {}
    let frames = handle.frames_processed();
    let reason = handle.join();

    match reason {
        StopReason::StreamEnded(_) => {
            println!(
                "Processed {} frame(s) of {} samples",
                frames, args.frame_size
            );
            println!("Wrote {}", args.output.display());
            Ok(())
        }
        other => anyhow::bail!("processing stopped early: {other}"),
    }
}
