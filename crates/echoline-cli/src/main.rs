//! echoline CLI - live and offline echo processing.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "echoline")]
#[command(author, version, about = "Real-time capture, echo, and playback", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List audio devices
    Devices(commands::devices::DevicesArgs),

    /// Run live capture → effect → playback until Ctrl+C
    Run(commands::run::RunArgs),

    /// Process a WAV file through the same pipeline
    Process(commands::process::ProcessArgs),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Devices(args) => commands::devices::run(args),
        Commands::Run(args) => commands::run::run(args),
        Commands::Process(args) => commands::process::run(args),
    }
}
