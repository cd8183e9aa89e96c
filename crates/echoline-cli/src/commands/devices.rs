//! Audio device listing command.

use clap::{Args, Subcommand};
use echoline_io::{CpalCatalog, DeviceCatalog, DeviceInfo, find_device, list_devices};

#[derive(Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    command: Option<DevicesCommand>,
}

#[derive(Subcommand)]
enum DevicesCommand {
    /// List all available audio devices
    List,

    /// Show one device, matched by exact name (case-insensitive)
    Show {
        /// Device name
        name: String,
    },
}

pub fn run(args: DevicesArgs) -> anyhow::Result<()> {
    let catalog = CpalCatalog::new();

    match args.command.unwrap_or(DevicesCommand::List) {
        DevicesCommand::List => {
            let devices = list_devices(&catalog)?;

            if devices.is_empty() {
                println!("No audio devices found.");
                return Ok(());
            }

            let title = format!("Available Audio Devices ({})", catalog.backend_name());
            println!("{title}");
            println!("{}\n", "=".repeat(title.len()));

            for (idx, device) in devices.iter().enumerate() {
                println!(
                    "  [{}] {} [{}] ({} Hz)",
                    idx,
                    device.name,
                    direction_label(device),
                    device.default_sample_rate
                );
                println!("      {} - {}", device.vendor, device.description);
            }

            let inputs = devices.iter().filter(|d| d.is_input).count();
            let outputs = devices.iter().filter(|d| d.is_output).count();
            println!();
            println!("Total: {} input(s), {} output(s)", inputs, outputs);
            println!();
            println!("Tip: pass exact device names to --input/--output:");
            println!("  echoline run --input \"{}\" --output \"...\"", devices[0].name);
        }

        DevicesCommand::Show { name } => {
            let device = find_device(&catalog, &name)?;
            println!("Name:        {}", device.name);
            println!("Vendor:      {}", device.vendor);
            println!("Description: {}", device.description);
            println!("Version:     {}", device.version);
            println!("Direction:   {}", direction_label(&device));
            println!("Sample Rate: {} Hz", device.default_sample_rate);
        }
    }

    Ok(())
}

fn direction_label(device: &DeviceInfo) -> &'static str {
    match (device.is_input, device.is_output) {
        (true, true) => "input/output",
        (true, false) => "input",
        (false, true) => "output",
        (false, false) => "inactive",
    }
}
