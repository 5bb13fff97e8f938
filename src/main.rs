// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};

mod cli;

#[derive(Parser)]
#[command(name = "scanner")]
#[command(about = "QR code scanner for video input devices")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available video input devices
    List,

    /// Scan a live camera feed and print decoded codes
    Scan {
        /// Device index to use (from 'scanner list', default: first device)
        #[arg(short, long)]
        device: Option<usize>,

        /// Exit after the first decoded code
        #[arg(short, long)]
        once: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=scanner=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::List => cli::list_devices(),
        Commands::Scan { device, once } => cli::scan(device, once),
    }
}
