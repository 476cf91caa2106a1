//! s7sim CLI
//!
//! Command-line tools for running S7 data-block simulations.
//!
//! # Commands
//!
//! - `run` - Load a configuration and run the sync loop
//! - `validate` - Check a configuration file and print its block layouts
//! - `version` - Show version information

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// S7 data-block simulator tools.
#[derive(Parser)]
#[command(name = "s7sim")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a configuration and run the sync loop
    Run {
        /// Path to the configuration file
        config: PathBuf,

        /// Sync tick interval in milliseconds (clamped to 10..=5000)
        #[arg(short, long, default_value = "20")]
        interval_ms: u64,

        /// Print block snapshots at this interval in milliseconds
        #[arg(short, long)]
        poll_ms: Option<u64>,

        /// Stop after this many seconds instead of running until interrupted
        #[arg(short, long)]
        duration_secs: Option<u64>,
    },

    /// Check a configuration file and print its block layouts
    Validate {
        /// Path to the configuration file
        config: PathBuf,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Run {
            config,
            interval_ms,
            poll_ms,
            duration_secs,
        } => {
            commands::run::run(&config, interval_ms, poll_ms, duration_secs)?;
        }
        Commands::Validate { config } => {
            commands::validate::run(&config)?;
        }
        Commands::Version => {
            println!("s7sim CLI v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
