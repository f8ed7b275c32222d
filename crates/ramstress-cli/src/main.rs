//! ramstress CLI - fill free RAM with test patterns and hammer it.

#![deny(missing_docs)]
#![deny(clippy::panic)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]

mod commands;
mod dashboard;
mod output;
mod signal;

use clap::{Parser, Subcommand};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// ramstress: RAM and CPU stress tester
#[derive(Parser)]
#[command(name = "ramstress")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Output format
    #[arg(long, global = true, default_value = "table")]
    format: output::OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Allocate free memory and run the stress battery until stopped
    Run(commands::RunArgs),

    /// Show system memory and the planned allocation
    Info(commands::InfoArgs),

    /// Time one pass of the battery over a single buffer
    Benchmark(commands::BenchmarkArgs),
}

fn main() -> ExitCode {
    // Silent unless RUST_LOG is set; stdout belongs to the dashboard.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run(args) => commands::run(&args, cli.format),
        Commands::Info(args) => commands::info(&args, cli.format),
        Commands::Benchmark(args) => commands::benchmark(&args, cli.format),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
