//! Benchmark command: one timed pass of the battery.

use super::info::size_arg;
use crate::output::OutputFormat;
use anyhow::{Context, Result};
use clap::Args;
use ramstress_core::benchmark::{run_benchmark, BenchmarkResult};
use ramstress_core::units::{format_size, group_thousands};
use ramstress_core::{BatterySettings, Segment};
use serde::Serialize;
use std::time::Duration;

/// Arguments for benchmark command.
#[derive(Args)]
pub struct BenchmarkArgs {
    /// Buffer size (e.g. "64M").
    #[arg(short, long, default_value = "64M", value_parser = size_arg)]
    pub size: u64,

    /// Seed for the Random Page test.
    #[arg(long, default_value = "12345")]
    pub seed: u64,

    /// Solid Bits settle interval in milliseconds.
    #[arg(long, default_value = "100")]
    pub settle_ms: u64,
}

#[derive(Debug, Serialize)]
struct BenchmarkRow {
    tag: &'static str,
    test: &'static str,
    runs: u32,
    millis: f64,
    throughput_gbps: f64,
    bytes_processed: u64,
    matrix_ops: u64,
    faults: u64,
}

impl From<&BenchmarkResult> for BenchmarkRow {
    fn from(r: &BenchmarkResult) -> Self {
        Self {
            tag: r.test.tag(),
            test: r.test.name(),
            runs: r.runs,
            millis: r.elapsed.as_secs_f64() * 1e3,
            throughput_gbps: r.throughput_gbps(),
            bytes_processed: r.bytes_processed,
            matrix_ops: r.matrix_ops,
            faults: r.faults,
        }
    }
}

/// Run the battery once over a fresh buffer and print per-test timings.
pub fn benchmark(args: &BenchmarkArgs, format: OutputFormat) -> Result<()> {
    let len = usize::try_from(args.size).context("buffer size does not fit in memory")?;
    let mut buffer = Segment::zeroed(len).context("could not allocate benchmark buffer")?;
    let settings = BatterySettings {
        settle: Duration::from_millis(args.settle_ms),
        ..BatterySettings::default()
    };

    if format == OutputFormat::Table {
        println!("ramstress Battery Benchmark");
        println!("===========================");
        println!("Buffer: {}", format_size(args.size));
        println!("Seed: {}", args.seed);
        println!();
    }

    let results = run_benchmark(&mut buffer, settings, args.seed);
    let rows: Vec<BenchmarkRow> = results.iter().map(BenchmarkRow::from).collect();

    match format {
        OutputFormat::Table => print_table(&rows),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
        OutputFormat::Raw => {
            for r in &rows {
                println!(
                    "{} {} {:.3} {:.3} {}",
                    r.tag, r.runs, r.millis, r.throughput_gbps, r.faults
                );
            }
        }
    }

    let faults: u64 = rows.iter().map(|r| r.faults).sum();
    if faults > 0 && format == OutputFormat::Table {
        println!("\nWARNING: {faults} mismatches found in a {} buffer", format_size(args.size));
    }
    Ok(())
}

fn print_table(rows: &[BenchmarkRow]) {
    println!(
        "{:<6} {:<14} {:>5} {:>10} {:>12} {:>12}",
        "TAG", "TEST", "RUNS", "TIME", "THROUGHPUT", "MATRIX OPS"
    );
    println!("{}", "-".repeat(64));

    for r in rows {
        println!(
            "{:<6} {:<14} {:>5} {:>8.1}ms {:>7.2} GB/s {:>12}",
            r.tag,
            r.test,
            r.runs,
            r.millis,
            r.throughput_gbps,
            group_thousands(r.matrix_ops)
        );
    }
}
