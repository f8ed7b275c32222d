//! Info command: system memory and the allocation that `run` would plan.

use crate::output::{rule, OutputFormat};
use anyhow::{Context, Result};
use clap::Args;
use ramstress_core::units::{format_size, gib, parse_size, MIB};
use ramstress_core::{default_probe, AllocationPlan, MemoryStatus, StressConfig};
use serde::Serialize;

/// Sizing options shared by `run` and `info`.
#[derive(Args, Debug, Clone)]
pub struct PlanArgs {
    /// Worker threads (default: one per hardware thread).
    #[arg(short, long)]
    pub threads: Option<usize>,

    /// Memory left untouched for the OS (e.g. "500M", "1G").
    #[arg(long, value_parser = size_arg)]
    pub safety_margin: Option<u64>,

    /// Cap on the amount of memory to test (e.g. "8G").
    #[arg(long, value_parser = size_arg)]
    pub max: Option<u64>,

    /// Size of each allocated block (e.g. "256M").
    #[arg(long, value_parser = size_arg)]
    pub block_size: Option<u64>,
}

impl PlanArgs {
    /// Apply the flags over the default configuration.
    pub fn config(&self) -> Result<StressConfig> {
        let mut config = StressConfig::default();
        if let Some(threads) = self.threads {
            config.workers = threads;
        }
        if let Some(margin) = self.safety_margin {
            config.safety_margin = margin;
        }
        if let Some(block) = self.block_size {
            config.block_size = usize::try_from(block)
                .with_context(|| format!("block size {block} does not fit in memory"))?;
        }
        config.max_bytes = self.max;
        config.validate()?;
        Ok(config)
    }
}

/// clap parser for human-readable sizes.
pub fn size_arg(value: &str) -> Result<u64, String> {
    parse_size(value).map_err(|e| e.to_string())
}

/// Arguments for info command.
#[derive(Args)]
pub struct InfoArgs {
    /// Sizing options.
    #[command(flatten)]
    pub plan: PlanArgs,
}

#[derive(Debug, Serialize)]
struct InfoOutput {
    memory: MemoryStatus,
    workers: usize,
    block_size: usize,
    safety_margin: u64,
    target: Option<u64>,
}

/// Show system memory status and the planned allocation.
pub fn info(args: &InfoArgs, format: OutputFormat) -> Result<()> {
    let config = args.plan.config()?;
    let status = default_probe()
        .query()
        .context("could not retrieve system memory info")?;
    let plan = AllocationPlan::from_memory(&status, &config);

    let output = InfoOutput {
        memory: status,
        workers: config.workers,
        block_size: config.block_size,
        safety_margin: config.safety_margin,
        target: plan.as_ref().ok().map(|p| p.target),
    };

    match format {
        OutputFormat::Table => {
            print_memory_status(&status);
            if let Some(target) = output.target {
                print_plan(target, config.safety_margin);
                println!("Threads             : {}", config.workers);
                println!("Block Size          : {}", format_size(config.block_size as u64));
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&output)?),
        OutputFormat::Raw => println!(
            "{} {} {} {} {}",
            status.total,
            status.available,
            status.load_percent,
            config.safety_margin,
            output.target.unwrap_or(0)
        ),
    }

    plan?;
    Ok(())
}

/// The memory status block printed before allocating.
pub fn print_memory_status(status: &MemoryStatus) {
    println!("SYSTEM MEMORY STATUS:");
    println!("{}", rule());
    println!("Total RAM           : {:.2} GB", gib(status.total));
    println!("Available RAM       : {:.2} GB", gib(status.available));
    println!(
        "Used RAM            : {:.2} GB ({}%)",
        gib(status.used()),
        status.load_percent
    );
}

/// Target and margin lines.
pub fn print_plan(target: u64, safety_margin: u64) {
    println!();
    println!("TARGET ALLOCATION   : {:.2} GB", gib(target));
    println!("SAFETY MARGIN       : {:.0} MB", safety_margin as f64 / MIB as f64);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan_args() -> PlanArgs {
        PlanArgs {
            threads: None,
            safety_margin: None,
            max: None,
            block_size: None,
        }
    }

    #[test]
    fn test_defaults_match_engine() {
        let config = plan_args().config().unwrap();
        assert_eq!(config, StressConfig::default());
    }

    #[test]
    fn test_flags_override_config() {
        let args = PlanArgs {
            threads: Some(3),
            safety_margin: Some(MIB),
            max: Some(8 * MIB),
            block_size: Some(2 * MIB),
        };
        let config = args.config().unwrap();
        assert_eq!(config.workers, 3);
        assert_eq!(config.safety_margin, MIB);
        assert_eq!(config.max_bytes, Some(8 * MIB));
        assert_eq!(config.block_size, 2 * MIB as usize);
    }

    #[test]
    fn test_zero_threads_rejected() {
        let args = PlanArgs {
            threads: Some(0),
            ..plan_args()
        };
        assert!(args.config().is_err());
    }

    #[test]
    fn test_size_arg() {
        assert_eq!(size_arg("512M"), Ok(512 * MIB));
        assert!(size_arg("lots").is_err());
    }
}
