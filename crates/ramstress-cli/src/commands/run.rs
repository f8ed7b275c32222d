//! Run command: allocate, stress until stopped, report.

use super::info::{print_memory_status, print_plan, PlanArgs};
use crate::dashboard::{LineDashboard, TerminalDashboard};
use crate::output::{banner, OutputFormat};
use crate::signal;
use anyhow::{Context, Result};
use clap::Args;
use ramstress_core::units::{format_hms, gib, group_thousands};
use ramstress_core::{
    default_probe, report_file_name, AllocationPlan, BlockAllocator, Dashboard, FailureReport,
    FinalReport, Orchestrator, RunSummary, Segment,
};
use serde::Serialize;
use std::fs;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

/// Arguments for run command.
#[derive(Args)]
pub struct RunArgs {
    /// Sizing options.
    #[command(flatten)]
    pub plan: PlanArgs,

    /// Stop each worker after this many full cycles.
    #[arg(long)]
    pub cycles: Option<u64>,

    /// Stop after this many seconds.
    #[arg(long)]
    pub duration: Option<u64>,

    /// Fixed seed for the Random Page test.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Directory for the failure report (default: desktop, else cwd).
    #[arg(long)]
    pub report_dir: Option<PathBuf>,

    /// Print a status line per tick instead of the full-screen dashboard.
    #[arg(long)]
    pub no_dashboard: bool,
}

#[derive(Serialize)]
struct RunOutput<'a> {
    interrupted: bool,
    report_path: Option<&'a Path>,
    #[serde(flatten)]
    report: &'a FinalReport,
}

/// Allocate free memory and stress it until Ctrl+C, the cycle count, or the
/// duration ends the run.
pub fn run(args: &RunArgs, format: OutputFormat) -> Result<()> {
    let mut config = args.plan.config()?;
    config.max_cycles = args.cycles;
    config.time_limit = args.duration.map(Duration::from_secs);
    config.seed = args.seed;
    let table = format == OutputFormat::Table;

    if table {
        println!("{}\n", banner("RAM & CPU STRESS TEST"));
    }

    let status = default_probe()
        .query()
        .context("could not retrieve system memory info")?;
    if table {
        print_memory_status(&status);
    }
    let plan = AllocationPlan::from_memory(&status, &config)?;
    if table {
        print_plan(plan.target, plan.safety_margin);
        println!("\nAllocating memory...\n");
    }

    let mut allocation = BlockAllocator::new(plan).allocate_with(Segment::zeroed, |p| {
        if table {
            println!("  {:.2} GB / {:.2} GB allocated", gib(p.allocated), gib(p.target));
        }
    })?;
    if allocation.exhausted {
        warn!(
            allocated = allocation.allocated,
            target = allocation.target,
            "allocation stopped early"
        );
        if table {
            println!(
                "\nWARNING: Could not allocate full {:.2} GB.\n  {:.2} GB allocated. Testing will continue with this amount.",
                gib(allocation.target),
                gib(allocation.allocated)
            );
        }
    }

    if table {
        println!("\n{}", banner("ALLOCATION COMPLETE"));
        println!("Allocated           : {:.2} GB", gib(allocation.allocated));
        println!("Allocation Time     : {}", format_hms(allocation.elapsed));
        println!("Thread Count        : {}", allocation.owners());
        println!("\nStarting test... (Press CTRL+C to stop)\n");
    }

    let orchestrator = Orchestrator::new(config);
    signal::install(orchestrator.cancel_token().clone())?;

    let full_screen = use_full_screen(format, args.no_dashboard, io::stdout().is_terminal());
    let mut dashboard: Box<dyn Dashboard + Send> = if full_screen {
        Box::new(TerminalDashboard::enter().context("could not start the dashboard")?)
    } else {
        Box::new(LineDashboard::new(io::stderr()))
    };
    let summary = orchestrator.run(&mut allocation, &mut *dashboard);
    // Leave the alternate screen before anything else is printed.
    drop(dashboard);
    let summary = summary?;
    drop(allocation);

    let report_path = match &summary.report {
        FinalReport::Failure(failure) => Some(write_report(failure, &report_dir(args))?),
        FinalReport::Success(_) => None,
    };

    match format {
        OutputFormat::Table => print_summary(&summary, report_path.as_deref()),
        OutputFormat::Json => {
            let output = RunOutput {
                interrupted: summary.interrupted,
                report_path: report_path.as_deref(),
                report: &summary.report,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Raw => match &summary.report {
            FinalReport::Success(s) => println!(
                "success {} {} {} {:.3}",
                s.duration.as_secs(),
                s.tested_bytes,
                s.total_cycles,
                s.avg_throughput_gbps
            ),
            FinalReport::Failure(f) => println!(
                "failure {} {} {}",
                f.duration.as_secs(),
                f.total_errors,
                report_path.as_deref().map_or_else(String::new, |p| p.display().to_string())
            ),
        },
    }

    Ok(())
}

/// The alternate-screen dashboard only makes sense on an interactive table run.
fn use_full_screen(format: OutputFormat, no_dashboard: bool, stdout_is_tty: bool) -> bool {
    format == OutputFormat::Table && !no_dashboard && stdout_is_tty
}

fn report_dir(args: &RunArgs) -> PathBuf {
    args.report_dir.clone().unwrap_or_else(|| {
        dirs::desktop_dir()
            .filter(|d| d.is_dir())
            .unwrap_or_else(|| PathBuf::from("."))
    })
}

/// Write the failure artifact into `dir`, returning its path.
fn write_report(failure: &FailureReport, dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("could not create report directory {}", dir.display()))?;
    let path = dir.join(report_file_name(failure.generated));
    fs::write(&path, failure.render())
        .with_context(|| format!("could not write report {}", path.display()))?;
    Ok(path)
}

fn print_summary(summary: &RunSummary, report_path: Option<&Path>) {
    match &summary.report {
        FinalReport::Failure(f) => {
            println!("{}", banner("ERRORS DETECTED!"));
            println!(
                "\nTotal {} memory errors detected!",
                group_thousands(f.total_errors)
            );
            if let Some(path) = report_path {
                println!("Detailed report saved: {}", path.display());
            }
            println!("Duration: {}", format_hms(f.duration));
            println!("Tested: {:.2} GB", gib(f.tested_bytes));
            println!("\nADVICE: Check RAM modules or contact service!");
        }
        FinalReport::Success(s) => {
            println!("{}", banner("TEST SUCCESSFUL!"));
            println!("\nNo errors detected!");
            println!("Duration            : {}", format_hms(s.duration));
            println!("Tested              : {:.2} GB", gib(s.tested_bytes));
            println!("Total Cycles        : {}", group_thousands(s.total_cycles));
            println!("Data Processed      : {:.2} GB", gib(s.bytes_processed));
            println!("Avg Speed           : {:.2} GB/s", s.avg_throughput_gbps);
            println!("\nYour RAM and CPU passed the stress test successfully!");
        }
    }
    if summary.interrupted {
        println!("\nTest stopped.");
    }
}
