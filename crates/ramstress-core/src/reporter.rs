//! Periodic read-only view of a running stress test.

use crate::error_log::ErrorRecord;
use crate::telemetry::{StressContext, WorkerTelemetry};
use crate::units::gib;
use crate::Result;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// How many recent errors a snapshot carries.
pub const RECENT_ERRORS: usize = 5;

/// One worker's line on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkerRow {
    /// Worker id.
    pub id: usize,
    /// Activity label, e.g. `[T1] Pattern: 0xAA`.
    pub status: String,
    /// True once the worker has exited.
    pub stopped: bool,
    /// Completed cycles.
    pub cycles: u64,
    /// Logical bytes processed.
    pub bytes_processed: u64,
    /// Mismatches found.
    pub errors: u64,
    /// Matrix multiplies run.
    pub matrix_ops: u64,
}

impl WorkerRow {
    fn capture(id: usize, telemetry: &WorkerTelemetry) -> Self {
        let activity = telemetry.activity();
        Self {
            id,
            status: activity.to_string(),
            stopped: activity.is_stopped(),
            cycles: telemetry.cycles(),
            bytes_processed: telemetry.bytes_processed(),
            errors: telemetry.errors(),
            matrix_ops: telemetry.matrix_ops(),
        }
    }
}

/// Immutable view of a [`StressContext`] at one instant.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    /// Time since the run started.
    pub elapsed: Duration,
    /// Bytes under test.
    pub allocated: u64,
    /// Completed cycles over all workers.
    pub total_cycles: u64,
    /// Logical bytes processed over all workers.
    pub bytes_processed: u64,
    /// `bytes_processed` in GiB per second of elapsed time.
    pub throughput_gbps: f64,
    /// Matrix multiplies over all workers.
    pub matrix_ops: u64,
    /// Total mismatches.
    pub total_errors: u64,
    /// Per-worker rows, by id.
    pub workers: Vec<WorkerRow>,
    /// Up to [`RECENT_ERRORS`] newest records, newest first.
    pub recent_errors: Vec<ErrorRecord>,
}

impl Snapshot {
    /// Read the context without coordinating with workers.
    #[must_use]
    pub fn capture(ctx: &StressContext) -> Self {
        let workers: Vec<WorkerRow> = ctx
            .workers()
            .enumerate()
            .map(|(id, t)| WorkerRow::capture(id, t))
            .collect();
        let elapsed = ctx.elapsed();
        let bytes_processed = workers.iter().map(|w| w.bytes_processed).sum();
        let total_errors = ctx.total_errors();
        let recent_errors = if total_errors > 0 {
            ctx.log().recent(RECENT_ERRORS)
        } else {
            Vec::new()
        };

        Self {
            elapsed,
            allocated: ctx.allocated(),
            total_cycles: ctx.total_cycles(),
            bytes_processed,
            throughput_gbps: throughput_gbps(bytes_processed, elapsed),
            matrix_ops: workers.iter().map(|w| w.matrix_ops).sum(),
            total_errors,
            workers,
            recent_errors,
        }
    }

    /// True when at least one mismatch was recorded.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.total_errors > 0
    }
}

/// GiB per second; zero for a zero interval.
#[must_use]
pub fn throughput_gbps(bytes: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        gib(bytes) / secs
    } else {
        0.0
    }
}

/// Console seam for the live view.
pub trait Dashboard {
    /// Draw one frame.
    ///
    /// # Errors
    ///
    /// Any error; the reporter ignores it and tries again next tick.
    fn render(&mut self, snapshot: &Snapshot) -> Result<()>;
}

/// Frame counts from one reporter run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReporterStats {
    /// Frames rendered successfully.
    pub frames: u64,
    /// Frames whose render failed.
    pub failures: u64,
}

/// Renders snapshots at a fixed cadence until cancellation.
#[derive(Debug, Clone)]
pub struct Reporter {
    ctx: Arc<StressContext>,
    tick: Duration,
}

impl Reporter {
    /// Reporter over `ctx`, rendering every `tick`.
    #[must_use]
    pub fn new(ctx: Arc<StressContext>, tick: Duration) -> Self {
        Self { ctx, tick }
    }

    /// Render until the context's token is cancelled.
    ///
    /// Cancellation is checked before each frame. Render errors are
    /// counted and otherwise ignored.
    pub fn run<D: Dashboard + ?Sized>(&self, dashboard: &mut D) -> ReporterStats {
        let mut stats = ReporterStats::default();
        while !self.ctx.is_cancelled() {
            let snapshot = Snapshot::capture(&self.ctx);
            match dashboard.render(&snapshot) {
                Ok(()) => stats.frames += 1,
                Err(_) => stats.failures += 1,
            }
            std::thread::sleep(self.tick);
        }
        stats
    }
}
