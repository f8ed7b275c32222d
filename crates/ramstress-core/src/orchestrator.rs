//! Runs workers and the reporter over an allocation and collects the
//! final report.

use crate::allocator::Allocation;
use crate::cells::Cells;
use crate::config::StressConfig;
use crate::report::FinalReport;
use crate::reporter::{Dashboard, Reporter, ReporterStats, Snapshot};
use crate::telemetry::{CancelToken, StressContext};
use crate::worker::{Worker, WorkerReport};
use crate::{Error, Result};
use chrono::Local;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{info, warn};

const DEADLINE_POLL: Duration = Duration::from_millis(50);

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// State after every worker stopped.
    pub snapshot: Snapshot,
    /// Success or failure report.
    pub report: FinalReport,
    /// Per-worker outcome, by id.
    pub workers: Vec<WorkerReport>,
    /// Reporter frame counts.
    pub reporter: ReporterStats,
    /// True if the run ended through cancellation (interrupt or time limit)
    /// rather than every worker reaching its cycle limit.
    pub interrupted: bool,
}

/// Owns the cancellation token and drives one run.
#[derive(Debug)]
pub struct Orchestrator {
    config: StressConfig,
    cancel: CancelToken,
}

impl Orchestrator {
    /// Orchestrator with a fresh cancellation token.
    #[must_use]
    pub fn new(config: StressConfig) -> Self {
        Self {
            config,
            cancel: CancelToken::new(),
        }
    }

    /// The token that stops the run; hand a clone to a signal handler.
    #[must_use]
    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Run one worker per owner of `allocation` until cancelled, the time
    /// limit passes, or every worker reaches `max_cycles`.
    ///
    /// Workers run on threads named `ramstress-worker-N`; the reporter
    /// renders into `dashboard` on its own thread and is stopped after the
    /// last worker exits.
    ///
    /// # Errors
    ///
    /// [`Error::Io`] if a thread cannot be spawned (the run is cancelled
    /// first), [`Error::WorkerPanicked`] if a worker panics.
    pub fn run<C, D>(&self, allocation: &mut Allocation<C>, dashboard: &mut D) -> Result<RunSummary>
    where
        C: Cells,
        D: Dashboard + Send + ?Sized,
    {
        let owners = allocation.owners();
        let ctx = Arc::new(StressContext::new(
            owners,
            allocation.allocated,
            self.cancel.clone(),
        ));
        let reporter = Reporter::new(Arc::clone(&ctx), self.config.report_tick);

        info!(
            workers = owners,
            segments = allocation.segment_count(),
            allocated = allocation.allocated,
            "starting stress run"
        );

        let (workers, reporter_stats, interrupted) = thread::scope(|s| -> Result<_> {
            let reporter_handle = thread::Builder::new()
                .name("ramstress-reporter".to_string())
                .spawn_scoped(s, || reporter.run(dashboard))?;

            let mut handles = Vec::with_capacity(owners);
            for (id, segments) in allocation.per_owner.iter_mut().enumerate() {
                let worker = Worker::new(id, segments, Arc::clone(&ctx), &self.config);
                let cancel = self.cancel.clone();
                let spawned = thread::Builder::new()
                    .name(format!("ramstress-worker-{id}"))
                    .spawn_scoped(s, move || {
                        let outcome = panic::catch_unwind(AssertUnwindSafe(|| worker.run()));
                        if outcome.is_err() {
                            // Stop the others so the join below cannot hang.
                            cancel.cancel();
                        }
                        outcome
                    });
                match spawned {
                    Ok(handle) => handles.push(handle),
                    Err(e) => {
                        self.cancel.cancel();
                        return Err(e.into());
                    }
                }
            }

            if let Some(limit) = self.config.time_limit {
                let deadline = Instant::now() + limit;
                while !handles.iter().all(|h| h.is_finished()) {
                    let now = Instant::now();
                    if now >= deadline {
                        info!(?limit, "time limit reached, stopping workers");
                        self.cancel.cancel();
                        break;
                    }
                    thread::sleep(DEADLINE_POLL.min(deadline - now));
                }
            }

            let mut reports = Vec::with_capacity(owners);
            let mut panicked = None;
            for (id, handle) in handles.into_iter().enumerate() {
                match handle.join() {
                    Ok(Ok(report)) => reports.push(report),
                    _ => {
                        warn!(worker = id, "worker panicked");
                        panicked.get_or_insert(id);
                    }
                }
            }

            let interrupted = self.cancel.is_cancelled();
            // Workers are done; this only stops the reporter.
            self.cancel.cancel();
            let stats = reporter_handle.join().unwrap_or_default();

            match panicked {
                Some(worker) => Err(Error::WorkerPanicked { worker }),
                None => Ok((reports, stats, interrupted)),
            }
        })?;

        let snapshot = Snapshot::capture(&ctx);
        let report = FinalReport::from_snapshot(&snapshot, ctx.log().sorted(), Local::now());

        info!(
            cycles = snapshot.total_cycles,
            errors = snapshot.total_errors,
            interrupted,
            "stress run finished"
        );

        Ok(RunSummary {
            snapshot,
            report,
            workers,
            reporter: reporter_stats,
            interrupted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::{AllocationPlan, BlockAllocator};

    struct Quiet;

    impl Dashboard for Quiet {
        fn render(&mut self, _: &Snapshot) -> Result<()> {
            Ok(())
        }
    }

    fn fast(workers: usize) -> StressConfig {
        StressConfig {
            workers,
            settle_interval: Duration::ZERO,
            cpu_burn_repeats: 1,
            report_tick: Duration::from_millis(5),
            seed: Some(1),
            ..StressConfig::default()
        }
    }

    fn vec_allocation(target: u64, block: usize, owners: usize) -> Allocation<Vec<u8>> {
        BlockAllocator::new(AllocationPlan::fixed(target, block, owners))
            .allocate_with(|len| Ok(vec![0u8; len]), |_| {})
            .unwrap()
    }

    #[test]
    fn test_run_fixed_cycles() {
        let config = StressConfig {
            max_cycles: Some(2),
            ..fast(3)
        };
        let mut allocation = vec_allocation(6 * 4096, 4096, 3);
        let summary = Orchestrator::new(config)
            .run(&mut allocation, &mut Quiet)
            .unwrap();

        assert!(!summary.interrupted);
        assert_eq!(summary.snapshot.total_cycles, 6);
        assert!(summary.workers.iter().all(|w| w.cycles == 2));
        assert!(summary.snapshot.workers.iter().all(|w| w.stopped));
        assert!(summary.report.is_success());
    }

    #[test]
    fn test_workers_without_segments_add_no_cycles() {
        let config = StressConfig {
            max_cycles: Some(2),
            ..fast(4)
        };
        let mut allocation = vec_allocation(4096, 4096, 4);
        let summary = Orchestrator::new(config)
            .run(&mut allocation, &mut Quiet)
            .unwrap();

        let cycles: Vec<u64> = summary.workers.iter().map(|w| w.cycles).collect();
        assert_eq!(cycles, vec![2, 0, 0, 0]);
        assert_eq!(summary.snapshot.total_cycles, 2);
        assert!(summary.snapshot.matrix_ops > 2);
    }

    #[test]
    fn test_pre_cancelled_run_stops_immediately() {
        let orchestrator = Orchestrator::new(fast(2));
        orchestrator.cancel_token().cancel();
        let mut allocation = vec_allocation(2 * 4096, 4096, 2);
        let summary = orchestrator.run(&mut allocation, &mut Quiet).unwrap();
        assert!(summary.interrupted);
        assert_eq!(summary.snapshot.total_cycles, 0);
        assert_eq!(summary.snapshot.bytes_processed, 0);
    }

    #[test]
    fn test_time_limit_cancels_endless_run() {
        let config = StressConfig {
            time_limit: Some(Duration::from_millis(100)),
            ..fast(2)
        };
        let mut allocation = vec_allocation(2 * 4096, 4096, 2);
        let started = Instant::now();
        let summary = Orchestrator::new(config)
            .run(&mut allocation, &mut Quiet)
            .unwrap();
        assert!(summary.interrupted);
        assert!(started.elapsed() >= Duration::from_millis(100));
        assert!(summary.report.is_success());
    }

    #[test]
    fn test_worker_panic_is_reported() {
        struct Explodes;
        impl Cells for Explodes {
            fn len(&self) -> usize {
                1
            }
            fn read(&self, _: usize) -> u8 {
                panic!("bus error");
            }
            fn write(&mut self, _: usize, _: u8) {}
        }
        let config = StressConfig {
            max_cycles: Some(1),
            ..fast(2)
        };
        let mut allocation = Allocation::from_parts(vec![Vec::new(), vec![Explodes]]);
        let err = Orchestrator::new(config)
            .run(&mut allocation, &mut Quiet)
            .unwrap_err();
        assert!(matches!(err, Error::WorkerPanicked { worker: 1 }));
    }
}
