//! One stress worker: runs the battery over its own segments until stopped.

use crate::battery::{cpu_burn, run_battery, BatteryOutcome, BatterySettings, Probe};
use crate::cells::Cells;
use crate::config::StressConfig;
use crate::patterns::{Fault, FaultSink, TestKind};
use crate::telemetry::{Activity, StressContext, WorkerTelemetry};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use tracing::debug;

/// What a worker did before it stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerReport {
    /// Worker id.
    pub id: usize,
    /// Completed cycles.
    pub cycles: u64,
    /// Totals over every battery pass, partial cycles included.
    pub totals: BatteryOutcome,
    /// True if the worker stopped because of cancellation rather than
    /// reaching its cycle limit.
    pub cancelled: bool,
}

/// Publishes battery progress into the shared context.
struct Publisher<'a> {
    id: usize,
    ctx: &'a StressContext,
    telemetry: &'a WorkerTelemetry,
}

impl FaultSink for Publisher<'_> {
    fn record(&mut self, fault: Fault) {
        self.ctx.record_fault(self.id, fault);
    }
}

impl Probe for Publisher<'_> {
    fn enter(&mut self, test: TestKind, param: u8) {
        self.telemetry.set_activity(Activity::Running { test, param });
    }

    fn leave(&mut self, _test: TestKind, bytes: u64) {
        self.telemetry.add_bytes(bytes);
    }

    fn burned(&mut self) {
        self.telemetry.add_matrix_op();
    }
}

/// A worker bound to a disjoint set of segments.
pub struct Worker<'a, C: Cells> {
    id: usize,
    segments: &'a mut [C],
    ctx: Arc<StressContext>,
    settings: BatterySettings,
    max_cycles: Option<u64>,
    rng: StdRng,
}

impl<'a, C: Cells> Worker<'a, C> {
    /// Create worker `id` over `segments`.
    ///
    /// With `config.seed` set, the worker's random source is seeded with
    /// `seed + id`; otherwise from OS entropy.
    pub fn new(
        id: usize,
        segments: &'a mut [C],
        ctx: Arc<StressContext>,
        config: &StressConfig,
    ) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(id as u64)),
            None => StdRng::from_entropy(),
        };
        Self {
            id,
            segments,
            ctx,
            settings: BatterySettings {
                settle: config.settle_interval,
                cpu_burn_repeats: config.cpu_burn_repeats,
            },
            max_cycles: config.max_cycles,
            rng,
        }
    }

    /// Worker id.
    #[must_use]
    pub fn id(&self) -> usize {
        self.id
    }

    /// Run cycles until cancelled or the cycle limit is reached.
    ///
    /// Cancellation is checked before each segment and before each cycle;
    /// a battery in progress always runs to completion. A cycle interrupted
    /// between segments is not counted.
    pub fn run(mut self) -> WorkerReport {
        let ctx = Arc::clone(&self.ctx);
        let telemetry = ctx.worker(self.id);
        let mut publisher = Publisher {
            id: self.id,
            ctx: &ctx,
            telemetry,
        };
        let mut totals = BatteryOutcome::default();
        let mut cycles = 0;
        let mut rounds = 0;
        let mut cancelled = false;

        debug!(worker = self.id, segments = self.segments.len(), "worker started");

        'cycles: loop {
            if self.max_cycles.is_some_and(|max| rounds >= max) {
                break;
            }
            if ctx.is_cancelled() {
                cancelled = true;
                break;
            }

            for segment in self.segments.iter_mut() {
                if ctx.is_cancelled() {
                    cancelled = true;
                    break 'cycles;
                }
                telemetry.set_activity(Activity::Preparing);
                totals.absorb(run_battery(
                    segment,
                    &mut self.rng,
                    self.settings,
                    &mut publisher,
                ));
            }

            rounds += 1;
            // Without segments there is no pass to count, only CPU load.
            if self.segments.is_empty() {
                totals.matrix_ops += cpu_burn(self.settings.cpu_burn_repeats, &mut publisher);
            } else {
                cycles = ctx.complete_cycle(self.id);
            }
        }

        telemetry.set_activity(Activity::Stopped);
        debug!(worker = self.id, cycles, errors = totals.faults, cancelled, "worker stopped");

        WorkerReport {
            id: self.id,
            cycles,
            totals,
            cancelled,
        }
    }
}
