//! Single-pass battery timing for the `benchmark` command.

use crate::battery::{run_battery, BatterySettings, Probe};
use crate::cells::Cells;
use crate::patterns::{Fault, FaultSink, TestKind};
use crate::reporter::throughput_gbps;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::time::{Duration, Instant};

/// Timing for one battery step, summed over its repetitions.
#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkResult {
    /// Step measured.
    pub test: TestKind,
    /// How many times the step ran (six for Pattern and Inverse).
    pub runs: u32,
    /// Logical bytes processed.
    pub bytes_processed: u64,
    /// Matrix multiplies (T10 only).
    pub matrix_ops: u64,
    /// Mismatches found.
    pub faults: u64,
    /// Wall-clock time.
    pub elapsed: Duration,
}

impl BenchmarkResult {
    fn new(test: TestKind) -> Self {
        Self {
            test,
            runs: 0,
            bytes_processed: 0,
            matrix_ops: 0,
            faults: 0,
            elapsed: Duration::ZERO,
        }
    }

    /// Logical GiB per second.
    #[must_use]
    pub fn throughput_gbps(&self) -> f64 {
        throughput_gbps(self.bytes_processed, self.elapsed)
    }
}

struct Stopwatch {
    results: Vec<BenchmarkResult>,
    current: Option<(usize, Instant)>,
}

impl FaultSink for Stopwatch {
    fn record(&mut self, _fault: Fault) {
        if let Some((i, _)) = self.current {
            self.results[i].faults += 1;
        }
    }
}

impl Probe for Stopwatch {
    fn enter(&mut self, kind: TestKind, _param: u8) {
        self.current = Some((usize::from(kind.index()), Instant::now()));
    }

    fn leave(&mut self, _kind: TestKind, bytes: u64) {
        if let Some((i, started)) = self.current.take() {
            let result = &mut self.results[i];
            result.runs += 1;
            result.bytes_processed += bytes;
            result.elapsed += started.elapsed();
        }
    }

    fn burned(&mut self) {
        if let Some((i, _)) = self.current {
            self.results[i].matrix_ops += 1;
        }
    }
}

/// Run the battery once over `cells` and time each step.
///
/// Results are in battery order, one per [`TestKind`].
pub fn run_benchmark<C: Cells + ?Sized>(
    cells: &mut C,
    settings: BatterySettings,
    seed: u64,
) -> Vec<BenchmarkResult> {
    let mut watch = Stopwatch {
        results: TestKind::ALL.iter().copied().map(BenchmarkResult::new).collect(),
        current: None,
    };
    let mut rng = StdRng::seed_from_u64(seed);
    run_battery(cells, &mut rng, settings, &mut watch);
    watch.results
}
