//! Shared run state: per-worker counters, global counters, error log and
//! the cancellation flag.
//!
//! One [`StressContext`] is built per run and handed to every worker and
//! the reporter behind an `Arc`. Each [`WorkerTelemetry`] has a single
//! writer (its worker); readers load the atomics without locking and may
//! observe slightly stale values.

use crate::error_log::{ErrorLog, ErrorRecord};
use crate::patterns::{Fault, TestKind};
use chrono::Local;
use crossbeam_utils::CachePadded;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU16, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

const STATE_PREPARING: u8 = 0;
const STATE_STOPPED: u8 = 0xFF;

/// What a worker is doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activity {
    /// Between segments, or not yet started.
    Preparing,
    /// Running a battery step; `param` is the pattern byte for T1/T2.
    Running {
        /// Step being run.
        test: TestKind,
        /// Pattern byte, zero for steps without one.
        param: u8,
    },
    /// Observed cancellation and exited.
    Stopped,
}

impl Activity {
    fn pack(self) -> u16 {
        let (state, param) = match self {
            Self::Preparing => (STATE_PREPARING, 0),
            Self::Running { test, param } => (test.index() + 1, param),
            Self::Stopped => (STATE_STOPPED, 0),
        };
        u16::from_be_bytes([state, param])
    }

    fn unpack(raw: u16) -> Self {
        let [state, param] = raw.to_be_bytes();
        match state {
            STATE_PREPARING => Self::Preparing,
            STATE_STOPPED => Self::Stopped,
            n => TestKind::from_index(n - 1)
                .map_or(Self::Preparing, |test| Self::Running { test, param }),
        }
    }

    /// True once the worker has exited.
    #[must_use]
    pub fn is_stopped(self) -> bool {
        self == Self::Stopped
    }
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Preparing => f.write_str("Preparing..."),
            Self::Stopped => f.write_str("Stopped"),
            Self::Running { test, param } if test.takes_pattern() => {
                write!(f, "{} {}: 0x{param:02X}", test.tag(), test.name())
            }
            Self::Running { test, .. } => write!(f, "{test}"),
        }
    }
}

/// Counters owned by one worker.
#[derive(Debug)]
pub struct WorkerTelemetry {
    activity: AtomicU16,
    cycles: AtomicU64,
    bytes_processed: AtomicU64,
    errors: AtomicU64,
    matrix_ops: AtomicU64,
}

impl Default for WorkerTelemetry {
    fn default() -> Self {
        Self {
            activity: AtomicU16::new(Activity::Preparing.pack()),
            cycles: AtomicU64::new(0),
            bytes_processed: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            matrix_ops: AtomicU64::new(0),
        }
    }
}

impl WorkerTelemetry {
    /// Publish the current activity.
    pub fn set_activity(&self, activity: Activity) {
        self.activity.store(activity.pack(), Ordering::Relaxed);
    }

    /// Current activity.
    #[must_use]
    pub fn activity(&self) -> Activity {
        Activity::unpack(self.activity.load(Ordering::Relaxed))
    }

    /// Completed cycles.
    #[must_use]
    pub fn cycles(&self) -> u64 {
        self.cycles.load(Ordering::Acquire)
    }

    /// Logical bytes processed so far.
    #[must_use]
    pub fn bytes_processed(&self) -> u64 {
        self.bytes_processed.load(Ordering::Relaxed)
    }

    /// Mismatches recorded by this worker.
    #[must_use]
    pub fn errors(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }

    /// Matrix multiplies completed.
    #[must_use]
    pub fn matrix_ops(&self) -> u64 {
        self.matrix_ops.load(Ordering::Relaxed)
    }

    /// Add to the bytes-processed counter.
    pub fn add_bytes(&self, bytes: u64) {
        self.bytes_processed.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Count one matrix multiply.
    pub fn add_matrix_op(&self) {
        self.matrix_ops.fetch_add(1, Ordering::Relaxed);
    }
}

/// Cooperative, process-wide stop flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// A fresh, unset token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request every holder to stop. Idempotent.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// True once [`cancel`](Self::cancel) has been called on any clone.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Everything a run shares between workers and the reporter.
#[derive(Debug)]
pub struct StressContext {
    workers: Vec<CachePadded<WorkerTelemetry>>,
    cycles: AtomicU64,
    log: ErrorLog,
    cancel: CancelToken,
    started: Instant,
    allocated: u64,
}

impl StressContext {
    /// Context for `workers` workers testing `allocated` bytes.
    #[must_use]
    pub fn new(workers: usize, allocated: u64, cancel: CancelToken) -> Self {
        Self {
            workers: (0..workers)
                .map(|_| CachePadded::new(WorkerTelemetry::default()))
                .collect(),
            cycles: AtomicU64::new(0),
            log: ErrorLog::new(workers),
            cancel,
            started: Instant::now(),
            allocated,
        }
    }

    /// Telemetry of worker `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not a worker of this context.
    #[must_use]
    pub fn worker(&self, id: usize) -> &WorkerTelemetry {
        &self.workers[id]
    }

    /// All worker telemetry, indexed by worker id.
    pub fn workers(&self) -> impl ExactSizeIterator<Item = &WorkerTelemetry> {
        self.workers.iter().map(|w| &**w)
    }

    /// Number of workers.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Turn `fault` into an [`ErrorRecord`] and append it.
    ///
    /// The worker's and the global error counters advance together with the
    /// log. Returns false (and records nothing) if the bytes match.
    pub fn record_fault(&self, worker: usize, fault: Fault) -> bool {
        match ErrorRecord::new(Local::now(), worker, fault) {
            Some(record) => {
                self.log.append(record, &self.workers[worker].errors);
                true
            }
            None => false,
        }
    }

    /// Mark one full pass by `worker`. Returns the worker's new cycle count.
    pub fn complete_cycle(&self, worker: usize) -> u64 {
        self.cycles.fetch_add(1, Ordering::AcqRel);
        self.workers[worker].cycles.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Sum of completed cycles over all workers.
    #[must_use]
    pub fn total_cycles(&self) -> u64 {
        self.cycles.load(Ordering::Acquire)
    }

    /// Total mismatches, equal to the error log's size.
    #[must_use]
    pub fn total_errors(&self) -> u64 {
        self.log.total()
    }

    /// Sum of per-worker bytes processed.
    #[must_use]
    pub fn total_bytes_processed(&self) -> u64 {
        self.workers().map(WorkerTelemetry::bytes_processed).sum()
    }

    /// Sum of per-worker matrix multiplies.
    #[must_use]
    pub fn total_matrix_ops(&self) -> u64 {
        self.workers().map(WorkerTelemetry::matrix_ops).sum()
    }

    /// The shared error log.
    #[must_use]
    pub fn log(&self) -> &ErrorLog {
        &self.log
    }

    /// The run's cancellation token.
    #[must_use]
    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Shorthand for `cancel_token().is_cancelled()`.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Bytes under test.
    #[must_use]
    pub fn allocated(&self) -> u64 {
        self.allocated
    }

    /// Time since the context was created.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}
