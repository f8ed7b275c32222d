//! Append-only log of byte mismatches shared by all workers.
//!
//! The log is sharded, one cache-padded shard per worker, so appends from
//! different workers never contend with each other. The total counter is
//! bumped while the appender holds its shard lock; a [`LogSnapshot`] takes
//! every shard lock before reading it, so its `total` always equals its
//! record count.

use crate::patterns::Fault;
use crate::units::binary8;
use chrono::{DateTime, Local};
use crossbeam_utils::CachePadded;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// An immutable description of one mismatched byte.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorRecord {
    /// When the mismatch was observed.
    pub timestamp: DateTime<Local>,
    /// Worker that owns the segment.
    pub worker: usize,
    /// Test (or phase) name.
    pub test: &'static str,
    /// Byte offset within the segment.
    pub address: u64,
    /// Value written.
    pub expected: u8,
    /// Value read back.
    pub actual: u8,
    /// `expected ^ actual` as eight binary digits.
    pub bit_diff: String,
    /// Optional detail (phase, page, address).
    pub context: Option<String>,
}

impl ErrorRecord {
    /// Build a record from a fault. Returns `None` if the bytes match.
    #[must_use]
    pub fn new(timestamp: DateTime<Local>, worker: usize, fault: Fault) -> Option<Self> {
        let mask = fault.diff_mask();
        if mask == 0 {
            return None;
        }
        Some(Self {
            timestamp,
            worker,
            test: fault.test,
            address: fault.address,
            expected: fault.expected,
            actual: fault.actual,
            bit_diff: binary8(mask),
            context: fault.context,
        })
    }

    /// Bits that differ; never zero.
    #[must_use]
    pub fn diff_mask(&self) -> u8 {
        self.expected ^ self.actual
    }
}

/// Consistent copy of the log contents.
#[derive(Debug, Clone)]
pub struct LogSnapshot {
    /// Value of the total counter under the shard locks.
    pub total: u64,
    /// All records, unordered.
    pub records: Vec<ErrorRecord>,
}

/// Sharded, multi-writer, append-only error log.
#[derive(Debug)]
pub struct ErrorLog {
    shards: Vec<CachePadded<Mutex<Vec<ErrorRecord>>>>,
    total: AtomicU64,
}

impl ErrorLog {
    /// Create a log with `shards` shards (at least one).
    #[must_use]
    pub fn new(shards: usize) -> Self {
        Self {
            shards: (0..shards.max(1))
                .map(|_| CachePadded::new(Mutex::new(Vec::new())))
                .collect(),
            total: AtomicU64::new(0),
        }
    }

    /// Append a record to its worker's shard.
    ///
    /// `also` is incremented inside the same critical section; workers pass
    /// their own error counter so per-worker and global totals stay in step.
    pub fn append(&self, record: ErrorRecord, also: &AtomicU64) -> u64 {
        let shard = &self.shards[record.worker % self.shards.len()];
        let mut records = shard.lock();
        records.push(record);
        also.fetch_add(1, Ordering::Relaxed);
        self.total.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Number of records appended so far.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Acquire)
    }

    /// True if nothing has been appended.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Lock every shard and copy the contents out.
    #[must_use]
    pub fn snapshot(&self) -> LogSnapshot {
        let guards: Vec<_> = self.shards.iter().map(|s| s.lock()).collect();
        let total = self.total.load(Ordering::Acquire);
        let records = guards.iter().flat_map(|g| g.iter().cloned()).collect();
        LogSnapshot { total, records }
    }

    /// All records, oldest first.
    #[must_use]
    pub fn sorted(&self) -> Vec<ErrorRecord> {
        let mut records = self.snapshot().records;
        records.sort_by_key(|r| r.timestamp);
        records
    }

    /// The `n` newest records, newest first.
    ///
    /// Shards are appended by one worker each and are therefore already in
    /// time order, so only each shard's tail is copied.
    #[must_use]
    pub fn recent(&self, n: usize) -> Vec<ErrorRecord> {
        let mut tail: Vec<ErrorRecord> = Vec::new();
        for shard in &self.shards {
            let records = shard.lock();
            let start = records.len().saturating_sub(n);
            tail.extend(records[start..].iter().cloned());
        }
        tail.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        tail.truncate(n);
        tail
    }

    /// Record count per test name, descending by count then ascending by name.
    #[must_use]
    pub fn counts_by_test(&self) -> Vec<(&'static str, u64)> {
        count_by_test(&self.snapshot().records)
    }
}

/// Group `records` by test name, descending by count then ascending by name.
#[must_use]
pub fn count_by_test(records: &[ErrorRecord]) -> Vec<(&'static str, u64)> {
    let mut counts: Vec<(&'static str, u64)> = Vec::new();
    for record in records {
        match counts.iter_mut().find(|(name, _)| *name == record.test) {
            Some((_, count)) => *count += 1,
            None => counts.push((record.test, 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    counts
}
