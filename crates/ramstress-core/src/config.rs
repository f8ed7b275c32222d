//! Run configuration.

use crate::units::MIB;
use crate::{Error, Result};
use std::time::Duration;

/// Default segment capacity (256 MiB).
pub const DEFAULT_BLOCK_SIZE: usize = 256 * 1024 * 1024;

/// Free memory left untouched by the allocator (500 MiB).
pub const DEFAULT_SAFETY_MARGIN: u64 = 500 * MIB;

/// Pause between fill and verify in the Solid Bits test.
pub const DEFAULT_SETTLE_INTERVAL: Duration = Duration::from_millis(100);

/// Matrix multiplies run after each segment's memory tests.
pub const DEFAULT_CPU_BURN_REPEATS: u32 = 5;

/// Dashboard refresh cadence.
pub const DEFAULT_REPORT_TICK: Duration = Duration::from_millis(250);

/// Configuration for a stress run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StressConfig {
    /// Capacity of each allocated segment.
    pub block_size: usize,
    /// Bytes of available memory never allocated.
    pub safety_margin: u64,
    /// Smallest target worth running; below this startup fails.
    pub min_target: u64,
    /// Optional cap on the allocation target.
    pub max_bytes: Option<u64>,
    /// Worker thread count (also the segment fan-out).
    pub workers: usize,
    /// Solid Bits settle interval.
    pub settle_interval: Duration,
    /// CPU burn repetitions after each segment.
    pub cpu_burn_repeats: u32,
    /// Stop each worker after this many completed cycles.
    pub max_cycles: Option<u64>,
    /// Stop the run after this much wall-clock time.
    pub time_limit: Option<Duration>,
    /// Reporter refresh interval.
    pub report_tick: Duration,
    /// Fixed seed for the Random Page test (entropy when `None`).
    pub seed: Option<u64>,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            safety_margin: DEFAULT_SAFETY_MARGIN,
            min_target: 1,
            max_bytes: None,
            workers: default_workers(),
            settle_interval: DEFAULT_SETTLE_INTERVAL,
            cpu_burn_repeats: DEFAULT_CPU_BURN_REPEATS,
            max_cycles: None,
            time_limit: None,
            report_tick: DEFAULT_REPORT_TICK,
            seed: None,
        }
    }
}

impl StressConfig {
    /// Check the configuration for values the engine cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] describing the first bad field.
    pub fn validate(&self) -> Result<()> {
        if self.block_size == 0 {
            return Err(Error::InvalidConfig("block size must be non-zero".to_string()));
        }
        if self.workers == 0 {
            return Err(Error::InvalidConfig("worker count must be non-zero".to_string()));
        }
        if self.report_tick.is_zero() {
            return Err(Error::InvalidConfig("report tick must be non-zero".to_string()));
        }
        if self.max_bytes == Some(0) {
            return Err(Error::InvalidConfig("max bytes must be non-zero".to_string()));
        }
        Ok(())
    }
}

/// Number of hardware threads, falling back to one.
#[must_use]
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(std::num::NonZeroUsize::get)
        .unwrap_or(1)
}
