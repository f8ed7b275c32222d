//! Block allocator: turns available memory into per-worker segment lists.

use crate::cells::Cells;
use crate::config::StressConfig;
use crate::segment::Segment;
use crate::sysmem::MemoryStatus;
use crate::units::{format_size, GIB};
use crate::{Error, Result};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Progress is reported each time this many bytes have been allocated.
pub const PROGRESS_STEP: u64 = 5 * GIB;

/// How much to allocate and how to split it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocationPlan {
    /// Available memory at planning time.
    pub available: u64,
    /// Bytes left free.
    pub safety_margin: u64,
    /// Bytes to allocate.
    pub target: u64,
    /// Segment capacity.
    pub block_size: usize,
    /// Number of segment owners (workers).
    pub owners: usize,
}

impl AllocationPlan {
    /// Plan `available - safety_margin` bytes, capped by `config.max_bytes`.
    ///
    /// # Errors
    ///
    /// [`Error::InsufficientMemory`] when the target would fall below
    /// `config.min_target`; [`Error::InvalidConfig`] for a bad config.
    pub fn from_memory(status: &MemoryStatus, config: &StressConfig) -> Result<Self> {
        config.validate()?;

        let insufficient = || Error::InsufficientMemory {
            available: status.available,
            required: config.safety_margin.saturating_add(config.min_target),
        };

        let mut target = status
            .available
            .checked_sub(config.safety_margin)
            .ok_or_else(insufficient)?;
        if let Some(max) = config.max_bytes {
            target = target.min(max);
        }
        if target == 0 || target < config.min_target {
            return Err(insufficient());
        }

        Ok(Self {
            available: status.available,
            safety_margin: config.safety_margin,
            target,
            block_size: config.block_size,
            owners: config.workers,
        })
    }

    /// A plan for exactly `target` bytes, bypassing the memory query.
    #[must_use]
    pub fn fixed(target: u64, block_size: usize, owners: usize) -> Self {
        Self {
            available: target,
            safety_margin: 0,
            target,
            block_size,
            owners,
        }
    }
}

/// Allocation progress, reported every [`PROGRESS_STEP`] and at the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocationProgress {
    /// Bytes allocated so far.
    pub allocated: u64,
    /// Planned total.
    pub target: u64,
}

/// Segments split across owners.
#[derive(Debug)]
pub struct Allocation<C = Segment> {
    /// `per_owner[i]` is worker `i`'s segment list.
    pub per_owner: Vec<Vec<C>>,
    /// Bytes actually allocated.
    pub allocated: u64,
    /// Planned bytes.
    pub target: u64,
    /// True if the allocator ran out before reaching the target.
    pub exhausted: bool,
    /// Time spent allocating.
    pub elapsed: Duration,
}

impl<C: Cells> Allocation<C> {
    /// Wrap pre-built segment lists.
    #[must_use]
    pub fn from_parts(per_owner: Vec<Vec<C>>) -> Self {
        let allocated = per_owner
            .iter()
            .flatten()
            .map(|c| c.len() as u64)
            .sum();
        Self {
            per_owner,
            allocated,
            target: allocated,
            exhausted: false,
            elapsed: Duration::ZERO,
        }
    }

    /// Number of owners.
    #[must_use]
    pub fn owners(&self) -> usize {
        self.per_owner.len()
    }

    /// Total number of segments.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.per_owner.iter().map(Vec::len).sum()
    }

    /// Bytes held by each owner.
    #[must_use]
    pub fn owner_bytes(&self) -> Vec<u64> {
        self.per_owner
            .iter()
            .map(|segments| segments.iter().map(|c| c.len() as u64).sum())
            .collect()
    }
}

/// Fills an [`AllocationPlan`] block by block.
#[derive(Debug, Clone, Copy)]
pub struct BlockAllocator {
    plan: AllocationPlan,
}

impl BlockAllocator {
    /// Allocator for `plan`.
    #[must_use]
    pub fn new(plan: AllocationPlan) -> Self {
        Self { plan }
    }

    /// Allocate real, page-aligned [`Segment`]s.
    ///
    /// # Errors
    ///
    /// See [`allocate_with`](Self::allocate_with).
    pub fn allocate(&self) -> Result<Allocation> {
        self.allocate_with(Segment::zeroed, |p| {
            info!(
                allocated = p.allocated,
                target = p.target,
                "{} / {} allocated",
                format_size(p.allocated),
                format_size(p.target)
            );
        })
    }

    /// Allocate with a custom segment source.
    ///
    /// Segments of `min(remaining, block_size)` bytes are requested until
    /// the target is reached and handed to owners round-robin. A source
    /// returning [`Error::AllocationFailed`] ends the loop early: what was
    /// allocated is kept and the result is marked `exhausted`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidConfig`] for zero owners or a zero block size; any
    /// source error other than `AllocationFailed`.
    pub fn allocate_with<C, F, P>(&self, mut source: F, mut progress: P) -> Result<Allocation<C>>
    where
        F: FnMut(usize) -> Result<C>,
        P: FnMut(AllocationProgress),
    {
        let plan = self.plan;
        if plan.owners == 0 {
            return Err(Error::InvalidConfig("at least one owner is required".to_string()));
        }
        if plan.block_size == 0 {
            return Err(Error::InvalidConfig("block size must be non-zero".to_string()));
        }

        let start = Instant::now();
        let mut per_owner: Vec<Vec<C>> = (0..plan.owners).map(|_| Vec::new()).collect();
        let mut allocated = 0u64;
        let mut exhausted = false;
        let mut owner = 0;

        while allocated < plan.target {
            let len = (plan.target - allocated).min(plan.block_size as u64) as usize;
            let segment = match source(len) {
                Ok(segment) => segment,
                Err(Error::AllocationFailed { requested }) => {
                    warn!(
                        requested,
                        allocated,
                        target = plan.target,
                        "could not allocate full target, continuing with {}",
                        format_size(allocated)
                    );
                    exhausted = true;
                    break;
                }
                Err(e) => return Err(e),
            };

            per_owner[owner].push(segment);
            let before = allocated;
            allocated += len as u64;

            if allocated / PROGRESS_STEP > before / PROGRESS_STEP || allocated >= plan.target {
                progress(AllocationProgress {
                    allocated,
                    target: plan.target,
                });
            }
            owner = (owner + 1) % plan.owners;
        }

        Ok(Allocation {
            per_owner,
            allocated,
            target: plan.target,
            exhausted,
            elapsed: start.elapsed(),
        })
    }
}
