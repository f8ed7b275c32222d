//! RAM and CPU stress engine.
//!
//! Allocates most of the available physical memory as page-aligned
//! segments, splits them across one worker per hardware thread, and runs a
//! fixed battery of memory-integrity patterns (fill/verify, walking bits,
//! March C-, address-in-address, retention) interleaved with a dense
//! matrix multiply. Mismatches become [`ErrorRecord`]s in a shared
//! [`ErrorLog`]; a [`Reporter`] renders live [`Snapshot`]s and the run ends
//! with a [`FinalReport`].
//!
//! # Example
//!
//! ```
//! use ramstress_core::patterns::{march_c_minus, Fault};
//!
//! let mut memory = vec![0u8; 4096];
//! let mut faults: Vec<Fault> = Vec::new();
//! let processed = march_c_minus(&mut memory, &mut faults);
//!
//! assert!(faults.is_empty());
//! assert_eq!(processed, 4096 * 6);
//! ```

#![deny(missing_docs)]
#![deny(clippy::panic)]
#![cfg_attr(test, allow(clippy::panic))]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]

pub mod allocator;
pub mod battery;
pub mod benchmark;
pub mod cells;
pub mod config;
pub mod cpu;
mod error;
pub mod error_log;
pub mod orchestrator;
pub mod patterns;
pub mod report;
pub mod reporter;
pub mod segment;
pub mod sysmem;
pub mod telemetry;
pub mod units;
pub mod worker;

pub use allocator::{Allocation, AllocationPlan, AllocationProgress, BlockAllocator};
pub use battery::{run_battery, BatteryOutcome, BatterySettings, Probe};
pub use cells::Cells;
pub use config::StressConfig;
pub use error::{Error, Result};
pub use error_log::{ErrorLog, ErrorRecord};
pub use orchestrator::{Orchestrator, RunSummary};
pub use patterns::{Fault, FaultSink, TestKind};
pub use report::{report_file_name, FailureReport, FinalReport, SuccessSummary};
pub use reporter::{Dashboard, Reporter, Snapshot, WorkerRow};
pub use segment::{Segment, PAGE_SIZE};
pub use sysmem::{default_probe, MemoryStatus, SystemMemory};
pub use telemetry::{Activity, CancelToken, StressContext, WorkerTelemetry};
pub use worker::{Worker, WorkerReport};
