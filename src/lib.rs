//! # ramstress
//!
//! RAM and CPU stress tester: fills free memory with page-aligned segments
//! and runs march-style integrity patterns over them on every hardware
//! thread until stopped.
//!
//! This is the workspace root crate that re-exports the engine.
//! For direct usage, depend on individual sub-crates:
//!
//! - [`ramstress-core`] - Allocator, pattern battery, workers, reporting
//! - [`ramstress-cli`] - CLI tool (`ramstress` binary)

pub use ramstress_core::*;

pub mod verification_specs;
