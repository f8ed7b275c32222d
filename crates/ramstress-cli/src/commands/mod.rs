//! CLI command implementations.

mod benchmark;
mod info;
mod run;

pub use benchmark::{benchmark, BenchmarkArgs};
pub use info::{info, InfoArgs};
pub use run::{run, RunArgs};
