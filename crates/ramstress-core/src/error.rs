//! Error types for ramstress-core.
//!
//! Data-integrity mismatches are never errors: they are recorded as
//! [`ErrorRecord`](crate::ErrorRecord)s. This type only covers startup,
//! allocation and I/O conditions.

use thiserror::Error;

/// Errors that can occur while preparing or driving a stress run.
#[derive(Debug, Error)]
pub enum Error {
    /// The system memory query failed.
    #[error("could not retrieve system memory info: {0}")]
    MemoryQuery(String),

    /// Not enough free memory to run after keeping the safety margin.
    #[error("not enough free RAM: {available} bytes available, at least {required} bytes required")]
    InsufficientMemory {
        /// Bytes currently available.
        available: u64,
        /// Bytes needed (safety margin plus minimum target).
        required: u64,
    },

    /// The allocator could not provide a segment.
    #[error("allocation of {requested} bytes failed")]
    AllocationFailed {
        /// Bytes requested for the segment.
        requested: usize,
    },

    /// Configuration is invalid.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// I/O error (thread spawn, filesystem).
    #[error("I/O error: {0}")]
    Io(String),

    /// A worker thread panicked.
    #[error("worker {worker} panicked")]
    WorkerPanicked {
        /// Id of the worker.
        worker: usize,
    },

    /// Dashboard rendering failed. Swallowed by the reporter loop.
    #[error("render failed: {0}")]
    Render(String),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
