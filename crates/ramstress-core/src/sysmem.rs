//! Physical memory inquiry.
//!
//! Trait-based so the allocation plan can be tested without depending on
//! the machine it runs on.

use crate::{Error, Result};
use serde::Serialize;

/// Snapshot of system memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MemoryStatus {
    /// Total physical memory in bytes.
    pub total: u64,
    /// Memory available for new allocations in bytes.
    pub available: u64,
    /// Percentage of physical memory in use.
    pub load_percent: u32,
}

impl MemoryStatus {
    /// Build a status, deriving the load percentage.
    #[must_use]
    pub fn new(total: u64, available: u64) -> Self {
        let available = available.min(total);
        let load_percent = if total == 0 {
            0
        } else {
            ((total - available) as u128 * 100 / total as u128) as u32
        };
        Self {
            total,
            available,
            load_percent,
        }
    }

    /// Bytes in use.
    #[must_use]
    pub fn used(&self) -> u64 {
        self.total.saturating_sub(self.available)
    }
}

/// Source of [`MemoryStatus`].
pub trait SystemMemory {
    /// Query current memory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MemoryQuery`] if the platform cannot report it.
    fn query(&self) -> Result<MemoryStatus>;
}

/// Fixed answer, for tests and dry runs.
#[derive(Debug, Clone, Copy)]
pub struct FixedMemory(pub MemoryStatus);

impl SystemMemory for FixedMemory {
    fn query(&self) -> Result<MemoryStatus> {
        Ok(self.0)
    }
}

/// Reads `/proc/meminfo`.
#[derive(Debug, Clone)]
pub struct ProcMeminfo {
    path: std::path::PathBuf,
}

impl Default for ProcMeminfo {
    fn default() -> Self {
        Self {
            path: "/proc/meminfo".into(),
        }
    }
}

impl ProcMeminfo {
    /// Reader for the standard location.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reader for another meminfo-format file.
    pub fn with_path(path: impl Into<std::path::PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SystemMemory for ProcMeminfo {
    fn query(&self) -> Result<MemoryStatus> {
        let text = std::fs::read_to_string(&self.path).map_err(|e| {
            Error::MemoryQuery(format!("failed to read {}: {e}", self.path.display()))
        })?;
        parse_meminfo(&text)
    }
}

/// Parse `MemTotal` and `MemAvailable` (kB) from meminfo text.
///
/// Kernels older than 3.14 lack `MemAvailable`; `MemFree + Buffers +
/// Cached` stands in for it there.
///
/// # Errors
///
/// Returns [`Error::MemoryQuery`] if `MemTotal` is missing or malformed.
pub fn parse_meminfo(text: &str) -> Result<MemoryStatus> {
    let mut total = None;
    let mut available = None;
    let mut fallback = 0u64;

    for line in text.lines() {
        let mut parts = line.split_whitespace();
        let (Some(key), Some(value)) = (parts.next(), parts.next()) else {
            continue;
        };
        let parse = || {
            value
                .parse::<u64>()
                .map(|kb| kb * 1024)
                .map_err(|_| Error::MemoryQuery(format!("invalid {key} value: {value}")))
        };
        match key {
            "MemTotal:" => total = Some(parse()?),
            "MemAvailable:" => available = Some(parse()?),
            "MemFree:" | "Buffers:" | "Cached:" => fallback += parse()?,
            _ => {}
        }
    }

    let total = total.ok_or_else(|| Error::MemoryQuery("MemTotal not found".to_string()))?;
    Ok(MemoryStatus::new(total, available.unwrap_or(fallback)))
}

/// Portable probe backed by the `sysinfo` crate.
#[cfg(not(target_os = "linux"))]
#[derive(Debug, Default)]
pub struct SysinfoMemory;

#[cfg(not(target_os = "linux"))]
impl SystemMemory for SysinfoMemory {
    fn query(&self) -> Result<MemoryStatus> {
        let mut sys = sysinfo::System::new();
        sys.refresh_memory();
        let total = sys.total_memory();
        if total == 0 {
            return Err(Error::MemoryQuery("system reported no memory".to_string()));
        }
        Ok(MemoryStatus::new(total, sys.available_memory()))
    }
}

/// The probe for the current target.
#[must_use]
pub fn default_probe() -> Box<dyn SystemMemory> {
    #[cfg(target_os = "linux")]
    {
        Box::new(ProcMeminfo::new())
    }
    #[cfg(not(target_os = "linux"))]
    {
        Box::new(SysinfoMemory)
    }
}
