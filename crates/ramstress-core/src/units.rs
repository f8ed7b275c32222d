//! Size and duration formatting shared by the dashboard and reports.

use crate::{Error, Result};
use std::time::Duration;

/// One kibibyte.
pub const KIB: u64 = 1024;
/// One mebibyte.
pub const MIB: u64 = 1024 * KIB;
/// One gibibyte.
pub const GIB: u64 = 1024 * MIB;

/// Parse size string (e.g., "4G", "512M", "4096") to bytes.
///
/// # Errors
///
/// Returns [`Error::InvalidConfig`] for malformed numbers or overflow.
pub fn parse_size(size: &str) -> Result<u64> {
    let size = size.trim().to_uppercase();
    let size = size.strip_suffix('B').unwrap_or(&size);
    let size = size.strip_suffix('I').unwrap_or(size);

    let (num_str, multiplier) = if let Some(n) = size.strip_suffix('K') {
        (n, KIB)
    } else if let Some(n) = size.strip_suffix('M') {
        (n, MIB)
    } else if let Some(n) = size.strip_suffix('G') {
        (n, GIB)
    } else if let Some(n) = size.strip_suffix('T') {
        (n, GIB * 1024)
    } else {
        (size, 1u64)
    };

    let num: u64 = num_str
        .trim()
        .parse()
        .map_err(|_| Error::InvalidConfig(format!("invalid size number: {num_str}")))?;
    num.checked_mul(multiplier)
        .ok_or_else(|| Error::InvalidConfig(format!("size overflows u64: {num_str}")))
}

/// Format bytes as human-readable string.
#[must_use]
pub fn format_size(bytes: u64) -> String {
    if bytes >= GIB {
        format!("{:.1}G", bytes as f64 / GIB as f64)
    } else if bytes >= MIB {
        format!("{:.1}M", bytes as f64 / MIB as f64)
    } else if bytes >= KIB {
        format!("{:.1}K", bytes as f64 / KIB as f64)
    } else if bytes > 0 {
        format!("{bytes}B")
    } else {
        "0".to_string()
    }
}

/// Bytes expressed in GiB.
#[must_use]
pub fn gib(bytes: u64) -> f64 {
    bytes as f64 / GIB as f64
}

/// `hh:mm:ss`, hours not wrapped at 24.
#[must_use]
pub fn format_hms(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
}

/// Group decimal digits by thousands: `1234567` -> `1,234,567`.
#[must_use]
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Byte rendered as eight binary digits.
#[must_use]
pub fn binary8(value: u8) -> String {
    format!("{value:08b}")
}
