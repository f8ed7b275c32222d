//! Ctrl+C handling.
//!
//! Every interrupt only cancels the run. Workers finish their current step
//! and the final report, including any error report, is still produced.

use anyhow::{Context, Result};
use ramstress_core::CancelToken;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{info, warn};

/// What an interrupt did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    /// First signal: the run was cancelled.
    Graceful,
    /// Later signal while workers are still winding down; nothing more to do.
    Repeated(u64),
}

/// Handle one interrupt against `token`.
pub fn on_interrupt(presses: &AtomicU64, token: &CancelToken) -> Interrupt {
    token.cancel();
    match presses.fetch_add(1, Ordering::SeqCst) {
        0 => Interrupt::Graceful,
        n => Interrupt::Repeated(n + 1),
    }
}

/// Install the process-wide SIGINT/SIGTERM handler for `token`.
pub fn install(token: CancelToken) -> Result<()> {
    let presses = AtomicU64::new(0);
    ctrlc::set_handler(move || match on_interrupt(&presses, &token) {
        Interrupt::Graceful => {
            info!("Received shutdown signal, stopping workers");
        }
        Interrupt::Repeated(count) => {
            warn!(count, "Still stopping, waiting for workers to finish their current segment");
        }
    })
    .context("could not install the interrupt handler")
}
