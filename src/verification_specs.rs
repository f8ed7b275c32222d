//! Sizing and accounting contracts for ramstress.
//!
//! Design-by-contract specifications using Verus-style pre/postconditions.
//! The engine implements these rules; the workspace property tests check
//! the engine against them.
//!
//! # Examples
//!
//! ```
//! use ramstress::verification_specs::sizing_contracts;
//! assert_eq!(sizing_contracts::plan_target(8 << 30, 500 << 20, None), Some((8 << 30) - (500 << 20)));
//! assert_eq!(sizing_contracts::plan_target(100, 500, None), None);
//! ```
//!
//! ```
//! use ramstress::verification_specs::accounting_contracts;
//! assert!(accounting_contracts::is_fault(0xAA, 0xAB));
//! assert!(!accounting_contracts::is_fault(0xAA, 0xAA));
//! ```

/// Allocation sizing invariants
///
/// #[requires(block_size > 0 && owners > 0)]
/// #[ensures(sum(segment_lengths) == target)]
/// #[ensures(forall k: segment_lengths[k] <= block_size)]
/// #[ensures(forall k: owner(k) == k % owners)]
/// #[invariant(allocated <= target)]
/// #[decreases(target - allocated)]
pub mod sizing_contracts {
    /// #[ensures(result.is_some() ==> result.unwrap() + margin <= available)]
    /// #[ensures(result.is_some() ==> result.unwrap() > 0)]
    /// #[ensures(cap.is_some() && result.is_some() ==> result.unwrap() <= cap.unwrap())]
    /// #[ensures(available <= margin ==> result.is_none())]
    pub fn plan_target(available: u64, margin: u64, cap: Option<u64>) -> Option<u64> {
        let target = available.checked_sub(margin)?;
        let target = cap.map_or(target, |c| target.min(c));
        (target > 0).then_some(target)
    }

    /// #[requires(block_size > 0 && remaining > 0)]
    /// #[ensures(result > 0 && result <= block_size)]
    /// #[ensures(result as u64 <= remaining)]
    pub fn next_block(remaining: u64, block_size: usize) -> usize {
        usize::try_from(remaining).map_or(block_size, |r| r.min(block_size))
    }

    /// Segment lengths the allocator requests for `target` bytes.
    ///
    /// #[requires(block_size > 0)]
    /// #[ensures(result.iter().sum() == target)]
    pub fn segment_lengths(target: u64, block_size: usize) -> Vec<usize> {
        let mut lengths = Vec::new();
        let mut allocated = 0u64;
        while allocated < target {
            let len = next_block(target - allocated, block_size);
            lengths.push(len);
            allocated += len as u64;
        }
        lengths
    }

    /// #[requires(owners > 0)]
    /// #[ensures(result < owners)]
    pub fn owner_of(segment: usize, owners: usize) -> usize {
        segment % owners
    }
}

/// Counter and error-log accounting invariants
///
/// #[invariant(log.total == log.records.len())]
/// #[invariant(sum(worker.errors) == log.total)]
/// #[invariant(forall r in log: r.expected != r.actual)]
/// #[invariant(cycles only increase, by one per complete pass)]
pub mod accounting_contracts {
    /// #[ensures(result == (expected ^ actual != 0))]
    pub fn is_fault(expected: u8, actual: u8) -> bool {
        expected ^ actual != 0
    }

    /// Logical bytes one battery pass reports for a segment of `len` bytes,
    /// excluding Random Page and the CPU burn.
    ///
    /// #[ensures(result == len * (6 * (2 + 4) + 16 + 6 + 1 + 16 + 2 + 4))]
    pub fn battery_bytes(len: u64) -> Option<u64> {
        // Six patterns, each Pattern x2 and Inverse x4, then Walking Bit x16,
        // March C- x6, Bandwidth x1, Walking Ones x16, Address x2, Solid x4.
        len.checked_mul(6 * (2 + 4) + 16 + 6 + 1 + 16 + 2 + 4)
    }

    /// #[requires(elapsed_secs.is_finite() && elapsed_secs >= 0.0)]
    /// #[ensures(elapsed_secs == 0.0 ==> result == 0.0)]
    /// #[ensures(result >= 0.0)]
    #[allow(clippy::cast_precision_loss)]
    pub fn throughput_gbps(bytes: u64, elapsed_secs: f64) -> f64 {
        if elapsed_secs > 0.0 {
            bytes as f64 / (1u64 << 30) as f64 / elapsed_secs
        } else {
            0.0
        }
    }
}


// ─── Kani Proof Stubs ────────────────────────────────────────────
// Model-checking proofs for critical invariants
// Requires: cargo install --locked kani-verifier

#[cfg(kani)]
mod kani_proofs {
    use super::*;

    #[kani::proof]
    fn verify_target_respects_margin() {
        let available: u64 = kani::any();
        let margin: u64 = kani::any();
        if let Some(target) = sizing_contracts::plan_target(available, margin, None) {
            assert!(target + margin <= available);
        }
    }

    #[kani::proof]
    fn verify_next_block_bounds() {
        let remaining: u64 = kani::any();
        let block: usize = kani::any();
        kani::assume(remaining > 0 && block > 0);
        let len = sizing_contracts::next_block(remaining, block);
        assert!(len > 0 && len <= block && len as u64 <= remaining);
    }

    #[kani::proof]
    fn verify_owner_in_range() {
        let segment: usize = kani::any();
        let owners: usize = kani::any();
        kani::assume(owners > 0);
        assert!(sizing_contracts::owner_of(segment, owners) < owners);
    }

    #[kani::proof]
    fn verify_fault_iff_diff() {
        let expected: u8 = kani::any();
        let actual: u8 = kani::any();
        assert_eq!(accounting_contracts::is_fault(expected, actual), expected != actual);
    }
}
