//! The fixed per-segment test battery.
//!
//! [`run_battery`] drives one segment through T1..T10 in order and reports
//! progress to a [`Probe`]: the worker uses it to publish its activity,
//! byte counters and matrix ops while the battery runs.

use crate::cells::Cells;
use crate::cpu::matrix_burn;
use crate::patterns::{self, Fault, FaultSink, TestKind, BASIC_PATTERNS};
use rand::Rng;
use std::time::Duration;

/// Observer of a battery run. Faults arrive through [`FaultSink`].
pub trait Probe: FaultSink {
    /// `kind` is about to run with parameter `param` (pattern byte or 0).
    fn enter(&mut self, _kind: TestKind, _param: u8) {}

    /// `kind` finished after processing `bytes` logical bytes.
    fn leave(&mut self, _kind: TestKind, _bytes: u64) {}

    /// One matrix multiply completed.
    fn burned(&mut self) {}
}

impl Probe for Vec<Fault> {}

/// Tunables for one battery pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatterySettings {
    /// Solid Bits settle interval.
    pub settle: Duration,
    /// Matrix multiplies in the T10 step.
    pub cpu_burn_repeats: u32,
}

impl Default for BatterySettings {
    fn default() -> Self {
        Self {
            settle: crate::config::DEFAULT_SETTLE_INTERVAL,
            cpu_burn_repeats: crate::config::DEFAULT_CPU_BURN_REPEATS,
        }
    }
}

/// Totals for one battery pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatteryOutcome {
    /// Logical bytes processed.
    pub bytes_processed: u64,
    /// Mismatched bytes reported.
    pub faults: u64,
    /// Matrix multiplies run.
    pub matrix_ops: u64,
}

impl BatteryOutcome {
    /// Accumulate another outcome.
    pub fn absorb(&mut self, other: Self) {
        self.bytes_processed += other.bytes_processed;
        self.faults += other.faults;
        self.matrix_ops += other.matrix_ops;
    }
}

struct Counting<'a, P: ?Sized> {
    probe: &'a mut P,
    faults: u64,
}

impl<P: Probe + ?Sized> FaultSink for Counting<'_, P> {
    fn record(&mut self, fault: Fault) {
        self.faults += 1;
        self.probe.record(fault);
    }
}

/// Run the full battery over `cells`.
///
/// Order: (Pattern, Inverse) for each of [`BASIC_PATTERNS`], Walking Bit,
/// March C-, Random Page, Bandwidth, Walking Ones, Address, Solid Bits,
/// then `cpu_burn_repeats` matrix multiplies. Nothing is skipped on
/// mismatch.
pub fn run_battery<C, R, P>(
    cells: &mut C,
    rng: &mut R,
    settings: BatterySettings,
    probe: &mut P,
) -> BatteryOutcome
where
    C: Cells + ?Sized,
    R: Rng,
    P: Probe + ?Sized,
{
    let mut sink = Counting { probe, faults: 0 };
    let mut bytes = 0u64;

    macro_rules! step {
        ($kind:expr, $param:expr, $body:expr) => {{
            let kind = $kind;
            cells.begin(kind);
            sink.probe.enter(kind, $param);
            let n: u64 = $body;
            sink.probe.leave(kind, n);
            bytes += n;
        }};
    }

    for pattern in BASIC_PATTERNS {
        step!(
            TestKind::Pattern,
            pattern,
            patterns::pattern_write_verify(cells, pattern, &mut sink)
        );
        step!(
            TestKind::Inverse,
            pattern,
            patterns::inverse_pattern(cells, pattern, &mut sink)
        );
    }
    step!(TestKind::WalkingBit, 0, patterns::walking_bit(cells, &mut sink));
    step!(TestKind::MarchC, 0, patterns::march_c_minus(cells, &mut sink));
    step!(
        TestKind::RandomPage,
        0,
        patterns::random_page_access(cells, rng, &mut sink)
    );
    step!(TestKind::Bandwidth, 0, patterns::bandwidth_stress(cells));
    step!(TestKind::WalkingOnes, 0, patterns::walking_ones(cells, &mut sink));
    step!(TestKind::Address, 0, patterns::address_test(cells, &mut sink));
    step!(
        TestKind::SolidBits,
        0,
        patterns::solid_bits(cells, settings.settle, &mut sink)
    );

    let matrix_ops = cpu_burn(settings.cpu_burn_repeats, &mut *sink.probe);

    BatteryOutcome {
        bytes_processed: bytes,
        faults: sink.faults,
        matrix_ops,
    }
}

/// The T10 step on its own: `repeats` matrix multiplies.
pub fn cpu_burn<P: Probe + ?Sized>(repeats: u32, probe: &mut P) -> u64 {
    probe.enter(TestKind::CpuMatrix, 0);
    for _ in 0..repeats {
        std::hint::black_box(matrix_burn());
        probe.burned();
    }
    probe.leave(TestKind::CpuMatrix, 0);
    u64::from(repeats)
}
