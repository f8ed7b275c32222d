//! Memory integrity test patterns.
//!
//! Each test writes a known pattern over a whole [`Cells`] surface and reads
//! it back, reporting one [`Fault`] per mismatched byte to a [`FaultSink`].
//! A pass never stops at the first mismatch. Every test returns the number
//! of logical bytes it processed, used for throughput display only.
//!
//! ## Battery order (per segment)
//!
//! | Step | Test            | Bytes processed      |
//! |------|-----------------|----------------------|
//! | T1   | Pattern         | `len * 2` per value  |
//! | T2   | Inverse         | `len * 4` per value  |
//! | T3   | Walking Bit     | `len * 8 * 2`        |
//! | T4   | March C-        | `len * 6`            |
//! | T5   | Random Page     | `len / 2048`         |
//! | T6   | Bandwidth       | `len`                |
//! | T7   | Walking Ones    | `len * 8 * 2`        |
//! | T8   | Address         | `len * 2`            |
//! | T9   | Solid Bits      | `len * 4`            |
//! | T10  | CPU Matrix      | n/a                  |
//!
//! T1 and T2 alternate over [`BASIC_PATTERNS`].

use crate::cells::Cells;
use crate::segment::PAGE_SIZE;
use rand::Rng;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Fill values used by the Pattern and Inverse tests.
pub const BASIC_PATTERNS: [u8; 6] = [0x00, 0xFF, 0xAA, 0x55, 0xCC, 0x33];

/// Single set bit walking through a byte.
pub const WALKING_BITS: [u8; 8] = [0x01, 0x02, 0x04, 0x08, 0x10, 0x20, 0x40, 0x80];

/// Single clear bit walking through a byte.
pub const WALKING_ONES: [u8; 8] = [0xFE, 0xFD, 0xFB, 0xF7, 0xEF, 0xDF, 0xBF, 0x7F];

/// Test names as recorded in error records and grouped in reports.
pub mod names {
    /// Pattern write/verify.
    pub const PATTERN: &str = "Pattern Test";
    /// Inverse test, first (pattern) half.
    pub const INVERSE_1: &str = "Inverse-1";
    /// Inverse test, second (complement) half.
    pub const INVERSE_2: &str = "Inverse-2";
    /// Walking bit.
    pub const WALKING_BIT: &str = "Walking Bit";
    /// March C- phases 2 through 6 (phase 1 only writes).
    pub const MARCH: [&str; 5] = [
        "March C- S2",
        "March C- S3",
        "March C- S4",
        "March C- S5",
        "March C- S6",
    ];
    /// Random page access.
    pub const RANDOM_PAGE: &str = "Random Page";
    /// Walking ones.
    pub const WALKING_ONES: &str = "Walking Ones";
    /// Address-in-address.
    pub const ADDRESS: &str = "Address Test";
    /// Solid bits, all-ones retention.
    pub const SOLID_ONES: &str = "Solid-1 Decay";
    /// Solid bits, all-zeros retention.
    pub const SOLID_ZEROS: &str = "Solid-0 Decay";
}

/// Context attached to retention mismatches.
pub const REFRESH_ERROR: &str = "REFRESH ERROR!";

/// One step of the per-segment battery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TestKind {
    /// T1: fill with a value and verify.
    Pattern,
    /// T2: fill/verify a value, then its complement.
    Inverse,
    /// T3: single set bit values.
    WalkingBit,
    /// T4: six-phase March C-.
    MarchC,
    /// T5: one random byte per page.
    RandomPage,
    /// T6: half-over-half copy.
    Bandwidth,
    /// T7: single clear bit values.
    WalkingOnes,
    /// T8: each byte holds its low address bits.
    Address,
    /// T9: fill, wait, verify (retention).
    SolidBits,
    /// T10: dense matrix multiply.
    CpuMatrix,
}

impl TestKind {
    /// Battery steps in execution order.
    pub const ALL: [Self; 10] = [
        Self::Pattern,
        Self::Inverse,
        Self::WalkingBit,
        Self::MarchC,
        Self::RandomPage,
        Self::Bandwidth,
        Self::WalkingOnes,
        Self::Address,
        Self::SolidBits,
        Self::CpuMatrix,
    ];

    /// Zero-based position in [`TestKind::ALL`].
    #[must_use]
    pub fn index(self) -> u8 {
        match self {
            Self::Pattern => 0,
            Self::Inverse => 1,
            Self::WalkingBit => 2,
            Self::MarchC => 3,
            Self::RandomPage => 4,
            Self::Bandwidth => 5,
            Self::WalkingOnes => 6,
            Self::Address => 7,
            Self::SolidBits => 8,
            Self::CpuMatrix => 9,
        }
    }

    /// Inverse of [`TestKind::index`].
    #[must_use]
    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(usize::from(index)).copied()
    }

    /// Short tag shown on the dashboard, `[T1]` through `[T10]`.
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::Pattern => "[T1]",
            Self::Inverse => "[T2]",
            Self::WalkingBit => "[T3]",
            Self::MarchC => "[T4]",
            Self::RandomPage => "[T5]",
            Self::Bandwidth => "[T6]",
            Self::WalkingOnes => "[T7]",
            Self::Address => "[T8]",
            Self::SolidBits => "[T9]",
            Self::CpuMatrix => "[T10]",
        }
    }

    /// Human-readable name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Pattern => "Pattern",
            Self::Inverse => "Inverse",
            Self::WalkingBit => "Walking Bit",
            Self::MarchC => "March C- (Full)",
            Self::RandomPage => "Random Page",
            Self::Bandwidth => "Bandwidth",
            Self::WalkingOnes => "Walking Ones",
            Self::Address => "Address Test",
            Self::SolidBits => "Solid Bits",
            Self::CpuMatrix => "CPU Matrix Stress",
        }
    }

    /// True for steps parameterised by a pattern byte.
    #[must_use]
    pub fn takes_pattern(self) -> bool {
        matches!(self, Self::Pattern | Self::Inverse)
    }
}

impl fmt::Display for TestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.tag(), self.name())
    }
}

/// A single byte mismatch found by a test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    /// Test (or phase) name.
    pub test: &'static str,
    /// Byte offset within the segment.
    pub address: u64,
    /// Value the test wrote.
    pub expected: u8,
    /// Value read back.
    pub actual: u8,
    /// Sub-phase or page detail.
    pub context: Option<String>,
}

impl Fault {
    /// Bits that differ.
    #[must_use]
    pub fn diff_mask(&self) -> u8 {
        self.expected ^ self.actual
    }
}

/// Receiver for mismatches.
pub trait FaultSink {
    /// Record one mismatch. Must not abort the test.
    fn record(&mut self, fault: Fault);
}

impl FaultSink for Vec<Fault> {
    fn record(&mut self, fault: Fault) {
        self.push(fault);
    }
}

/// Verify every byte equals `expected`, scanning ascending.
fn verify_ascending<C, S, F>(cells: &C, expected: u8, test: &'static str, sink: &mut S, context: F)
where
    C: Cells + ?Sized,
    S: FaultSink + ?Sized,
    F: Fn(usize) -> Option<String>,
{
    for offset in 0..cells.len() {
        let actual = cells.read(offset);
        if actual != expected {
            sink.record(Fault {
                test,
                address: offset as u64,
                expected,
                actual,
                context: context(offset),
            });
        }
    }
}

fn no_context(_: usize) -> Option<String> {
    None
}

fn len_u64<C: Cells + ?Sized>(cells: &C) -> u64 {
    cells.len() as u64
}

/// T1: fill with `pattern`, verify.
pub fn pattern_write_verify<C, S>(cells: &mut C, pattern: u8, sink: &mut S) -> u64
where
    C: Cells + ?Sized,
    S: FaultSink + ?Sized,
{
    cells.fill(pattern);
    verify_ascending(cells, pattern, names::PATTERN, sink, no_context);
    len_u64(cells) * 2
}

/// T2: fill/verify with `pattern`, then with `!pattern`.
pub fn inverse_pattern<C, S>(cells: &mut C, pattern: u8, sink: &mut S) -> u64
where
    C: Cells + ?Sized,
    S: FaultSink + ?Sized,
{
    cells.fill(pattern);
    verify_ascending(cells, pattern, names::INVERSE_1, sink, no_context);

    let inverse = !pattern;
    cells.fill(inverse);
    verify_ascending(cells, inverse, names::INVERSE_2, sink, no_context);

    len_u64(cells) * 4
}

/// T3: fill/verify each of [`WALKING_BITS`].
pub fn walking_bit<C, S>(cells: &mut C, sink: &mut S) -> u64
where
    C: Cells + ?Sized,
    S: FaultSink + ?Sized,
{
    for bit in WALKING_BITS {
        cells.fill(bit);
        verify_ascending(cells, bit, names::WALKING_BIT, sink, |_| {
            Some(format!("Bit: 0x{bit:02X}"))
        });
    }
    len_u64(cells) * WALKING_BITS.len() as u64 * 2
}

/// T4: March C-.
///
/// 1. ⇑ w0
/// 2. ⇑ r0 w1
/// 3. ⇑ r1 w0
/// 4. ⇓ r0 w1
/// 5. ⇓ r1 w0
/// 6. ⇓ r0
///
/// Phase order and direction are fixed: together they expose coupling and
/// address-decoder faults that plain fill/verify cannot.
pub fn march_c_minus<C, S>(cells: &mut C, sink: &mut S) -> u64
where
    C: Cells + ?Sized,
    S: FaultSink + ?Sized,
{
    const ZERO: u8 = 0x00;
    const ONE: u8 = 0xFF;
    let len = cells.len();

    cells.fill(ZERO);

    for offset in 0..len {
        march_element(cells, offset, ZERO, Some(ONE), names::MARCH[0], sink);
    }
    for offset in 0..len {
        march_element(cells, offset, ONE, Some(ZERO), names::MARCH[1], sink);
    }
    for offset in (0..len).rev() {
        march_element(cells, offset, ZERO, Some(ONE), names::MARCH[2], sink);
    }
    for offset in (0..len).rev() {
        march_element(cells, offset, ONE, Some(ZERO), names::MARCH[3], sink);
    }
    for offset in (0..len).rev() {
        march_element(cells, offset, ZERO, None, names::MARCH[4], sink);
    }

    len as u64 * 6
}

#[inline]
fn march_element<C, S>(
    cells: &mut C,
    offset: usize,
    expect: u8,
    then_write: Option<u8>,
    test: &'static str,
    sink: &mut S,
) where
    C: Cells + ?Sized,
    S: FaultSink + ?Sized,
{
    let actual = cells.read(offset);
    if actual != expect {
        sink.record(Fault {
            test,
            address: offset as u64,
            expected: expect,
            actual,
            context: None,
        });
    }
    if let Some(value) = then_write {
        cells.write(offset, value);
    }
}

/// T5: write and re-read one random byte at the start of every page.
pub fn random_page_access<C, R, S>(cells: &mut C, rng: &mut R, sink: &mut S) -> u64
where
    C: Cells + ?Sized,
    R: Rng,
    S: FaultSink + ?Sized,
{
    for offset in (0..cells.len()).step_by(PAGE_SIZE) {
        let value: u8 = rng.gen();
        cells.write(offset, value);
        let actual = cells.read(offset);
        if actual != value {
            sink.record(Fault {
                test: names::RANDOM_PAGE,
                address: offset as u64,
                expected: value,
                actual,
                context: Some(format!("Page: {}", offset / PAGE_SIZE)),
            });
        }
    }
    len_u64(cells) / 2048
}

/// T6: copy the lower half over the upper half. No verification.
pub fn bandwidth_stress<C>(cells: &mut C) -> u64
where
    C: Cells + ?Sized,
{
    cells.copy_lower_half_to_upper();
    len_u64(cells)
}

/// T7: fill/verify each of [`WALKING_ONES`].
pub fn walking_ones<C, S>(cells: &mut C, sink: &mut S) -> u64
where
    C: Cells + ?Sized,
    S: FaultSink + ?Sized,
{
    for pattern in WALKING_ONES {
        cells.fill(pattern);
        verify_ascending(cells, pattern, names::WALKING_ONES, sink, no_context);
    }
    len_u64(cells) * WALKING_ONES.len() as u64 * 2
}

/// Value the Address test stores at `offset`.
#[inline]
#[must_use]
pub fn address_pattern(offset: usize) -> u8 {
    (offset & 0xFF) as u8
}

/// T8: each byte holds `offset & 0xFF`; catches aliased addresses.
pub fn address_test<C, S>(cells: &mut C, sink: &mut S) -> u64
where
    C: Cells + ?Sized,
    S: FaultSink + ?Sized,
{
    let len = cells.len();
    for offset in 0..len {
        cells.write(offset, address_pattern(offset));
    }
    for offset in 0..len {
        let expected = address_pattern(offset);
        let actual = cells.read(offset);
        if actual != expected {
            sink.record(Fault {
                test: names::ADDRESS,
                address: offset as u64,
                expected,
                actual,
                context: Some(format!("Addr: 0x{offset:08X}")),
            });
        }
    }
    len as u64 * 2
}

/// T9: fill 0xFF, wait `settle`, verify; fill 0x00, wait, verify.
///
/// Mismatches carry [`REFRESH_ERROR`]: a bit that changed with no
/// intervening write points at a retention fault.
pub fn solid_bits<C, S>(cells: &mut C, settle: Duration, sink: &mut S) -> u64
where
    C: Cells + ?Sized,
    S: FaultSink + ?Sized,
{
    let refresh = |_: usize| Some(REFRESH_ERROR.to_string());

    cells.fill(0xFF);
    std::thread::sleep(settle);
    verify_ascending(cells, 0xFF, names::SOLID_ONES, sink, refresh);

    cells.fill(0x00);
    std::thread::sleep(settle);
    verify_ascending(cells, 0x00, names::SOLID_ZEROS, sink, refresh);

    len_u64(cells) * 4
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Bit `mask` at `offset` always reads as `stuck_high`.
    struct StuckBit {
        data: Vec<u8>,
        offset: usize,
        mask: u8,
        stuck_high: bool,
    }

    impl Cells for StuckBit {
        fn len(&self) -> usize {
            self.data.len()
        }
        fn read(&self, offset: usize) -> u8 {
            let v = self.data[offset];
            if offset != self.offset {
                v
            } else if self.stuck_high {
                v | self.mask
            } else {
                v & !self.mask
            }
        }
        fn write(&mut self, offset: usize, value: u8) {
            self.data[offset] = value;
        }
    }

    /// Writes to `alias` also land on `target`.
    struct Aliased {
        data: Vec<u8>,
        alias: usize,
        target: usize,
    }

    impl Cells for Aliased {
        fn len(&self) -> usize {
            self.data.len()
        }
        fn read(&self, offset: usize) -> u8 {
            self.data[offset]
        }
        fn write(&mut self, offset: usize, value: u8) {
            self.data[offset] = value;
            if offset == self.alias {
                self.data[self.target] = value;
            }
        }
    }

    fn stuck(len: usize, offset: usize, mask: u8, stuck_high: bool) -> StuckBit {
        StuckBit {
            data: vec![0; len],
            offset,
            mask,
            stuck_high,
        }
    }

    #[test]
    fn test_pattern_clean() {
        let mut mem = vec![0u8; 1000];
        let mut faults: Vec<Fault> = Vec::new();
        for p in BASIC_PATTERNS {
            assert_eq!(pattern_write_verify(&mut mem, p, &mut faults), 2000);
        }
        assert!(faults.is_empty());
        assert!(mem.iter().all(|&b| b == 0x33));
    }

    #[test]
    fn test_pattern_stuck_high_bit_with_zero_pattern() {
        let mut mem = stuck(512, 100, 0x04, true);
        let mut faults: Vec<Fault> = Vec::new();
        pattern_write_verify(&mut mem, 0x00, &mut faults);
        assert_eq!(faults.len(), 1);
        let f = &faults[0];
        assert_eq!(f.test, names::PATTERN);
        assert_eq!(f.address, 100);
        assert_eq!(f.expected, 0x00);
        assert_eq!(f.actual, 0x04);
        assert_eq!(f.diff_mask(), 0x04);
    }

    #[test]
    fn test_pattern_stuck_high_bit_invisible_under_ones() {
        let mut mem = stuck(512, 100, 0x04, true);
        let mut faults: Vec<Fault> = Vec::new();
        pattern_write_verify(&mut mem, 0xFF, &mut faults);
        assert!(faults.is_empty());
    }

    #[test]
    fn test_records_every_mismatch_not_just_first() {
        let mut mem = vec![0u8; 64];
        struct AllWrong<'a>(&'a mut Vec<u8>);
        impl Cells for AllWrong<'_> {
            fn len(&self) -> usize {
                self.0.len()
            }
            fn read(&self, offset: usize) -> u8 {
                self.0[offset] ^ 0x80
            }
            fn write(&mut self, offset: usize, value: u8) {
                self.0[offset] = value;
            }
        }
        let mut faults: Vec<Fault> = Vec::new();
        pattern_write_verify(&mut AllWrong(&mut mem), 0xAA, &mut faults);
        assert_eq!(faults.len(), 64);
        let addresses: Vec<u64> = faults.iter().map(|f| f.address).collect();
        assert_eq!(addresses, (0..64).collect::<Vec<u64>>());
    }

    #[test]
    fn test_inverse_tags_each_half() {
        let mut mem = stuck(256, 7, 0x01, false);
        let mut faults: Vec<Fault> = Vec::new();
        assert_eq!(inverse_pattern(&mut mem, 0x55, &mut faults), 1024);
        // 0x55 has bit 0 set -> fails in half 1; 0xAA has it clear -> passes.
        assert_eq!(faults.len(), 1);
        assert_eq!(faults[0].test, names::INVERSE_1);
        assert_eq!(faults[0].expected, 0x55);
        assert_eq!(faults[0].actual, 0x54);

        faults.clear();
        inverse_pattern(&mut mem, 0xAA, &mut faults);
        assert_eq!(faults.len(), 1);
        assert_eq!(faults[0].test, names::INVERSE_2);
    }

    #[test]
    fn test_walking_bit_accounting_and_context() {
        let mut mem = vec![0u8; 300];
        let mut faults: Vec<Fault> = Vec::new();
        assert_eq!(walking_bit(&mut mem, &mut faults), 300 * 8 * 2);
        assert!(faults.is_empty());

        let mut bad = stuck(300, 3, 0x10, false);
        walking_bit(&mut bad, &mut faults);
        assert_eq!(faults.len(), 1);
        assert_eq!(faults[0].context.as_deref(), Some("Bit: 0x10"));
    }

    #[test]
    fn test_walking_ones_accounting() {
        let mut mem = vec![0u8; 300];
        let mut faults: Vec<Fault> = Vec::new();
        assert_eq!(walking_ones(&mut mem, &mut faults), 300 * 8 * 2);
        assert!(faults.is_empty());

        let mut bad = stuck(300, 9, 0x02, true);
        walking_ones(&mut bad, &mut faults);
        // Only 0xFD has bit 1 clear.
        assert_eq!(faults.len(), 1);
        assert_eq!(faults[0].expected, 0xFD);
        assert_eq!(faults[0].actual, 0xFF);
    }

    #[test]
    fn test_march_clean_odd_sizes() {
        for len in [1usize, 2, 3, 7, 4097] {
            let mut mem = vec![0x5Au8; len];
            let mut faults: Vec<Fault> = Vec::new();
            assert_eq!(march_c_minus(&mut mem, &mut faults), len as u64 * 6);
            assert!(faults.is_empty(), "len {len}");
            assert!(mem.iter().all(|&b| b == 0));
        }
    }

    #[test]
    fn test_march_stuck_at_one_hits_zero_phases() {
        let mut mem = stuck(16, 5, 0x01, true);
        let mut faults: Vec<Fault> = Vec::new();
        march_c_minus(&mut mem, &mut faults);
        let phases: Vec<&str> = faults.iter().map(|f| f.test).collect();
        assert_eq!(phases, vec!["March C- S2", "March C- S4", "March C- S6"]);
        assert!(faults.iter().all(|f| f.address == 5 && f.diff_mask() == 0x01));
    }

    #[test]
    fn test_march_stuck_at_zero_hits_one_phases() {
        let mut mem = stuck(16, 0, 0x80, false);
        let mut faults: Vec<Fault> = Vec::new();
        march_c_minus(&mut mem, &mut faults);
        let phases: Vec<&str> = faults.iter().map(|f| f.test).collect();
        assert_eq!(phases, vec!["March C- S3", "March C- S5"]);
    }

    #[test]
    fn test_march_detects_coupling_missed_by_fill() {
        // Writing cell 10 also writes cell 3.
        let mut mem = Aliased {
            data: vec![0; 32],
            alias: 10,
            target: 3,
        };
        let mut faults: Vec<Fault> = Vec::new();
        pattern_write_verify(&mut mem, 0xAA, &mut faults);
        assert!(faults.is_empty(), "uniform fill hides the coupling");

        march_c_minus(&mut mem, &mut faults);
        assert!(!faults.is_empty());
        assert!(faults.iter().all(|f| f.address == 3));
    }

    #[test]
    fn test_address_detects_aliasing() {
        let mut mem = Aliased {
            data: vec![0; 512],
            alias: 300,
            target: 20,
        };
        let mut faults: Vec<Fault> = Vec::new();
        assert_eq!(address_test(&mut mem, &mut faults), 1024);
        assert_eq!(faults.len(), 1);
        let f = &faults[0];
        assert_eq!(f.test, names::ADDRESS);
        assert_eq!(f.address, 20);
        assert_eq!(f.expected, 20);
        assert_eq!(f.actual, address_pattern(300));
        assert_eq!(f.context.as_deref(), Some("Addr: 0x00000014"));
    }

    #[test]
    fn test_address_pattern_wraps() {
        assert_eq!(address_pattern(0), 0);
        assert_eq!(address_pattern(255), 255);
        assert_eq!(address_pattern(256), 0);
        assert_eq!(address_pattern(0x1234), 0x34);
    }

    #[test]
    fn test_random_page_touches_each_page_once() {
        let len = PAGE_SIZE * 3 + 1;
        let mut mem = vec![0u8; len];
        let mut rng = StdRng::seed_from_u64(7);
        let mut faults: Vec<Fault> = Vec::new();
        assert_eq!(random_page_access(&mut mem, &mut rng, &mut faults), len as u64 / 2048);
        assert!(faults.is_empty());

        let mut expected_rng = StdRng::seed_from_u64(7);
        for page in 0..4 {
            let v: u8 = expected_rng.gen();
            assert_eq!(mem[page * PAGE_SIZE], v);
        }
    }

    #[test]
    fn test_random_page_reports_page_number() {
        let mut mem = stuck(PAGE_SIZE * 2, PAGE_SIZE, 0xFF, true);
        let mut rng = StdRng::seed_from_u64(1);
        let mut faults: Vec<Fault> = Vec::new();
        random_page_access(&mut mem, &mut rng, &mut faults);
        // Fails unless the random byte happened to be 0xFF.
        for f in &faults {
            assert_eq!(f.address, PAGE_SIZE as u64);
            assert_eq!(f.context.as_deref(), Some("Page: 1"));
            assert_ne!(f.diff_mask(), 0);
        }
    }

    #[test]
    fn test_bandwidth_copies_without_verification() {
        let mut mem: Vec<u8> = (0..10).collect();
        assert_eq!(bandwidth_stress(&mut mem), 10);
        assert_eq!(mem, vec![0, 1, 2, 3, 4, 0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_solid_bits_tags_refresh() {
        let mut mem = stuck(128, 64, 0x20, false);
        let mut faults: Vec<Fault> = Vec::new();
        assert_eq!(solid_bits(&mut mem, Duration::ZERO, &mut faults), 512);
        assert_eq!(faults.len(), 1);
        assert_eq!(faults[0].test, names::SOLID_ONES);
        assert_eq!(faults[0].context.as_deref(), Some(REFRESH_ERROR));
    }

    #[test]
    fn test_solid_bits_waits_settle_interval() {
        let mut mem = vec![0u8; 16];
        let mut faults: Vec<Fault> = Vec::new();
        let start = std::time::Instant::now();
        solid_bits(&mut mem, Duration::from_millis(20), &mut faults);
        assert!(start.elapsed() >= Duration::from_millis(40));
    }

    #[test]
    fn test_test_kind_index_roundtrip() {
        for (i, kind) in TestKind::ALL.iter().enumerate() {
            assert_eq!(usize::from(kind.index()), i);
            assert_eq!(TestKind::from_index(kind.index()), Some(*kind));
        }
        assert_eq!(TestKind::from_index(10), None);
    }

    #[test]
    fn test_test_kind_display() {
        assert_eq!(TestKind::MarchC.to_string(), "[T4] March C- (Full)");
        assert_eq!(TestKind::CpuMatrix.tag(), "[T10]");
        assert!(TestKind::Inverse.takes_pattern());
        assert!(!TestKind::Address.takes_pattern());
    }

    #[test]
    fn test_empty_cells_process_nothing() {
        let mut mem: Vec<u8> = Vec::new();
        let mut faults: Vec<Fault> = Vec::new();
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(march_c_minus(&mut mem, &mut faults), 0);
        assert_eq!(random_page_access(&mut mem, &mut rng, &mut faults), 0);
        assert_eq!(address_test(&mut mem, &mut faults), 0);
        assert!(faults.is_empty());
    }
}
