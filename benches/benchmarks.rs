//! Pattern battery benchmarks using Criterion.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use ramstress::cpu::matrix_burn;
use ramstress::patterns::{
    address_test, bandwidth_stress, inverse_pattern, march_c_minus, pattern_write_verify,
    walking_bit, Fault,
};
use ramstress::{Segment, PAGE_SIZE};

const PAGES: usize = 256;

fn segment() -> Segment {
    Segment::zeroed(PAGES * PAGE_SIZE).unwrap()
}

fn benchmark_fill_verify(c: &mut Criterion) {
    let mut mem = segment();
    let mut faults: Vec<Fault> = Vec::new();

    let mut group = c.benchmark_group("fill_verify");
    group.throughput(Throughput::Bytes((PAGES * PAGE_SIZE) as u64));

    group.bench_function("pattern", |b| {
        b.iter(|| black_box(pattern_write_verify(&mut mem, 0xAA, &mut faults)));
    });
    group.bench_function("inverse", |b| {
        b.iter(|| black_box(inverse_pattern(&mut mem, 0x55, &mut faults)));
    });
    group.bench_function("walking_bit", |b| {
        b.iter(|| black_box(walking_bit(&mut mem, &mut faults)));
    });

    group.finish();
    assert!(faults.is_empty());
}

fn benchmark_march_and_address(c: &mut Criterion) {
    let mut mem = segment();
    let mut faults: Vec<Fault> = Vec::new();

    let mut group = c.benchmark_group("march");
    group.throughput(Throughput::Bytes((PAGES * PAGE_SIZE) as u64));

    group.bench_function("march_c_minus", |b| {
        b.iter(|| black_box(march_c_minus(&mut mem, &mut faults)));
    });
    group.bench_function("address", |b| {
        b.iter(|| black_box(address_test(&mut mem, &mut faults)));
    });
    group.bench_function("bandwidth", |b| {
        b.iter(|| black_box(bandwidth_stress(&mut mem)));
    });

    group.finish();
    assert!(faults.is_empty());
}

fn benchmark_matrix_burn(c: &mut Criterion) {
    c.bench_function("matrix_burn_64", |b| b.iter(|| black_box(matrix_burn())));
}

criterion_group!(
    benches,
    benchmark_fill_verify,
    benchmark_march_and_address,
    benchmark_matrix_burn
);
criterion_main!(benches);
