use criterion::{black_box, BenchmarkId, Criterion, Throughput};

const ROUNDS: usize = 512;

/// Box churn pinned to one size class at a time, including the requests
/// that land exactly on a class boundary and one byte past it.
pub fn run(c: &mut Criterion) {
    let mut group = c.benchmark_group("size_class_churn");
    group.throughput(Throughput::Elements(ROUNDS as u64));

    for size in [8usize, 16, 17, 100, 512, 2048, 2049] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                for _ in 0..ROUNDS {
                    let v = vec![0u8; black_box(size)].into_boxed_slice();
                    black_box(&v);
                }
            })
        });
    }

    group.finish();
}
