use super::XorShift64;
use criterion::{black_box, Criterion};

const LIVE_BYTES: usize = 1024 * 1024;
const OPS: usize = 10_000;
// Mostly size-classed; a few requests cross into page-mapped objects.
const MAX_SIZE: usize = 3072;

pub fn run(c: &mut Criterion) {
    let mut group = c.benchmark_group("shbench");
    group.sample_size(10);

    group.bench_function("mixed_churn", |b| {
        b.iter(|| {
            let mut rng = XorShift64::new(0x1234_5678);
            let mut live = Vec::new();
            let mut bytes = 0;

            while bytes < LIVE_BYTES {
                let size = rng.gen_range(16, MAX_SIZE);
                live.push(vec![0u8; size]);
                bytes += size;
            }

            for _ in 0..OPS {
                let idx = rng.gen_range(0, live.len());
                let size = rng.gen_range(16, MAX_SIZE);
                live[idx] = vec![0u8; size];
                black_box(&live[idx]);
            }

            black_box(live);
        })
    });

    group.finish();
}
