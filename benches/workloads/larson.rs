use super::XorShift64;
use criterion::{black_box, Criterion, Throughput};
use std::thread;

const OPS_PER_THREAD: usize = 20_000;
const SLOTS_PER_THREAD: usize = 1000;
const MIN_SIZE: usize = 8;
const MAX_SIZE: usize = 2048;

/// Each thread replaces random slots with fresh objects drawn from every
/// size class. All threads share the one process-wide heap.
pub fn run(c: &mut Criterion) {
    let mut group = c.benchmark_group("larson");
    group.sample_size(10);

    for t in [1usize, 2, 4, 8] {
        group.throughput(Throughput::Elements((OPS_PER_THREAD * t) as u64));
        group.bench_function(format!("larson_{t}_threads"), |b| {
            b.iter(|| {
                let handles: Vec<_> = (0..t)
                    .map(|i| {
                        thread::spawn(move || {
                            let mut rng = XorShift64::new((i as u64 + 1) * 0xdead_beef);
                            let mut slots: Vec<Vec<u8>> =
                                (0..SLOTS_PER_THREAD).map(|_| Vec::new()).collect();
                            for _ in 0..OPS_PER_THREAD {
                                let idx = rng.gen_range(0, SLOTS_PER_THREAD);
                                let size = rng.gen_range(MIN_SIZE, MAX_SIZE + 1);
                                slots[idx] = vec![0u8; size];
                                black_box(&slots[idx]);
                            }
                        })
                    })
                    .collect();

                for h in handles {
                    h.join().unwrap();
                }
            })
        });
    }
    group.finish();
}
