use criterion::{black_box, Criterion, Throughput};
use std::sync::mpsc;
use std::thread;

const OPS: usize = 20_000;

/// Producer/consumer pairs: blocks are allocated on one thread and
/// released on another.
pub fn run(c: &mut Criterion) {
    let mut group = c.benchmark_group("threadtest_prod_cons");
    group.sample_size(10);

    for pairs in [1usize, 2, 4] {
        group.throughput(Throughput::Elements((OPS * pairs) as u64));

        group.bench_function(format!("threadtest_{}_threads", pairs * 2), |b| {
            b.iter(|| {
                let mut handles = Vec::with_capacity(pairs * 2);

                for _ in 0..pairs {
                    let (tx, rx) = mpsc::channel::<Box<[u8; 48]>>();

                    handles.push(thread::spawn(move || {
                        for i in 0..OPS {
                            if tx.send(Box::new([i as u8; 48])).is_err() {
                                break;
                            }
                        }
                    }));

                    handles.push(thread::spawn(move || {
                        while let Ok(block) = rx.recv() {
                            black_box(block);
                        }
                    }));
                }

                for h in handles {
                    h.join().unwrap();
                }
            })
        });
    }
    group.finish();
}
