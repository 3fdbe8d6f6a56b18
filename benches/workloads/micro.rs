use criterion::{black_box, Criterion};
use std::time::Duration;

pub fn run(c: &mut Criterion) {
    bench_alloc_small(c);
    bench_alloc_threshold(c);
    bench_alloc_large(c);
    bench_vec_push(c);
}

fn bench_alloc_small(c: &mut Criterion) {
    let mut group = c.benchmark_group("micro_small");
    group.warm_up_time(Duration::from_millis(500));
    group.measurement_time(Duration::from_secs(1));
    group.sample_size(10);

    group.bench_function("box_u128", |b| {
        b.iter(|| {
            black_box(Box::new(black_box(10u128)));
        })
    });

    group.finish();
}

fn bench_alloc_threshold(c: &mut Criterion) {
    let mut group = c.benchmark_group("micro_threshold");

    group.bench_function("largest_class_2048b", |b| {
        b.iter(|| {
            let v = Vec::<u8>::with_capacity(2048);
            black_box(v.into_boxed_slice());
        })
    });

    group.finish();
}

fn bench_alloc_large(c: &mut Criterion) {
    let mut group = c.benchmark_group("micro_large");
    group.sample_size(10);

    group.bench_function("page_mapped_64kb", |b| {
        b.iter(|| {
            let v = Vec::<u8>::with_capacity(64 * 1024);
            black_box(v.into_boxed_slice());
        })
    });

    group.finish();
}

fn bench_vec_push(c: &mut Criterion) {
    let mut group = c.benchmark_group("micro_vec");

    // Grows through every size class before crossing into whole pages.
    group.bench_function("vec_push_1000_u32", |b| {
        b.iter(|| {
            let mut v = Vec::new();
            for i in 0..1000u32 {
                v.push(black_box(i));
            }
            black_box(v);
        })
    });

    group.finish();
}
