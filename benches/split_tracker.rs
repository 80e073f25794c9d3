//! Benchmarks for split tracker updates
//!
//! One update runs per tick, so it has to stay far below the 20ms refresh interval.

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use icr2_telemetry::SplitTracker;
use std::hint::black_box;

/// Positions and times for one lap at a steady pace.
fn lap_samples(steps: i32) -> Vec<(i32, i32)> {
    let stride = 60_000_000 / steps;
    (0..steps).map(|i| (i * stride, i * 20)).collect()
}

fn bench_update(c: &mut Criterion) {
    let samples = lap_samples(3_000);

    let mut group = c.benchmark_group("split_tracker");
    group.throughput(Throughput::Elements(samples.len() as u64));

    group.bench_function("lap_of_updates", |b| {
        b.iter(|| {
            let mut tracker = SplitTracker::default();
            for &(position, time) in &samples {
                black_box(tracker.update(black_box(position), black_box(time)));
            }
            tracker
        });
    });

    group.finish();
}

fn bench_summary(c: &mut Criterion) {
    let mut tracker = SplitTracker::default();
    let mut time = 0;
    for _ in 0..3 {
        for (position, step) in lap_samples(300) {
            tracker.update(position, time + step);
        }
        time += 300 * 20;
        tracker.update(0, time);
    }

    c.bench_function("split_summary_text", |b| {
        b.iter(|| black_box(tracker.summary()).to_string());
    });

    c.bench_function("split_summary_html", |b| {
        b.iter(|| black_box(tracker.summary()).to_html());
    });
}

criterion_group!(benches, bench_update, bench_summary);
criterion_main!(benches);
