use criterion::{black_box, criterion_group, criterion_main, Criterion};
use weather_histogram::{build_histogram, parse_lines, render_histogram};

fn sample_highs(n: usize) -> Vec<f64> {
    (0..n).map(|i| 20.0 + ((i * 7919) % 600) as f64 / 10.0).collect()
}

fn sample_log(n: usize) -> String {
    (0..n)
        .map(|i| format!("GET\t/index.html\t{}.{}.{}.{}\t200", 1 + i % 200, i % 251, i % 13, 1 + i % 254))
        .collect::<Vec<_>>()
        .join("\n")
}

fn bench_histogram(c: &mut Criterion) {
    let highs = sample_highs(10_000);
    c.bench_function("build_histogram", |b| {
        b.iter(|| build_histogram(black_box(&highs), black_box(20)))
    });

    let buckets = build_histogram(&highs, 20).unwrap();
    c.bench_function("render_histogram", |b| {
        b.iter(|| render_histogram(black_box(&buckets), '\t'))
    });

    let log = sample_log(10_000);
    c.bench_function("parse_lines", |b| b.iter(|| parse_lines(black_box(&log), 2)));
}

criterion_group!(benches, bench_histogram);
criterion_main!(benches);
