//! Benchmarks for island extraction and engine rendering.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use livemark::islands::{extract, render_math};
use livemark::render::render;

fn bench_extract(c: &mut Criterion) {
    let html = render(include_str!("../tests/fixtures/sample.md"));
    c.bench_function("extract_islands", |b| b.iter(|| extract(black_box(&html))));
}

fn bench_math(c: &mut Criterion) {
    let latex = r"\frac{-b \pm \sqrt{b^2-4ac}}{2a}";
    c.bench_function("render_math_display", |b| {
        b.iter(|| render_math(black_box(latex), true))
    });
}

criterion_group!(benches, bench_extract, bench_math);
criterion_main!(benches);
