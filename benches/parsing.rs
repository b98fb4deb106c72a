//! Benchmarks for markdown to sanitized HTML.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use livemark::render::{render, render_unsanitized};

fn bench_render_simple(c: &mut Criterion) {
    let md = "# Hello\n\nWorld";
    c.bench_function("render_simple", |b| b.iter(|| render(black_box(md))));
}

fn bench_render_medium(c: &mut Criterion) {
    let md = include_str!("../tests/fixtures/sample.md");
    c.bench_function("render_medium", |b| b.iter(|| render(black_box(md))));
    c.bench_function("render_medium_unsanitized", |b| {
        b.iter(|| render_unsanitized(black_box(md)))
    });
}

criterion_group!(benches, bench_render_simple, bench_render_medium);
criterion_main!(benches);
