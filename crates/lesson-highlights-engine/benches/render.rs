use criterion::{Criterion, criterion_group, criterion_main};
use lesson_highlights_engine::highlighting::{RenderPlan, render_collection};
use lesson_highlights_engine::lesson_tree;
mod common;

fn bench_render_planning(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");
    group.sample_size(10);

    let collection = common::generate_highlights(200, 5);

    group.bench_function("plan_collection", |b| {
        b.iter(|| {
            let plans = RenderPlan::for_collection(&collection);
            std::hint::black_box(plans);
        });
    });

    let mut tree = lesson_tree(&common::generate_lesson_markdown(200));

    group.bench_function("reconcile_tree", |b| {
        b.iter(|| {
            let report = render_collection(&mut tree, &collection);
            std::hint::black_box(report);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_render_planning);
criterion_main!(benches);
