//! Benchmarks for story context bookkeeping.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::sync::Arc;
use storyctx::cache::PendingCaches;
use storyctx::context::StoryContext;
use storyctx::identifier::IdentifierHandle;

fn context_benchmark(c: &mut Criterion) {
    let context = StoryContext::with_caches(Arc::new(PendingCaches::new()));
    let handles: Vec<_> = (0..16)
        .map(|i| IdentifierHandle::resolved(format!("step-{i}")))
        .collect();

    c.bench_function("push_clear_nested_steps", |b| {
        b.iter(|| {
            for handle in &handles {
                context.set_current_step(Some(handle.clone()));
            }
            for _ in &handles {
                context.set_current_step(None);
            }
            black_box(context.current_step())
        });
    });

    let busy = Arc::new(PendingCaches::new());
    let workers: Vec<_> = (0..64)
        .map(|i| {
            let worker = StoryContext::with_caches(busy.clone());
            worker.set_current_story_id(Some(IdentifierHandle::resolved(format!("story-{i}"))));
            worker.set_current_step(Some(IdentifierHandle::resolved(format!("step-{i}"))));
            worker
        })
        .collect();

    c.bench_function("aggregated_pending_64_contexts", |b| {
        b.iter(|| black_box(busy.aggregated_pending().len()));
    });

    drop(workers);
}

criterion_group!(benches, context_benchmark);
criterion_main!(benches);
