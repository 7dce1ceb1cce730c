//! Criterion micro-benchmarks for cancellation tokens.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use warden_arena::ScopeArena;
use warden_core::CancellationSource;

/// Benchmark: poll a live token.
fn bench_token_poll(c: &mut Criterion) {
    let source = CancellationSource::new();
    let token = source.token();
    c.bench_function("token_is_cancelled", |b| {
        b.iter(|| black_box(token.is_cancelled()));
    });
}

/// Benchmark: cancel a source with 8 listeners attached.
fn bench_cancel_with_listeners(c: &mut Criterion) {
    c.bench_function("cancel_8_listeners", |b| {
        b.iter(|| {
            let source = CancellationSource::new();
            let token = source.token();
            for _ in 0..8 {
                token.on_cancel(|| {});
            }
            black_box(source.cancel());
        });
    });
}

/// Benchmark: request a token, then terminate and restart the scope.
fn bench_scope_token_cycle(c: &mut Criterion) {
    let mut arena = ScopeArena::default();
    let scope = arena.create();
    c.bench_function("scope_token_cycle", |b| {
        b.iter(|| {
            let token = arena.token(scope);
            arena.restart(scope).unwrap();
            black_box(token.is_cancelled());
        });
    });
}

criterion_group!(
    benches,
    bench_token_poll,
    bench_cancel_with_listeners,
    bench_scope_token_cycle
);
criterion_main!(benches);
