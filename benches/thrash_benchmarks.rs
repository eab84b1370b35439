use criterion::{black_box, criterion_group, criterion_main, Criterion};

use std::sync::Arc;

use quad_thrasher::backend::dummy::DummyBackend;
use quad_thrasher::{QuadThrasher, RandomSource, TexelFiller, ThrashConfig};

// ---------------------------------------------------------------------------
// Churn rounds against the dummy backend
// ---------------------------------------------------------------------------

fn bench_thrash_round(c: &mut Criterion) {
    let config = ThrashConfig::default();
    let mut thrasher = QuadThrasher::new(
        Arc::new(DummyBackend::new()),
        config.filler(),
        &config,
    );
    let mut rng = RandomSource::from_seed(1);

    c.bench_function("thrash_round_default_budget", |b| {
        b.iter(|| {
            thrasher.thrash(&mut rng);
            black_box(thrasher.bytes_used());
        });
    });
}

fn bench_thrash_round_per_call_buffers(c: &mut Criterion) {
    let config = ThrashConfig {
        per_call_buffers: true,
        ..ThrashConfig::default()
    };
    let mut thrasher = QuadThrasher::new(
        Arc::new(DummyBackend::new()),
        config.filler(),
        &config,
    );
    let mut rng = RandomSource::from_seed(2);

    c.bench_function("thrash_round_per_call_buffers", |b| {
        b.iter(|| {
            thrasher.thrash(&mut rng);
            black_box(thrasher.bytes_used());
        });
    });
}

fn bench_fill(c: &mut Criterion) {
    let mut filler = TexelFiller::scratch(1 << 20);
    let mut rng = RandomSource::from_seed(3);

    c.bench_function("fill_256k", |b| {
        b.iter(|| {
            let buffer = filler.fill(256 * 1024, &mut rng).unwrap();
            black_box(buffer.len());
        });
    });
}

criterion_group!(
    benches,
    bench_thrash_round,
    bench_thrash_round_per_call_buffers,
    bench_fill
);
criterion_main!(benches);
