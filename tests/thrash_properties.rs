//! End-to-end properties of the churn engine against the dummy backend.
//!
//! These tests drive the public API the way the binaries do: build a
//! backend, a fill service, and an engine, then churn and inspect the
//! observable accounting. Fill policies are parameterized with `rstest`
//! since the two must be indistinguishable in output.

use std::sync::Arc;

use rstest::rstest;

use quad_thrasher::backend::dummy::DummyBackend;
use quad_thrasher::{
    chain_upper_bound, FakeTexture, FrameDriver, QuadThrasher, RandomSource, TexelFiller,
    ThrashConfig, BYTES_PER_TEXEL,
};

fn config(average: usize, delta: usize, max_dim: usize) -> ThrashConfig {
    ThrashConfig {
        average_memory_usage_bytes: average,
        delta_bytes: delta,
        max_texture_dimension_texels: max_dim,
        ..ThrashConfig::default()
    }
}

#[rstest]
#[case::scratch(TexelFiller::scratch(1 << 16))]
#[case::per_call(TexelFiller::per_call())]
fn fill_pattern_repeats_every_four_bytes(#[case] mut filler: TexelFiller) {
    let mut rng = RandomSource::from_seed(61);
    for size in [1usize, 3, 4, 7, 4096, 65_535] {
        let buffer = filler.fill(size, &mut rng).unwrap();
        assert_eq!(buffer.len(), size);
        for i in 0..size {
            assert_eq!(buffer[i], buffer[i % 4], "size {size}, index {i}");
        }
    }
}

#[rstest]
#[case::scratch(false)]
#[case::per_call(true)]
fn usage_never_exceeds_the_round_budget(#[case] per_call_buffers: bool) {
    let backend = Arc::new(DummyBackend::new());
    let config = ThrashConfig {
        per_call_buffers,
        ..config(200_000, 50_000, 100)
    };
    let mut thrasher = QuadThrasher::new(backend.clone(), config.filler(), &config);
    let mut rng = RandomSource::from_seed(62);

    for _ in 0..100 {
        thrasher.thrash(&mut rng);
        // Every round's target is at most average + delta, and usage can
        // only carry forward under a later target.
        assert!(thrasher.bytes_used() <= 250_000);
        assert_eq!(backend.live_handles(), thrasher.pool_len());
    }
}

#[test]
fn mip_chain_byte_accounting_is_exact() {
    let backend = Arc::new(DummyBackend::new());
    let mut filler = TexelFiller::per_call();
    let mut rng = RandomSource::from_seed(63);

    let texture = FakeTexture::create(backend, 132, 37, &mut filler, &mut rng).unwrap();

    // L = floor(log2(37)) = 5, so six levels.
    let levels = [(132, 37), (66, 18), (33, 9), (16, 4), (8, 2), (4, 1)];
    let expected: usize = levels
        .iter()
        .map(|&(w, h): &(usize, usize)| w * h * BYTES_PER_TEXEL)
        .sum();
    assert_eq!(texture.size_bytes(), expected);
    assert!(texture.size_bytes() <= chain_upper_bound(132, 37));
}

#[test]
fn sizing_is_deterministic_for_equal_dimensions() {
    let backend = Arc::new(DummyBackend::new());
    let mut filler = TexelFiller::per_call();
    let mut rng = RandomSource::from_seed(64);

    let first = FakeTexture::create(backend.clone(), 100, 63, &mut filler, &mut rng).unwrap();
    let second = FakeTexture::create(backend, 100, 63, &mut filler, &mut rng).unwrap();
    assert_eq!(first.size_bytes(), second.size_bytes());
}

#[test]
fn thrash_terminates_with_a_fixed_budget() {
    let backend = Arc::new(DummyBackend::new());
    let config = config(200_000, 0, 100);
    let mut thrasher = QuadThrasher::new(backend, config.filler(), &config);
    let mut rng = RandomSource::from_seed(65);

    for _ in 0..200 {
        thrasher.thrash(&mut rng);
        assert!(thrasher.bytes_used() <= 200_000);
    }
    assert!(thrasher.pool_len() > 0);
}

#[test]
fn zero_budget_round_creates_nothing() {
    let backend = Arc::new(DummyBackend::new());
    let config = config(0, 0, 100);
    let mut thrasher = QuadThrasher::new(backend.clone(), config.filler(), &config);
    let mut rng = RandomSource::from_seed(66);

    thrasher.thrash(&mut rng);
    assert_eq!(thrasher.pool_len(), 0);
    assert_eq!(thrasher.bytes_used(), 0);
    assert_eq!(backend.live_handles(), 0);
}

#[test]
fn thrash_terminates_when_the_backend_refuses_handles() {
    let backend = Arc::new(DummyBackend::new());
    backend.refuse_handles(true);
    let config = config(1_000, 0, 10);
    let mut thrasher = QuadThrasher::new(backend.clone(), config.filler(), &config);
    let mut rng = RandomSource::from_seed(67);

    for _ in 0..50 {
        thrasher.thrash(&mut rng);
        assert_eq!(thrasher.pool_len(), 0);
    }
    assert_eq!(backend.live_handles(), 0);
}

#[test]
fn thrash_recovers_after_upload_errors_stop() {
    let backend = Arc::new(DummyBackend::new());
    let config = config(100_000, 0, 50);
    let mut thrasher = QuadThrasher::new(backend.clone(), config.filler(), &config);
    let mut rng = RandomSource::from_seed(68);

    backend.fail_uploads(true);
    thrasher.thrash(&mut rng);
    assert_eq!(thrasher.pool_len(), 0);
    assert_eq!(backend.live_handles(), 0);

    backend.fail_uploads(false);
    thrasher.thrash(&mut rng);
    assert!(thrasher.pool_len() > 0);
    assert_eq!(backend.live_handles(), thrasher.pool_len());
}

#[test]
fn every_handle_is_released_exactly_once_across_a_run() {
    let backend = Arc::new(DummyBackend::new());
    let config = ThrashConfig {
        average_memory_usage_bytes: 100_000,
        thrash_interval: 2,
        ..ThrashConfig::default()
    };
    let mut driver = FrameDriver::new(backend.clone(), &config, RandomSource::from_seed(69));

    driver.run(Some(20));
    assert_eq!(backend.live_handles(), driver.thrasher().pool_len());

    drop(driver);
    assert_eq!(backend.live_handles(), 0);
    assert_eq!(backend.double_deletes(), 0);
}
