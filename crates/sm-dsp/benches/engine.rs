use criterion::{Criterion, black_box, criterion_group, criterion_main};
use sm_core::config::Integration;
use sm_dsp::compensation::CompensationProfile;
use sm_dsp::design::{BandLayout, a_weighting_coeff, bands_coeff};
use sm_dsp::engine::FilterEngine;

const SR: f64 = 48000.0;

fn chunk() -> Vec<f64> {
    (0..4800).map(|i| (i as f64 * 0.013).sin() * 0.5).collect()
}

fn engine() -> FilterEngine {
    match FilterEngine::new(SR, CompensationProfile::pass_through(SR, "bench")) {
        Ok(e) => e,
        Err(e) => panic!("engine design failed: {e}"),
    }
}

fn bench_design(c: &mut Criterion) {
    c.bench_function("design_a_weighting_48k", |b| {
        b.iter(|| a_weighting_coeff(black_box(SR)));
    });
    c.bench_function("design_octave_bands_48k", |b| {
        b.iter(|| bands_coeff(black_box(SR), &BandLayout::octave()));
    });
}

fn bench_streaming(c: &mut Criterion) {
    let x = chunk();

    let mut e = engine();
    c.bench_function("weighting_4800", |b| {
        b.iter(|| e.apply_weighting(black_box(&x)));
    });

    let mut e = engine();
    c.bench_function("envelope_fast_4800", |b| {
        b.iter(|| e.apply_envelope(black_box(&x), Integration::Fast));
    });

    let mut e = engine();
    c.bench_function("octave_bands_serial_4800", |b| {
        b.iter(|| e.apply_octave_bands(black_box(&x)));
    });

    let mut e = engine();
    c.bench_function("octave_bands_parallel_4800", |b| {
        b.iter(|| e.apply_octave_bands_parallel(black_box(&x)));
    });
}

criterion_group!(benches, bench_design, bench_streaming);
criterion_main!(benches);
