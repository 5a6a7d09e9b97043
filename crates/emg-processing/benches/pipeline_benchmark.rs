//! Performance benchmarks for the fatigue analysis pipeline
//!
//! Covers the Welch estimator at the per-window and whole-recording segment
//! lengths, and complete analysis runs over recordings of increasing length.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use emg_core::SamplingRate;
use emg_processing::{AnalysisConfig, FatiguePipeline, PsdEstimator, WelchEstimator, WelchParams};
use emg_simulation::{simulate, SimulationConfig};

/// Benchmark a single Welch estimate
fn bench_welch(c: &mut Criterion) {
    let mut group = c.benchmark_group("welch");
    let fs = SamplingRate::new(2000.0).unwrap();

    for &(samples, nominal) in &[(500usize, 512usize), (20_000, 1024)] {
        let duration = samples as f64 / 2000.0;
        let series = simulate(SimulationConfig::fatiguing_contraction(2000.0, duration)).unwrap();
        let signal = series.dc_removed();
        let params = WelchParams::for_signal(nominal, signal.len());
        let mut estimator = WelchEstimator::new();

        group.bench_with_input(
            BenchmarkId::new("estimate", format!("{}samples", samples)),
            &signal,
            |b, signal| {
                b.iter(|| black_box(estimator.estimate(black_box(signal), fs, &params).unwrap()));
            },
        );
    }

    group.finish();
}

/// Benchmark complete analysis runs
fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    group.sample_size(20);

    for &seconds in &[5.0, 30.0, 120.0] {
        let series = simulate(SimulationConfig::fatiguing_contraction(2000.0, seconds)).unwrap();
        let mut pipeline = FatiguePipeline::new(AnalysisConfig::surface_emg()).unwrap();

        group.bench_with_input(
            BenchmarkId::new("run", format!("{}s", seconds)),
            &series,
            |b, series| {
                b.iter(|| black_box(pipeline.run(black_box(series)).unwrap()));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_welch, bench_pipeline);
criterion_main!(benches);
