//! Simulation Benchmarks with 95% Confidence Intervals
//!
//! Measures the hot paths of a run: Bernoulli counting per experiment,
//! histogram aggregation and statistics over a full result set.
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use binosim::config::SimConfig;
use binosim::domains::histogram::{compute_histogram, BinningPolicy};
use binosim::domains::statistics::compute_statistics;
use binosim::engine::params::SimulationParams;
use binosim::engine::rng::SimRng;
use binosim::engine::runner::{CancelToken, ExperimentResult, ExperimentRunner};
use binosim::engine::Simulator;

fn result_set(trials: u64, experiments: u64) -> (SimulationParams, Vec<ExperimentResult>) {
    let params = SimulationParams {
        probability_of_success: 0.5,
        trials_per_experiment: trials,
        number_of_experiments: experiments,
    };
    let results = ExperimentRunner::new(params, SimRng::new(42), CancelToken::new()).collect();
    (params, results)
}

/// One experiment: `trials` Bernoulli draws counted.
fn bench_count_successes(c: &mut Criterion) {
    let mut group = c.benchmark_group("Experiment");
    group.sample_size(100);
    group.confidence_level(0.95);

    for trials in [100u64, 1_000, 10_000].iter() {
        group.bench_with_input(BenchmarkId::new("count_successes", trials), trials, |b, &trials| {
            let mut rng = SimRng::new(42);
            b.iter(|| black_box(rng.count_successes(trials, 0.5)));
        });
    }

    group.finish();
}

/// Histogram rebuild: unlimited vs capped binning.
fn bench_histogram(c: &mut Criterion) {
    let mut group = c.benchmark_group("Histogram");
    group.sample_size(100);
    group.confidence_level(0.95);

    for experiments in [1_000u64, 10_000].iter() {
        let (_, results) = result_set(1_000, *experiments);
        group.bench_with_input(BenchmarkId::new("unlimited", experiments), &results, |b, r| {
            b.iter(|| black_box(compute_histogram(r, BinningPolicy::Unlimited)));
        });
        group.bench_with_input(BenchmarkId::new("capped_20", experiments), &results, |b, r| {
            b.iter(|| black_box(compute_histogram(r, BinningPolicy::Capped { max_bins: 20 })));
        });
    }

    group.finish();
}

/// Summary statistics over a full result set.
fn bench_statistics(c: &mut Criterion) {
    let mut group = c.benchmark_group("Statistics");
    group.sample_size(100);

    for experiments in [1_000u64, 10_000].iter() {
        let (params, results) = result_set(100, *experiments);
        group.bench_with_input(BenchmarkId::new("compute", experiments), &results, |b, r| {
            b.iter(|| black_box(compute_statistics(r, &params)));
        });
    }

    group.finish();
}

/// Full unpaced run through the controller, guard included.
fn bench_full_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("Simulator");
    group.sample_size(20);

    group.bench_function("run_1000x100", |b| {
        let config = SimConfig::builder().seed(42).delay_ms(0).build();
        b.iter(|| {
            let mut sim = Simulator::new(&config);
            let summary = sim.run_blocking();
            black_box(summary.ok())
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_count_successes,
    bench_histogram,
    bench_statistics,
    bench_full_run,
);
criterion_main!(benches);
