//! Benchmarks for forecast_core.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use forecast_core::config::{Execution, SimulationParameters};
use forecast_core::distribution::{
    BoundedPareto, ParticleDistribution, UncertainValue,
};
use forecast_core::engine::{ForecastEngine, RunConfig, RunMode};

fn benchmark_particle_sum(c: &mut Criterion) {
    let mut group = c.benchmark_group("particle_sum");
    let pareto = BoundedPareto::new(1.05, 0.35, 1000.35).unwrap();

    for size in [64, 256, 1024] {
        let dist = ParticleDistribution::from_bounded_pareto(&pareto, size).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(size), &dist, |b, d| {
            b.iter(|| black_box(d).sum_with(d).unwrap())
        });
    }

    group.finish();
}

fn benchmark_distributional_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("distributional_run");
    group.sample_size(10);

    for investments in [10, 100] {
        let params = SimulationParameters::builder()
            .number_of_investments(investments)
            .build()
            .unwrap();
        let engine =
            ForecastEngine::new(params, RunConfig::new(RunMode::Distributional)).unwrap();

        group.bench_with_input(
            BenchmarkId::from_parameter(investments),
            &engine,
            |b, e| b.iter(|| e.run().unwrap()),
        );
    }

    group.finish();
}

fn benchmark_monte_carlo_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("monte_carlo_run");
    group.sample_size(10);
    let params = SimulationParameters::default();

    for execution in [Execution::Sequential, Execution::Parallel] {
        let config = RunConfig::new(RunMode::MonteCarlo { iterations: 10_000 })
            .with_seed(42)
            .with_execution(execution);
        let engine = ForecastEngine::new(params.clone(), config).unwrap();

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{:?}", execution)),
            &engine,
            |b, e| b.iter(|| e.run().unwrap()),
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_particle_sum,
    benchmark_distributional_run,
    benchmark_monte_carlo_run
);
criterion_main!(benches);
