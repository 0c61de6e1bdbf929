//! Benchmarks for single fits and batches of bootstrap replicates.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use mcorr_fit::data::{CorrelationDataset, CorrelationKind, CorrelationObservation, FittingSeries};
use mcorr_fit::fit::{BatchRunner, FitConfig, Fitter, ModelVariant};
use mcorr_fit::lm::SolverMethod;

fn observation(group: &str, lag: f64, value: f64, kind: CorrelationKind) -> CorrelationObservation {
    CorrelationObservation {
        lag,
        value,
        variance: 0.0,
        sample_size: 100.0,
        kind,
        group: group.to_string(),
    }
}

fn correlation(lag: f64, scale: f64) -> f64 {
    scale * (0.01 + 0.006 * (-lag / 40.0).exp())
}

fn series() -> FittingSeries {
    let lags: Vec<f64> = (3..=300).map(|l| l as f64).collect();
    let correlations = lags.iter().map(|&l| correlation(l, 1.0)).collect();
    FittingSeries::new("all", lags, correlations, 0.012).unwrap()
}

fn dataset(replicates: usize) -> CorrelationDataset {
    let mut rows = Vec::new();
    for i in 0..replicates {
        let group = format!("boot{}", i + 1);
        let scale = 1.0 + 0.001 * i as f64;
        rows.push(observation(&group, 0.0, 0.012 * scale, CorrelationKind::Ks));
        rows.extend((1..=300).map(|l| {
            observation(&group, l as f64, correlation(l as f64, scale), CorrelationKind::P2)
        }));
    }
    CorrelationDataset::from_observations(rows)
}

fn bench_single_fit(c: &mut Criterion) {
    let series = series();
    let mut group = c.benchmark_group("single_fit");

    for method in [SolverMethod::LeastSquares, SolverMethod::LeastSq] {
        let fitter = Fitter::new(FitConfig {
            method,
            ..FitConfig::default()
        });
        for variant in [ModelVariant::FragmentIncorporation, ModelVariant::TemplateSwitching] {
            group.bench_with_input(
                BenchmarkId::new(variant.label(), method),
                &variant,
                |b, &variant| b.iter(|| fitter.fit(black_box(&series), variant)),
            );
        }
    }

    let fitter = Fitter::new(FitConfig::default());
    group.bench_function("zero-recombo", |b| {
        b.iter(|| fitter.fit(black_box(&series), ModelVariant::ZeroRecombination))
    });
    group.finish();
}

fn bench_batch(c: &mut Criterion) {
    let dataset = dataset(20);
    let mut group = c.benchmark_group("batch");
    group.sample_size(10);

    for parallel in [false, true] {
        let runner = BatchRunner::new(Fitter::new(FitConfig::default()))
            .unwrap()
            .with_parallel(parallel);
        let name = if parallel { "parallel" } else { "sequential" };
        group.bench_function(name, |b| {
            b.iter(|| runner.run_batch(black_box(&dataset), ModelVariant::TemplateSwitching))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_single_fit, bench_batch);
criterion_main!(benches);
