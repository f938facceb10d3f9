//! Benchmarks for the quadratic estimators

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use gemini_core::estimate::{deformation, entropy};
use gemini_core::reduce::{Reducer, Tsne, TsneConfig};
use gemini_core::PointSet;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

fn cloud(n: usize, d: usize, seed: u64) -> PointSet {
    let mut rng = StdRng::seed_from_u64(seed);
    let values = (0..n * d).map(|_| rng.sample(StandardNormal)).collect();
    PointSet::from_shape_vec(n, d, values).unwrap()
}

fn bench_deformation(c: &mut Criterion) {
    let mut group = c.benchmark_group("deformation");
    for n in [100, 500, 1000] {
        let a = cloud(n, 30, 1);
        let b = cloud(n, 2, 2);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |bench, _| {
            bench.iter(|| deformation(black_box(&a), black_box(&b)).unwrap())
        });
    }
    group.finish();
}

fn bench_entropy(c: &mut Criterion) {
    let mut group = c.benchmark_group("entropy");
    for d in [2, 30] {
        let points = cloud(1000, d, 3);
        group.bench_with_input(BenchmarkId::new("kde_1000", d), &d, |bench, _| {
            bench.iter(|| {
                let mut rng = StdRng::seed_from_u64(0);
                entropy(black_box(&points), &mut rng).unwrap()
            })
        });
    }
    group.finish();
}

fn bench_tsne(c: &mut Criterion) {
    let points = cloud(200, 30, 4);
    let config = TsneConfig {
        n_iter: 250,
        exaggeration_iter: 100,
        ..Default::default()
    };
    let tsne = Tsne::new(30.0, 0).with_config(config);

    let mut group = c.benchmark_group("tsne");
    group.sample_size(10);
    group.bench_function("exact_200x30", |bench| {
        bench.iter(|| tsne.reduce(black_box(&points), 2).unwrap())
    });
    group.finish();
}

criterion_group!(benches, bench_deformation, bench_entropy, bench_tsne);
criterion_main!(benches);
