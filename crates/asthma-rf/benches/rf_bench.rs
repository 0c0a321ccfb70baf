//! Criterion benchmarks for asthma-rf: forest training and prediction.

use criterion::{Criterion, criterion_group, criterion_main};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use asthma_rf::RandomForestConfig;

fn make_survey(n_samples: usize, seed: u64) -> (Vec<Vec<f64>>, Vec<usize>, Vec<String>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let features: Vec<Vec<f64>> = (0..n_samples)
        .map(|_| (0..7).map(|_| rng.gen_range(0..=9) as f64).collect())
        .collect();
    let labels = features
        .iter()
        .map(|row: &Vec<f64>| usize::from(row[1] + row[5] > 9.0))
        .collect();
    let names = (0..7).map(|i| format!("f{i}")).collect();
    (features, labels, names)
}

fn bench_train(c: &mut Criterion) {
    let (features, labels, names) = make_survey(2000, 42);
    let config = RandomForestConfig::new(100).unwrap();
    c.bench_function("rf_train_2000x7_100trees", |b| {
        b.iter(|| config.fit(&features, &labels, &names).unwrap());
    });
}

fn bench_predict_proba_batch(c: &mut Criterion) {
    let (features, labels, names) = make_survey(2000, 42);
    let forest = RandomForestConfig::new(100)
        .unwrap()
        .fit(&features, &labels, &names)
        .unwrap()
        .into_forest();
    c.bench_function("rf_predict_proba_batch_2000x7_100trees", |b| {
        b.iter(|| forest.predict_proba_batch(&features).unwrap());
    });
}

criterion_group!(benches, bench_train, bench_predict_proba_batch);
criterion_main!(benches);
