//! Criterion benchmarks for asthma-resample: SMOTE and stratified splitting.

use asthma_resample::{Smote, StratifiedSplit};
use criterion::{Criterion, black_box, criterion_group, criterion_main};

fn skewed(n: usize) -> (Vec<Vec<f64>>, Vec<usize>) {
    let features = (0..n)
        .map(|i| (0..7).map(|f| ((i * (f + 3)) % 11) as f64).collect())
        .collect();
    let labels = (0..n).map(|i| usize::from(i % 6 == 0)).collect();
    (features, labels)
}

fn bench_smote(c: &mut Criterion) {
    let (features, labels) = skewed(2400);
    c.bench_function("smote_2400x7_k5", |b| {
        b.iter(|| Smote::default().fit_resample(black_box(&features), black_box(&labels)))
    });
}

fn bench_split(c: &mut Criterion) {
    let (_, labels) = skewed(20_000);
    c.bench_function("stratified_split_20000", |b| {
        b.iter(|| StratifiedSplit::default().split(black_box(&labels)))
    });
}

criterion_group!(benches, bench_smote, bench_split);
criterion_main!(benches);
