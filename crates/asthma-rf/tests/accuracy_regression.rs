//! Accuracy regression tests for asthma-rf.
//!
//! A deterministic synthetic survey-like dataset guards against algorithmic
//! changes that degrade held-out accuracy or break probability invariants.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use asthma_rf::{Aggregation, ClassificationReport, RandomForest, RandomForestConfig};

/// 400 samples, 7 integer-valued features; the label depends on features 1
/// and 5 with 5% label noise.
fn make_survey(seed: u64) -> (Vec<Vec<f64>>, Vec<usize>, Vec<String>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut features = Vec::new();
    let mut labels = Vec::new();
    for _ in 0..400 {
        let age = rng.gen_range(5..=80) as f64;
        let scores: Vec<f64> = (0..6).map(|_| rng.gen_range(0..=9) as f64).collect();
        let risk = scores[0] + scores[4] > 9.0;
        let flip = rng.gen_bool(0.05);
        labels.push(usize::from(risk != flip));
        let mut row = vec![age];
        row.extend(scores);
        features.push(row);
    }
    let names = (0..7).map(|i| format!("f{i}")).collect();
    (features, labels, names)
}

fn holdout_last_quarter(
    features: &[Vec<f64>],
    labels: &[usize],
) -> (Vec<Vec<f64>>, Vec<usize>, Vec<Vec<f64>>, Vec<usize>) {
    let mid = features.len() * 3 / 4;
    (
        features[..mid].to_vec(),
        labels[..mid].to_vec(),
        features[mid..].to_vec(),
        labels[mid..].to_vec(),
    )
}

/// Trained on the first three quarters, scored on the last.
#[test]
fn held_out_accuracy_above_threshold() {
    let (features, labels, names) = make_survey(42);
    let (x_train, y_train, x_test, y_test) = holdout_last_quarter(&features, &labels);
    let forest = RandomForestConfig::new(100)
        .unwrap()
        .fit(&x_train, &y_train, &names)
        .unwrap()
        .into_forest();

    let report = ClassificationReport::evaluate(&forest, &x_test, &y_test, 1.0).unwrap();
    assert!(report.accuracy > 0.75, "accuracy {} <= 0.75", report.accuracy);
    assert_eq!(report.classes.len(), 2);
}

#[test]
fn informative_feature_ranks_first() {
    let (features, labels, names) = make_survey(7);
    let result = RandomForestConfig::new(60)
        .unwrap()
        .fit(&features, &labels, &names)
        .unwrap();
    let top = result.importances()[0].name.as_str();
    assert!(top == "f1" || top == "f5", "top feature {top}");
}

#[test]
fn probabilities_well_formed_on_fresh_probes() {
    let (features, labels, names) = make_survey(11);
    for aggregation in [Aggregation::MajorityVote, Aggregation::SoftVote] {
        let forest = RandomForestConfig::new(40)
            .unwrap()
            .with_aggregation(aggregation)
            .fit(&features, &labels, &names)
            .unwrap()
            .into_forest();
        let (probes, _, _) = make_survey(99);
        for probe in &probes {
            let dist = forest.predict_proba(probe).unwrap();
            let [p0, p1] = dist.as_slice() else {
                panic!("expected two classes, got {:?}", dist.as_slice());
            };
            assert!(*p0 >= 0.0 && *p1 >= 0.0);
            assert!((p0 + p1 - 1.0).abs() < 1e-9);
            assert!(forest.predict(probe).unwrap() <= 1);
        }
    }
}

#[test]
fn seeded_training_is_reproducible_across_thread_counts() {
    let (features, labels, names) = make_survey(5);
    let config = RandomForestConfig::new(20).unwrap().with_seed(123);
    let reference = config.fit(&features, &labels, &names).unwrap().into_forest();
    let pool = rayon::ThreadPoolBuilder::new().num_threads(1).build().unwrap();
    let single: RandomForest = pool.install(|| {
        config.fit(&features, &labels, &names).unwrap().into_forest()
    });
    assert_eq!(reference, single);
}
