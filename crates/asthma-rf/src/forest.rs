//! Random Forest training with parallel tree construction.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::{debug, info, instrument};

use crate::config::{Aggregation, RandomForestConfig};
use crate::error::RfError;
use crate::importance::aggregate_importances;
use crate::result::{RandomForestResult, TrainingMetadata};
use crate::tree::{DecisionTree, DecisionTreeConfig};

/// A fitted Random Forest ensemble. Immutable once trained.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RandomForest {
    pub(crate) trees: Vec<DecisionTree>,
    pub(crate) n_features: usize,
    pub(crate) n_classes: usize,
    pub(crate) feature_names: Vec<String>,
    pub(crate) aggregation: Aggregation,
}

/// Check a row-major matrix against its labels and return the row width.
pub(crate) fn validate_matrix(features: &[Vec<f64>], labels: &[usize]) -> Result<usize, RfError> {
    let Some(first) = features.first() else {
        return Err(RfError::EmptyDataset);
    };
    if features.len() != labels.len() {
        return Err(RfError::LabelCountMismatch {
            n_rows: features.len(),
            n_labels: labels.len(),
        });
    }
    let n_features = first.len();
    if n_features == 0 {
        return Err(RfError::ZeroFeatures);
    }
    for (sample_index, row) in features.iter().enumerate() {
        if row.len() != n_features {
            return Err(RfError::FeatureCountMismatch {
                expected: n_features,
                got: row.len(),
                sample_index,
            });
        }
        if let Some(feature_index) = row.iter().position(|v| !v.is_finite()) {
            return Err(RfError::NonFiniteValue {
                sample_index,
                feature_index,
            });
        }
    }
    Ok(n_features)
}

/// Transpose row-major rows into `columns[feature][sample]`.
pub(crate) fn to_columns(features: &[Vec<f64>], n_features: usize) -> Vec<Vec<f64>> {
    (0..n_features)
        .map(|f| features.iter().map(|row| row[f]).collect())
        .collect()
}

/// Draw `n` indices uniformly with replacement.
fn bootstrap(n: usize, rng: &mut impl Rng) -> Vec<usize> {
    (0..n).map(|_| rng.gen_range(0..n)).collect()
}

#[instrument(skip_all, fields(n_trees = config.n_trees, n_samples = features.len()))]
pub(crate) fn train(
    config: &RandomForestConfig,
    features: &[Vec<f64>],
    labels: &[usize],
    feature_names: &[String],
) -> Result<RandomForestResult, RfError> {
    let n_features = validate_matrix(features, labels)?;
    if feature_names.len() != n_features {
        return Err(RfError::FeatureNameMismatch {
            n_names: feature_names.len(),
            n_features,
        });
    }

    let n_classes = labels.iter().max().copied().unwrap_or(0) + 1;
    let mut present = vec![false; n_classes];
    labels.iter().for_each(|&l| present[l] = true);
    if present.iter().filter(|&&p| p).count() < 2 {
        return Err(RfError::SingleClass { label: labels[0] });
    }

    let max_features = config.max_features.resolve(n_features)?;
    let tree_config = DecisionTreeConfig::new()
        .with_criterion(config.criterion)
        .with_max_depth(config.max_depth)
        .with_min_samples_split(config.min_samples_split)
        .with_min_samples_leaf(config.min_samples_leaf)
        .with_max_features(Some(max_features));
    tree_config.validate(n_features)?;

    let n_samples = features.len();
    info!(
        n_trees = config.n_trees,
        n_samples,
        n_features,
        n_classes,
        max_features,
        "training random forest"
    );

    let columns = to_columns(features, n_features);

    let mut master = ChaCha8Rng::seed_from_u64(config.seed);
    let tree_seeds: Vec<u64> = (0..config.n_trees).map(|_| master.r#gen()).collect();

    let trees: Vec<DecisionTree> = tree_seeds
        .into_par_iter()
        .map(|seed| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let samples = bootstrap(n_samples, &mut rng);
            tree_config
                .clone()
                .with_seed(rng.r#gen())
                .grow(&columns, labels, &samples, n_classes)
        })
        .collect();

    debug!(
        total_nodes = trees.iter().map(DecisionTree::n_nodes).sum::<usize>(),
        "trees grown"
    );

    let per_tree: Vec<Vec<f64>> = trees.iter().map(DecisionTree::feature_importances).collect();
    let importances = aggregate_importances(&per_tree, feature_names);

    let forest = RandomForest {
        trees,
        n_features,
        n_classes,
        feature_names: feature_names.to_vec(),
        aggregation: config.aggregation,
    };
    let metadata = TrainingMetadata {
        n_trees: config.n_trees,
        n_features,
        n_classes,
        n_samples,
        max_features_resolved: max_features,
    };

    info!("random forest training complete");
    Ok(RandomForestResult::new(forest, importances, metadata))
}
