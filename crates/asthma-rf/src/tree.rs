use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, instrument};

use crate::{
    RfError,
    node::{Node, NodeId, majority_class},
    split::{SplitCriterion, SplitSearch},
};

/// Configuration for a single CART decision tree.
///
/// # Defaults
///
/// | Parameter           | Default               |
/// |---------------------|-----------------------|
/// | `criterion`         | `Gini`                |
/// | `max_depth`         | `None` (unlimited)    |
/// | `min_samples_split` | 2                     |
/// | `min_samples_leaf`  | 1                     |
/// | `max_features`      | `None` (all features) |
/// | `seed`              | 42                    |
#[derive(Debug, Clone)]
pub struct DecisionTreeConfig {
    pub(crate) criterion: SplitCriterion,
    pub(crate) max_depth: Option<usize>,
    pub(crate) min_samples_split: usize,
    pub(crate) min_samples_leaf: usize,
    pub(crate) max_features: Option<usize>,
    pub(crate) seed: u64,
}

impl DecisionTreeConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            criterion: SplitCriterion::Gini,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            seed: 42,
        }
    }

    #[must_use]
    pub fn with_criterion(mut self, criterion: SplitCriterion) -> Self {
        self.criterion = criterion;
        self
    }

    /// Limit depth to `d` levels below the root. `None` grows until pure.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    #[must_use]
    pub fn with_min_samples_split(mut self, min_samples_split: usize) -> Self {
        self.min_samples_split = min_samples_split;
        self
    }

    #[must_use]
    pub fn with_min_samples_leaf(mut self, min_samples_leaf: usize) -> Self {
        self.min_samples_leaf = min_samples_leaf;
        self
    }

    /// Number of features examined per split. `None` examines all of them.
    #[must_use]
    pub fn with_max_features(mut self, max_features: Option<usize>) -> Self {
        self.max_features = max_features;
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Train a tree on a row-major dataset.
    ///
    /// # Errors
    ///
    /// | Variant                              | When                                    |
    /// |--------------------------------------|-----------------------------------------|
    /// | [`RfError::EmptyDataset`]            | `features` is empty                     |
    /// | [`RfError::LabelCountMismatch`]      | `features` and `labels` differ in length|
    /// | [`RfError::ZeroFeatures`]            | rows have zero columns                  |
    /// | [`RfError::FeatureCountMismatch`]    | rows have inconsistent lengths          |
    /// | [`RfError::NonFiniteValue`]          | any value is NaN or infinite            |
    /// | [`RfError::InvalidMaxDepth`]         | `max_depth` is `Some(0)`                |
    /// | [`RfError::InvalidMinSamplesSplit`]  | `min_samples_split` < 2                 |
    /// | [`RfError::InvalidMinSamplesLeaf`]   | `min_samples_leaf` < 1                  |
    /// | [`RfError::InvalidMaxFeatures`]      | `max_features` outside `[1, n_features]`|
    pub fn fit(&self, features: &[Vec<f64>], labels: &[usize]) -> Result<DecisionTree, RfError> {
        let n_features = crate::forest::validate_matrix(features, labels)?;
        self.validate(n_features)?;
        let columns = crate::forest::to_columns(features, n_features);
        let n_classes = labels.iter().max().copied().unwrap_or(0) + 1;
        let samples: Vec<usize> = (0..features.len()).collect();
        Ok(self.grow(&columns, labels, &samples, n_classes))
    }

    pub(crate) fn validate(&self, n_features: usize) -> Result<(), RfError> {
        if self.max_depth == Some(0) {
            return Err(RfError::InvalidMaxDepth { max_depth: 0 });
        }
        if self.min_samples_split < 2 {
            return Err(RfError::InvalidMinSamplesSplit {
                min_samples_split: self.min_samples_split,
            });
        }
        if self.min_samples_leaf < 1 {
            return Err(RfError::InvalidMinSamplesLeaf {
                min_samples_leaf: self.min_samples_leaf,
            });
        }
        let max_features = self.max_features.unwrap_or(n_features);
        if max_features == 0 || max_features > n_features {
            return Err(RfError::InvalidMaxFeatures {
                max_features,
                n_features,
            });
        }
        Ok(())
    }

    /// Grow a tree over pre-validated column-major data.
    ///
    /// Nodes are expanded depth-first from an explicit stack, so the arena
    /// order is root, then the whole left subtree, then the right subtree.
    #[instrument(level = "trace", skip_all, fields(n_samples = samples.len()))]
    pub(crate) fn grow(
        &self,
        columns: &[Vec<f64>],
        labels: &[usize],
        samples: &[usize],
        n_classes: usize,
    ) -> DecisionTree {
        let n_features = columns.len();
        let search = SplitSearch {
            n_classes,
            criterion: self.criterion,
            max_features: self.max_features.unwrap_or(n_features),
            min_samples_leaf: self.min_samples_leaf,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);

        let mut nodes = vec![Node::Leaf {
            class_counts: Vec::new(),
        }];
        let mut pending: Vec<(NodeId, Vec<usize>, usize)> =
            vec![(NodeId::ROOT, samples.to_vec(), 0)];

        while let Some((id, node_samples, depth)) = pending.pop() {
            let mut counts = vec![0usize; n_classes];
            for &s in &node_samples {
                counts[labels[s]] += 1;
            }

            let n = node_samples.len();
            let pure = counts.iter().filter(|&&c| c > 0).count() <= 1;
            let at_depth_limit = self.max_depth.is_some_and(|d| depth >= d);
            let split = if pure || at_depth_limit || n < self.min_samples_split {
                None
            } else {
                search.best_split(columns, labels, &node_samples, &counts, &mut rng)
            };

            let Some(split) = split else {
                nodes[id.index()] = Node::Leaf {
                    class_counts: counts,
                };
                continue;
            };

            let left = NodeId::new(nodes.len());
            let right = NodeId::new(nodes.len() + 1);
            nodes.push(Node::Leaf {
                class_counts: Vec::new(),
            });
            nodes.push(Node::Leaf {
                class_counts: Vec::new(),
            });
            nodes[id.index()] = Node::Split {
                feature: split.feature,
                threshold: split.threshold,
                left,
                right,
                n_samples: n,
                impurity_decrease: split.impurity_decrease,
            };

            pending.push((right, split.right, depth + 1));
            pending.push((left, split.left, depth + 1));
        }

        debug!(n_nodes = nodes.len(), "decision tree grown");

        DecisionTree {
            nodes,
            n_features,
            n_classes,
        }
    }
}

impl Default for DecisionTreeConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// A fitted CART decision tree stored as a flat node arena.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DecisionTree {
    pub(crate) nodes: Vec<Node>,
    pub(crate) n_features: usize,
    pub(crate) n_classes: usize,
}

impl DecisionTree {
    /// Predict the majority class of the leaf `sample` falls into.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::PredictionFeatureMismatch`] when `sample.len() != n_features`.
    pub fn predict(&self, sample: &[f64]) -> Result<usize, RfError> {
        Ok(majority_class(self.leaf_counts(sample)?))
    }

    /// Class distribution of the leaf `sample` falls into; sums to 1.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::PredictionFeatureMismatch`] when `sample.len() != n_features`.
    pub fn predict_proba(&self, sample: &[f64]) -> Result<Vec<f64>, RfError> {
        let counts = self.leaf_counts(sample)?;
        let total: usize = counts.iter().sum();
        Ok(counts.iter().map(|&c| c as f64 / total as f64).collect())
    }

    fn leaf_counts(&self, sample: &[f64]) -> Result<&[usize], RfError> {
        if sample.len() != self.n_features {
            return Err(RfError::PredictionFeatureMismatch {
                expected: self.n_features,
                got: sample.len(),
            });
        }
        let mut id = NodeId::ROOT;
        loop {
            match &self.nodes[id.index()] {
                Node::Leaf { class_counts } => return Ok(class_counts),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    id = if sample[feature.index()] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    /// Mean Decrease in Impurity per feature, normalized to sum to 1.
    ///
    /// All zeros for a single-leaf tree.
    #[must_use]
    pub fn feature_importances(&self) -> Vec<f64> {
        let mut totals = vec![0.0f64; self.n_features];
        for node in &self.nodes {
            if let Node::Split {
                feature,
                impurity_decrease,
                ..
            } = node
            {
                totals[feature.index()] += impurity_decrease;
            }
        }
        let sum: f64 = totals.iter().sum();
        if sum > 0.0 {
            totals.iter_mut().for_each(|v| *v /= sum);
        }
        totals
    }

    #[must_use]
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Longest root-to-leaf path; a lone root leaf has depth 0.
    #[must_use]
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(NodeId::ROOT, 0usize)];
        while let Some((id, d)) = stack.pop() {
            match &self.nodes[id.index()] {
                Node::Leaf { .. } => deepest = deepest.max(d),
                Node::Split { left, right, .. } => {
                    stack.push((*left, d + 1));
                    stack.push((*right, d + 1));
                }
            }
        }
        deepest
    }
}
