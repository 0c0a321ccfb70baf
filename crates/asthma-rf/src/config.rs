//! Configuration builder for Random Forest training.

use crate::error::RfError;
use crate::result::RandomForestResult;
use crate::split::SplitCriterion;

/// Strategy for determining the number of features to consider at each split.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MaxFeatures {
    /// Square root of total features, rounded down (at least 1).
    Sqrt,
    /// Log base 2 of total features, rounded down (at least 1).
    Log2,
    /// A fraction of total features (must be in (0.0, 1.0]).
    Fraction(f64),
    /// A fixed count.
    Fixed(usize),
    /// All features (plain bagging).
    All,
}

impl MaxFeatures {
    /// Resolve to a concrete count for a dataset with `n_features` columns.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::InvalidMaxFeatures`] if the count falls outside `[1, n_features]`.
    pub fn resolve(self, n_features: usize) -> Result<usize, RfError> {
        let n = n_features as f64;
        let resolved = match self {
            MaxFeatures::Sqrt => n.sqrt().floor().max(1.0) as usize,
            MaxFeatures::Log2 => n.log2().floor().max(1.0) as usize,
            MaxFeatures::Fraction(f) => (n * f).ceil() as usize,
            MaxFeatures::Fixed(k) => k,
            MaxFeatures::All => n_features,
        };
        if resolved == 0 || resolved > n_features {
            return Err(RfError::InvalidMaxFeatures {
                max_features: resolved,
                n_features,
            });
        }
        Ok(resolved)
    }
}

/// How per-tree outputs are combined into the forest's prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum Aggregation {
    /// Each tree casts one vote for its leaf's majority class. The
    /// probability of a class is the fraction of trees voting for it.
    #[default]
    MajorityVote,
    /// Leaf class distributions are averaged across trees.
    SoftVote,
}

/// Configuration for Random Forest training.
///
/// Construct via [`RandomForestConfig::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter           | Default        |
/// |---------------------|----------------|
/// | `max_features`      | `Sqrt`         |
/// | `max_depth`         | `None`         |
/// | `min_samples_split` | 2              |
/// | `min_samples_leaf`  | 1              |
/// | `criterion`         | `Gini`         |
/// | `aggregation`       | `MajorityVote` |
/// | `seed`              | 42             |
#[derive(Debug, Clone)]
pub struct RandomForestConfig {
    pub(crate) n_trees: usize,
    pub(crate) max_features: MaxFeatures,
    pub(crate) max_depth: Option<usize>,
    pub(crate) min_samples_split: usize,
    pub(crate) min_samples_leaf: usize,
    pub(crate) criterion: SplitCriterion,
    pub(crate) aggregation: Aggregation,
    pub(crate) seed: u64,
}

impl RandomForestConfig {
    /// Create a new config with the given number of trees.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::InvalidTreeCount`] if `n_trees` is zero.
    pub fn new(n_trees: usize) -> Result<Self, RfError> {
        if n_trees == 0 {
            return Err(RfError::InvalidTreeCount { n_trees });
        }
        Ok(Self {
            n_trees,
            max_features: MaxFeatures::Sqrt,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            criterion: SplitCriterion::Gini,
            aggregation: Aggregation::MajorityVote,
            seed: 42,
        })
    }

    #[must_use]
    pub fn with_max_features(mut self, max_features: MaxFeatures) -> Self {
        self.max_features = max_features;
        self
    }

    /// Set the maximum tree depth. `None` means unlimited.
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

    #[must_use]
    pub fn with_criterion(mut self, criterion: SplitCriterion) -> Self {
        self.criterion = criterion;
        self
    }

    #[must_use]
    pub fn with_aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregation = aggregation;
        self
    }

    /// Set the master seed; per-tree seeds are drawn from it.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.n_trees
    }

    #[must_use]
    pub fn max_features(&self) -> MaxFeatures {
        self.max_features
    }

    #[must_use]
    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    #[must_use]
    pub fn aggregation(&self) -> Aggregation {
        self.aggregation
    }

    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Train a Random Forest.
    ///
    /// `features[sample][feature]` is row-major; `labels[sample]` are
    /// zero-based class labels; `feature_names` names each column in order
    /// and is stored in the fitted model.
    ///
    /// # Errors
    ///
    /// | Variant                            | When                                             |
    /// |------------------------------------|--------------------------------------------------|
    /// | [`RfError::EmptyDataset`]          | `features` is empty                              |
    /// | [`RfError::LabelCountMismatch`]    | `features` and `labels` differ in length         |
    /// | [`RfError::ZeroFeatures`]          | rows have zero feature columns                   |
    /// | [`RfError::FeatureCountMismatch`]  | rows have inconsistent lengths                   |
    /// | [`RfError::FeatureNameMismatch`]   | `feature_names` length differs from row width    |
    /// | [`RfError::NonFiniteValue`]        | any value is NaN or infinite                     |
    /// | [`RfError::SingleClass`]           | fewer than two distinct labels                   |
    /// | [`RfError::InvalidMaxFeatures`]    | resolved max_features outside `[1, n_features]`  |
    /// | other config variants              | invalid depth / split / leaf settings            |
    pub fn fit(
        &self,
        features: &[Vec<f64>],
        labels: &[usize],
        feature_names: &[String],
    ) -> Result<RandomForestResult, RfError> {
        crate::forest::train(self, features, labels, feature_names)
    }
}
