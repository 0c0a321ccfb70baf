//! Prediction methods for the Random Forest ensemble.

use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::config::Aggregation;
use crate::error::RfError;
use crate::forest::RandomForest;
use crate::node::majority_class;

/// Class probability distribution from a prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDistribution {
    probs: Vec<f64>,
}

impl ClassDistribution {
    pub(crate) fn new(probs: Vec<f64>) -> Self {
        Self { probs }
    }

    /// Most probable class; ties resolve to the lowest class index.
    #[must_use]
    pub fn predicted_class(&self) -> usize {
        let mut best = 0;
        for (class, p) in self.probs.iter().enumerate() {
            if *p > self.probs[best] {
                best = class;
            }
        }
        best
    }

    /// Probability of `class`, or 0.0 for a class the model never saw.
    #[must_use]
    pub fn probability(&self, class: usize) -> f64 {
        self.probs.get(class).copied().unwrap_or(0.0)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.probs
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<f64> {
        self.probs
    }
}

impl RandomForest {
    /// Predict the class label for a single sample.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::PredictionFeatureMismatch`] when `sample.len() != n_features`.
    pub fn predict(&self, sample: &[f64]) -> Result<usize, RfError> {
        match self.aggregation {
            Aggregation::MajorityVote => Ok(majority_class(&self.votes(sample)?)),
            Aggregation::SoftVote => Ok(self.predict_proba(sample)?.predicted_class()),
        }
    }

    /// Class probabilities for a single sample.
    ///
    /// Under [`Aggregation::MajorityVote`] this is the fraction of trees
    /// voting for each class; under [`Aggregation::SoftVote`] it is the mean
    /// of the trees' leaf distributions. Either way it sums to 1.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::PredictionFeatureMismatch`] when `sample.len() != n_features`.
    pub fn predict_proba(&self, sample: &[f64]) -> Result<ClassDistribution, RfError> {
        let n_trees = self.trees.len() as f64;
        let probs = match self.aggregation {
            Aggregation::MajorityVote => self
                .votes(sample)?
                .into_iter()
                .map(|v| v as f64 / n_trees)
                .collect(),
            Aggregation::SoftVote => {
                self.check_width(sample)?;
                let mut sum = vec![0.0f64; self.n_classes];
                for tree in &self.trees {
                    for (acc, p) in sum.iter_mut().zip(tree.predict_proba(sample)?) {
                        *acc += p;
                    }
                }
                sum.into_iter().map(|s| s / n_trees).collect()
            }
        };
        Ok(ClassDistribution::new(probs))
    }

    /// Per-class vote counts across all trees.
    fn votes(&self, sample: &[f64]) -> Result<Vec<usize>, RfError> {
        self.check_width(sample)?;
        let mut votes = vec![0usize; self.n_classes];
        for tree in &self.trees {
            votes[tree.predict(sample)?] += 1;
        }
        Ok(votes)
    }

    fn check_width(&self, sample: &[f64]) -> Result<(), RfError> {
        if sample.len() != self.n_features {
            return Err(RfError::PredictionFeatureMismatch {
                expected: self.n_features,
                got: sample.len(),
            });
        }
        Ok(())
    }

    /// Predict class labels for a batch of samples in parallel.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::PredictionFeatureMismatch`] if any sample has the wrong feature count.
    pub fn predict_batch(&self, features: &[Vec<f64>]) -> Result<Vec<usize>, RfError> {
        features
            .into_par_iter()
            .map(|sample| self.predict(sample))
            .collect()
    }

    /// Probability distributions for a batch of samples in parallel.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::PredictionFeatureMismatch`] if any sample has the wrong feature count.
    pub fn predict_proba_batch(
        &self,
        features: &[Vec<f64>],
    ) -> Result<Vec<ClassDistribution>, RfError> {
        features
            .into_par_iter()
            .map(|sample| self.predict_proba(sample))
            .collect()
    }

    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Feature names in the column order the model was fit on.
    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    #[must_use]
    pub fn aggregation(&self) -> Aggregation {
        self.aggregation
    }
}
