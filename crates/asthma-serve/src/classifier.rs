use asthma_rf::{RandomForest, RfError};

/// A trained binary classifier behind the prediction service.
pub trait Classifier: Send + Sync {
    /// Number of inputs a sample must have.
    fn n_features(&self) -> usize;

    /// Hard label for one sample.
    fn predict(&self, sample: &[f64]) -> Result<usize, RfError>;

    /// Per-class probabilities for one sample, summing to 1.
    fn predict_proba(&self, sample: &[f64]) -> Result<Vec<f64>, RfError>;
}

impl Classifier for RandomForest {
    fn n_features(&self) -> usize {
        RandomForest::n_features(self)
    }

    fn predict(&self, sample: &[f64]) -> Result<usize, RfError> {
        RandomForest::predict(self, sample)
    }

    fn predict_proba(&self, sample: &[f64]) -> Result<Vec<f64>, RfError> {
        Ok(RandomForest::predict_proba(self, sample)?.into_vec())
    }
}
