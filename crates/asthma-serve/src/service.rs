//! The prediction service shared by every request handler.

use std::path::Path;
use std::sync::Arc;

use asthma_io::{ArtifactName, FeatureOrder, model_path, read_feature_order};
use asthma_rf::RandomForest;
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::classifier::Classifier;
use crate::error::ServeError;
use crate::report::{Language, Report};
use crate::request::PredictRequest;

/// Predicted label with its class probabilities.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub prediction: usize,
    pub probabilities: Vec<f64>,
}

/// An immutable model plus the feature order its inputs follow.
///
/// Cloning shares the model.
#[derive(Clone)]
pub struct PredictionService {
    classifier: Arc<dyn Classifier>,
    feature_order: Arc<FeatureOrder>,
}

impl std::fmt::Debug for PredictionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PredictionService")
            .field("feature_order", &self.feature_order)
            .finish_non_exhaustive()
    }
}

impl PredictionService {
    /// # Errors
    ///
    /// [`ServeError::FeatureMismatch`] when the classifier's input width
    /// differs from the feature order's length.
    pub fn new(
        classifier: Arc<dyn Classifier>,
        feature_order: FeatureOrder,
    ) -> Result<Self, ServeError> {
        if classifier.n_features() != feature_order.len() {
            return Err(ServeError::FeatureMismatch {
                model: (0..classifier.n_features()).map(|i| format!("f{i}")).collect(),
                features: feature_order.names().to_vec(),
            });
        }
        Ok(Self {
            classifier,
            feature_order: Arc::new(feature_order),
        })
    }

    #[must_use]
    pub fn feature_order(&self) -> &FeatureOrder {
        &self.feature_order
    }

    /// Validate a request and lay it out in feature order.
    ///
    /// # Errors
    ///
    /// [`ServeError::PredictionInput`] as for [`PredictRequest::into_features`].
    pub fn features(&self, request: PredictRequest) -> Result<Vec<f64>, ServeError> {
        request.into_features(&self.feature_order)
    }

    /// Hard label for values already in feature order.
    ///
    /// # Errors
    ///
    /// [`ServeError::PredictionInput`] on a wrong width, [`ServeError::InternalModel`]
    /// if the classifier fails.
    pub fn predict(&self, features: &[f64]) -> Result<usize, ServeError> {
        self.check_width(features)?;
        self.classifier
            .predict(features)
            .map_err(|source| ServeError::InternalModel { source })
    }

    /// Label and class probabilities for values already in feature order.
    ///
    /// The label is the most probable class, ties going to the lower class,
    /// so the model is evaluated once.
    ///
    /// # Errors
    ///
    /// As [`PredictionService::predict`].
    pub fn predict_proba(&self, features: &[f64]) -> Result<Prediction, ServeError> {
        self.check_width(features)?;
        let probabilities = self
            .classifier
            .predict_proba(features)
            .map_err(|source| ServeError::InternalModel { source })?;
        let prediction = most_probable(&probabilities);
        debug!(prediction, ?probabilities, "prediction served");
        Ok(Prediction {
            prediction,
            probabilities,
        })
    }

    /// Predict and build the text report.
    ///
    /// # Errors
    ///
    /// As [`PredictionService::predict`].
    pub fn report(&self, features: &[f64], language: Language) -> Result<(Prediction, Report), ServeError> {
        let prediction = self.predict_proba(features)?;
        let report = Report::new(language, self.feature_order.names(), features, &prediction);
        Ok((prediction, report))
    }

    fn check_width(&self, features: &[f64]) -> Result<(), ServeError> {
        if features.len() != self.feature_order.len() {
            return Err(ServeError::input(format!(
                "expected {} values, got {}",
                self.feature_order.len(),
                features.len()
            )));
        }
        Ok(())
    }
}

/// A saved forest and its feature order, checked against each other.
#[derive(Debug, Clone)]
pub struct ModelArtifacts {
    pub forest: RandomForest,
    pub feature_order: FeatureOrder,
}

impl ModelArtifacts {
    /// Load `{name}_model.bin` and `{name}_features.json` from `dir`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ServeError::LoadModel`] | model missing, corrupt or from another format version |
    /// | [`ServeError::LoadFeatures`] | feature file missing or invalid |
    /// | [`ServeError::FeatureMismatch`] | the model was trained on different columns |
    #[instrument(skip_all, fields(dir = %dir.display(), name = %name))]
    pub fn load(dir: &Path, name: &ArtifactName) -> Result<Self, ServeError> {
        let forest = RandomForest::load(model_path(dir, name))
            .map_err(|source| ServeError::LoadModel { source })?;
        let feature_order =
            read_feature_order(dir, name).map_err(|source| ServeError::LoadFeatures { source })?;
        if forest.feature_names() != feature_order.names() {
            return Err(ServeError::FeatureMismatch {
                model: forest.feature_names().to_vec(),
                features: feature_order.names().to_vec(),
            });
        }
        info!(
            n_trees = forest.n_trees(),
            n_features = feature_order.len(),
            "model artifacts loaded"
        );
        Ok(Self {
            forest,
            feature_order,
        })
    }

    /// # Errors
    ///
    /// Never fails for artifacts returned by [`ModelArtifacts::load`].
    pub fn into_service(self) -> Result<PredictionService, ServeError> {
        PredictionService::new(Arc::new(self.forest), self.feature_order)
    }
}

fn most_probable(probabilities: &[f64]) -> usize {
    let mut best = 0;
    for (class, p) in probabilities.iter().enumerate() {
        if *p > probabilities[best] {
            best = class;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use asthma_rf::RfError;

    /// Predicts asthma when the first value exceeds 50.
    struct Threshold;

    impl Classifier for Threshold {
        fn n_features(&self) -> usize {
            7
        }
        fn predict(&self, sample: &[f64]) -> Result<usize, RfError> {
            Ok(usize::from(sample[0] > 50.0))
        }
        fn predict_proba(&self, sample: &[f64]) -> Result<Vec<f64>, RfError> {
            Ok(if sample[0] > 50.0 { vec![0.2, 0.8] } else { vec![0.9, 0.1] })
        }
    }

    struct Broken;

    impl Classifier for Broken {
        fn n_features(&self) -> usize {
            7
        }
        fn predict(&self, _: &[f64]) -> Result<usize, RfError> {
            Err(RfError::EmptyDataset)
        }
        fn predict_proba(&self, _: &[f64]) -> Result<Vec<f64>, RfError> {
            Err(RfError::EmptyDataset)
        }
    }

    /// Only answers with probabilities; a hard-label call is a failure.
    struct ProbabilitiesOnly(Vec<f64>);

    impl Classifier for ProbabilitiesOnly {
        fn n_features(&self) -> usize {
            7
        }
        fn predict(&self, _: &[f64]) -> Result<usize, RfError> {
            Err(RfError::EmptyDataset)
        }
        fn predict_proba(&self, _: &[f64]) -> Result<Vec<f64>, RfError> {
            Ok(self.0.clone())
        }
    }

    fn service(classifier: impl Classifier + 'static) -> PredictionService {
        PredictionService::new(Arc::new(classifier), FeatureOrder::selected()).unwrap()
    }

    #[test]
    fn predicts_through_the_classifier() {
        let svc = service(Threshold);
        let p = svc.predict_proba(&[70.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0]).unwrap();
        assert_eq!(p.prediction, 1);
        assert_eq!(p.probabilities, vec![0.2, 0.8]);
        assert_eq!(svc.predict(&[25.0, 6.0, 6.0, 7.0, 5.0, 4.0, 8.0]).unwrap(), 0);
    }

    #[test]
    fn probabilities_decide_the_label_in_one_pass() {
        let sample = [25.0, 6.0, 6.0, 7.0, 5.0, 4.0, 8.0];
        let p = service(ProbabilitiesOnly(vec![0.3, 0.7])).predict_proba(&sample).unwrap();
        assert_eq!(p.prediction, 1);
        let tie = service(ProbabilitiesOnly(vec![0.5, 0.5])).predict_proba(&sample).unwrap();
        assert_eq!(tie.prediction, 0);
        assert_eq!(tie.probabilities, vec![0.5, 0.5]);
    }

    #[test]
    fn wrong_width_is_input_error_not_model_error() {
        let err = service(Broken).predict(&[1.0; 3]).unwrap_err();
        assert!(matches!(err, ServeError::PredictionInput { .. }));
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn classifier_failure_is_internal() {
        let err = service(Broken).predict(&[1.0; 7]).unwrap_err();
        assert!(matches!(err, ServeError::InternalModel { .. }));
        assert_eq!(err.status(), axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn feature_order_width_must_match_model() {
        let order = FeatureOrder::new(vec!["Age".into()]).unwrap();
        assert!(matches!(
            PredictionService::new(Arc::new(Threshold), order),
            Err(ServeError::FeatureMismatch { .. })
        ));
    }

    #[test]
    fn clones_share_the_model() {
        let svc = service(Threshold);
        let clone = svc.clone();
        assert!(Arc::ptr_eq(&svc.classifier, &clone.classifier));
    }
}
