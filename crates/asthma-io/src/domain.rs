//! Domain types for asthma-io.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::IoError;

/// Survey columns the model is trained on, in model input order.
pub const SELECTED_FEATURES: [&str; 7] = [
    "Age",
    "PollutionExposure",
    "PollenExposure",
    "SleepQuality",
    "PhysicalActivity",
    "DustExposure",
    "DietQuality",
];

/// Binary diagnosis column: 1 = asthma, 0 = no asthma.
pub const LABEL_COLUMN: &str = "Diagnosis";

/// Smoke-test input in [`SELECTED_FEATURES`] order.
pub const EXAMPLE_RECORD: [f64; 7] = [25.0, 6.0, 6.0, 7.0, 5.0, 4.0, 8.0];

/// Ordered feature names that fix the column layout of every model input.
///
/// Serialized as a plain JSON array of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct FeatureOrder(Vec<String>);

impl FeatureOrder {
    /// # Errors
    ///
    /// Returns [`IoError::InvalidFeatureOrder`] if `names` is empty or has a
    /// duplicate.
    pub fn new(names: Vec<String>) -> Result<Self, IoError> {
        if names.is_empty() {
            return Err(IoError::InvalidFeatureOrder {
                reason: "no features".into(),
            });
        }
        let mut seen = HashSet::new();
        if let Some(dup) = names.iter().find(|n| !seen.insert(n.as_str())) {
            return Err(IoError::InvalidFeatureOrder {
                reason: format!("duplicate feature \"{dup}\""),
            });
        }
        Ok(Self(names))
    }

    /// The seven survey features the pipeline selects.
    #[must_use]
    pub fn selected() -> Self {
        Self(SELECTED_FEATURES.iter().map(|&s| s.to_owned()).collect())
    }

    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Column index of `name`, if it is part of the order.
    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.0.iter().position(|n| n == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl Default for FeatureOrder {
    fn default() -> Self {
        Self::selected()
    }
}

impl TryFrom<Vec<String>> for FeatureOrder {
    type Error = IoError;

    fn try_from(names: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(names)
    }
}

impl From<FeatureOrder> for Vec<String> {
    fn from(order: FeatureOrder) -> Self {
        order.0
    }
}

/// A validated artifact name used as the prefix of every output file.
///
/// Must match `[a-zA-Z0-9_-]+`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactName(String);

impl ArtifactName {
    /// # Errors
    ///
    /// Returns [`IoError::InvalidArtifactName`] if the name is empty or
    /// contains characters outside `[a-zA-Z0-9_-]`.
    pub fn new(name: String) -> Result<Self, IoError> {
        if name.is_empty()
            || !name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(IoError::InvalidArtifactName { name });
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ArtifactName {
    fn default() -> Self {
        Self("asthma".into())
    }
}

impl std::fmt::Display for ArtifactName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Labelled survey rows restricted to the selected features.
///
/// Produced by [`SurveyReader`](crate::SurveyReader). `features[i]` is laid
/// out in [`FeatureOrder`] order and `labels[i]` is its diagnosis.
#[derive(Debug, Clone)]
pub struct SurveyDataset {
    feature_order: FeatureOrder,
    features: Vec<Vec<f64>>,
    labels: Vec<usize>,
}

impl SurveyDataset {
    pub(crate) fn new(feature_order: FeatureOrder, features: Vec<Vec<f64>>, labels: Vec<usize>) -> Self {
        Self {
            feature_order,
            features,
            labels,
        }
    }

    #[must_use]
    pub fn feature_order(&self) -> &FeatureOrder {
        &self.feature_order
    }

    /// Feature matrix, row-major.
    #[must_use]
    pub fn features(&self) -> &[Vec<f64>] {
        &self.features
    }

    #[must_use]
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    #[must_use]
    pub fn n_samples(&self) -> usize {
        self.labels.len()
    }

    #[must_use]
    pub fn n_features(&self) -> usize {
        self.feature_order.len()
    }

    /// `(label, proportion)` for each label present, in ascending label order.
    #[must_use]
    pub fn class_distribution(&self) -> Vec<(usize, f64)> {
        let n_classes = self.labels.iter().max().map_or(0, |&m| m + 1);
        let mut counts = vec![0usize; n_classes];
        for &label in &self.labels {
            counts[label] += 1;
        }
        let total = self.labels.len() as f64;
        counts
            .into_iter()
            .enumerate()
            .filter(|&(_, c)| c > 0)
            .map(|(label, c)| (label, c as f64 / total))
            .collect()
    }

    /// Split into `(feature order, features, labels)`.
    #[must_use]
    pub fn into_parts(self) -> (FeatureOrder, Vec<Vec<f64>>, Vec<usize>) {
        (self.feature_order, self.features, self.labels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selected_order_matches_constant() {
        let order = FeatureOrder::selected();
        assert_eq!(order.len(), 7);
        assert_eq!(order.position("Age"), Some(0));
        assert_eq!(order.position("DietQuality"), Some(6));
        assert_eq!(order.position("Diagnosis"), None);
    }

    #[test]
    fn feature_order_rejects_duplicates_and_empty() {
        assert!(matches!(
            FeatureOrder::new(vec![]),
            Err(IoError::InvalidFeatureOrder { .. })
        ));
        assert!(matches!(
            FeatureOrder::new(vec!["Age".into(), "Age".into()]),
            Err(IoError::InvalidFeatureOrder { .. })
        ));
    }

    #[test]
    fn feature_order_json_is_a_plain_array() {
        let json = serde_json::to_string(&FeatureOrder::selected()).unwrap();
        assert!(json.starts_with("[\"Age\",\"PollutionExposure\""));
        let back: FeatureOrder = serde_json::from_str(&json).unwrap();
        assert_eq!(back, FeatureOrder::selected());
        assert!(serde_json::from_str::<FeatureOrder>("[\"a\",\"a\"]").is_err());
    }

    #[test]
    fn artifact_name_valid() {
        let name = ArtifactName::new("run-2024_01".to_string()).unwrap();
        assert_eq!(name.as_str(), "run-2024_01");
        assert_eq!(ArtifactName::default().as_str(), "asthma");
    }

    #[test]
    fn artifact_name_rejects_empty_and_special_chars() {
        for bad in ["", "my run!", "../escape"] {
            assert!(matches!(
                ArtifactName::new(bad.to_string()),
                Err(IoError::InvalidArtifactName { .. })
            ));
        }
    }

    #[test]
    fn class_distribution_is_normalized() {
        let ds = SurveyDataset::new(
            FeatureOrder::new(vec!["x".into()]).unwrap(),
            vec![vec![0.0]; 4],
            vec![0, 0, 0, 1],
        );
        assert_eq!(ds.class_distribution(), vec![(0, 0.75), (1, 0.25)]);
    }
}
