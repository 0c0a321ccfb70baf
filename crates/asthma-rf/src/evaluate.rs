//! Held-out evaluation: per-class precision, recall, F1 and accuracy.

use std::fmt;

use tracing::{info, instrument};

use crate::confusion::ConfusionMatrix;
use crate::error::RfError;
use crate::forest::RandomForest;

/// Per-class precision, recall, F1 score and support.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ClassMetrics {
    pub class: usize,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Number of true samples in this class.
    pub support: usize,
}

/// Unweighted or support-weighted mean over classes.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct AveragedMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Classification report for a model on a labelled test set.
///
/// Ratios with a zero denominator take the `zero_division` value instead of
/// NaN: precision when nothing was predicted as the class, recall when the
/// class has no true samples, and F1 when both are true.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ClassificationReport {
    pub classes: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub macro_avg: AveragedMetrics,
    pub weighted_avg: AveragedMetrics,
    pub zero_division: f64,
    pub confusion_matrix: Vec<Vec<usize>>,
}

impl ClassificationReport {
    /// Default fallback for undefined precision/recall.
    pub const DEFAULT_ZERO_DIVISION: f64 = 1.0;

    /// Derive the report from a confusion matrix.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::InvalidZeroDivision`] unless `zero_division` is in `[0, 1]`.
    pub fn from_confusion(cm: &ConfusionMatrix, zero_division: f64) -> Result<Self, RfError> {
        if !(0.0..=1.0).contains(&zero_division) {
            return Err(RfError::InvalidZeroDivision {
                value: zero_division,
            });
        }
        let ratio = |num: usize, den: usize| {
            if den == 0 {
                zero_division
            } else {
                num as f64 / den as f64
            }
        };

        let classes: Vec<ClassMetrics> = (0..cm.n_classes())
            .map(|class| {
                let tp = cm.true_positives(class);
                let predicted = cm.predicted_count(class);
                let support = cm.support(class);
                let precision = ratio(tp, predicted);
                let recall = ratio(tp, support);
                let f1 = if predicted == 0 && support == 0 {
                    zero_division
                } else if precision + recall == 0.0 {
                    0.0
                } else {
                    2.0 * precision * recall / (precision + recall)
                };
                ClassMetrics {
                    class,
                    precision,
                    recall,
                    f1,
                    support,
                }
            })
            .collect();

        let total = cm.total();
        let n = classes.len() as f64;
        let macro_avg = AveragedMetrics {
            precision: classes.iter().map(|m| m.precision).sum::<f64>() / n,
            recall: classes.iter().map(|m| m.recall).sum::<f64>() / n,
            f1: classes.iter().map(|m| m.f1).sum::<f64>() / n,
            support: total,
        };
        let weighted = |metric: fn(&ClassMetrics) -> f64| {
            classes
                .iter()
                .map(|m| metric(m) * m.support as f64)
                .sum::<f64>()
                / total as f64
        };
        let weighted_avg = AveragedMetrics {
            precision: weighted(|m| m.precision),
            recall: weighted(|m| m.recall),
            f1: weighted(|m| m.f1),
            support: total,
        };

        Ok(Self {
            accuracy: cm.accuracy(),
            classes,
            macro_avg,
            weighted_avg,
            zero_division,
            confusion_matrix: cm.as_rows().to_vec(),
        })
    }

    /// Score `forest` on a held-out set.
    ///
    /// # Errors
    ///
    /// Prediction errors, [`RfError::LabelOutOfRange`] for test labels the
    /// model has no class for, and the errors of [`Self::from_confusion`].
    #[instrument(skip_all, fields(n_test = labels.len()))]
    pub fn evaluate(
        forest: &RandomForest,
        features: &[Vec<f64>],
        labels: &[usize],
        zero_division: f64,
    ) -> Result<Self, RfError> {
        let predicted = forest.predict_batch(features)?;
        let cm = ConfusionMatrix::from_labels(labels, &predicted, forest.n_classes())?;
        let report = Self::from_confusion(&cm, zero_division)?;
        info!(accuracy = report.accuracy, "held-out evaluation complete");
        Ok(report)
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>12} {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;
        for m in &self.classes {
            writeln!(
                f,
                "{:>12} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                m.class, m.precision, m.recall, m.f1, m.support
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>12} {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy", "", "", self.accuracy, self.macro_avg.support
        )?;
        for (name, avg) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(
                f,
                "{:>12} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                name, avg.precision, avg.recall, avg.f1, avg.support
            )?;
        }
        Ok(())
    }
}
