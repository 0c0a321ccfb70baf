//! Resampling for imbalanced tabular classification.
//!
//! [`Smote`] synthesizes minority-class rows by interpolating between
//! same-class nearest neighbors until every class matches the majority
//! count. [`StratifiedSplit`] then partitions the balanced data into
//! train/test sets that preserve the label proportions. Both are seeded
//! with ChaCha8 and deterministic for a given seed.

mod error;
mod smote;
mod split;

pub use error::ResampleError;
pub use smote::{Resampled, Smote};
pub use split::{SplitIndices, StratifiedSplit, TrainTestSplit};

/// Validate a row-major matrix against its labels and return the row width.
pub(crate) fn check_shape(features: &[Vec<f64>], labels: &[usize]) -> Result<usize, ResampleError> {
    if features.is_empty() {
        return Err(ResampleError::EmptyDataset);
    }
    if features.len() != labels.len() {
        return Err(ResampleError::LengthMismatch {
            n_rows: features.len(),
            n_labels: labels.len(),
        });
    }
    let expected = features[0].len();
    if let Some((row, r)) = features.iter().enumerate().find(|(_, r)| r.len() != expected) {
        return Err(ResampleError::RaggedRow {
            row,
            expected,
            got: r.len(),
        });
    }
    Ok(expected)
}

/// Sample indices grouped by label; `groups[label]` is in ascending order.
pub(crate) fn group_by_class(labels: &[usize]) -> Vec<Vec<usize>> {
    let n_classes = labels.iter().max().map_or(0, |&m| m + 1);
    let mut groups = vec![Vec::new(); n_classes];
    for (i, &label) in labels.iter().enumerate() {
        groups[label].push(i);
    }
    groups
}
