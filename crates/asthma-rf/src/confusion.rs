//! Confusion matrix for multi-class classification.

use std::fmt;

use crate::error::RfError;

/// Entry `[true_class][predicted_class]` counts samples with that outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfusionMatrix {
    matrix: Vec<Vec<usize>>,
}

impl ConfusionMatrix {
    /// Build a confusion matrix from paired true and predicted labels.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`RfError::EmptyDataset`] | zero labels |
    /// | [`RfError::LabelCountMismatch`] | the two slices differ in length |
    /// | [`RfError::LabelOutOfRange`] | a label is `>= n_classes` |
    pub fn from_labels(
        true_labels: &[usize],
        predicted: &[usize],
        n_classes: usize,
    ) -> Result<Self, RfError> {
        if true_labels.is_empty() {
            return Err(RfError::EmptyDataset);
        }
        if true_labels.len() != predicted.len() {
            return Err(RfError::LabelCountMismatch {
                n_rows: predicted.len(),
                n_labels: true_labels.len(),
            });
        }
        let mut matrix = vec![vec![0usize; n_classes]; n_classes];
        for (position, (&t, &p)) in true_labels.iter().zip(predicted).enumerate() {
            if let Some(label) = [t, p].into_iter().find(|&l| l >= n_classes) {
                return Err(RfError::LabelOutOfRange {
                    label,
                    position,
                    n_classes,
                });
            }
            matrix[t][p] += 1;
        }
        Ok(Self { matrix })
    }

    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.matrix.len()
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.matrix.iter().flatten().sum()
    }

    /// Fraction of samples on the diagonal.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        let correct: usize = (0..self.n_classes()).map(|c| self.matrix[c][c]).sum();
        correct as f64 / self.total() as f64
    }

    #[must_use]
    pub fn true_positives(&self, class: usize) -> usize {
        self.matrix[class][class]
    }

    /// Samples predicted as `class` (column sum).
    #[must_use]
    pub fn predicted_count(&self, class: usize) -> usize {
        self.matrix.iter().map(|row| row[class]).sum()
    }

    /// Samples whose true label is `class` (row sum).
    #[must_use]
    pub fn support(&self, class: usize) -> usize {
        self.matrix[class].iter().sum()
    }

    #[must_use]
    pub fn as_rows(&self) -> &[Vec<usize>] {
        &self.matrix
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>8}", "")?;
        for j in 0..self.n_classes() {
            write!(f, " pred_{j:>3}")?;
        }
        writeln!(f)?;
        for (i, row) in self.matrix.iter().enumerate() {
            write!(f, "true_{i:>3}")?;
            for val in row {
                write!(f, " {val:>8}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
