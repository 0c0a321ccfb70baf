//! Synthetic Minority Over-sampling (SMOTE).

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use tracing::{debug, info, instrument};

use crate::error::ResampleError;
use crate::{check_shape, group_by_class};

/// Balanced output of [`Smote::fit_resample`].
///
/// The first `features.len() - n_synthetic` rows are the input rows in their
/// original order; the synthetic rows follow.
#[derive(Debug, Clone, PartialEq)]
pub struct Resampled {
    pub features: Vec<Vec<f64>>,
    pub labels: Vec<usize>,
    pub n_synthetic: usize,
}

/// SMOTE oversampler.
///
/// Every class below the majority count receives `majority - count`
/// synthetic rows interpolated between a random member and one of its
/// `k_neighbors` nearest same-class neighbors.
#[derive(Debug, Clone)]
pub struct Smote {
    k_neighbors: usize,
    seed: u64,
}

impl Default for Smote {
    fn default() -> Self {
        Self {
            k_neighbors: 5,
            seed: 42,
        }
    }
}

impl Smote {
    /// # Errors
    ///
    /// Returns [`ResampleError::InvalidNeighborCount`] if `k_neighbors` is 0.
    pub fn new(k_neighbors: usize) -> Result<Self, ResampleError> {
        if k_neighbors == 0 {
            return Err(ResampleError::InvalidNeighborCount { k: k_neighbors });
        }
        Ok(Self {
            k_neighbors,
            ..Self::default()
        })
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn k_neighbors(&self) -> usize {
        self.k_neighbors
    }

    /// Oversample every minority class up to the majority count.
    ///
    /// Classes are processed in ascending label order from a single seeded
    /// generator, so the output is a pure function of the input and the seed.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ResampleError::EmptyDataset`] | zero rows |
    /// | [`ResampleError::LengthMismatch`] | rows and labels differ in length |
    /// | [`ResampleError::RaggedRow`] | rows differ in width |
    /// | [`ResampleError::InsufficientSamples`] | a class to oversample has `<= k_neighbors` members |
    #[instrument(skip_all, fields(n_samples = features.len(), k = self.k_neighbors))]
    pub fn fit_resample(
        &self,
        features: &[Vec<f64>],
        labels: &[usize],
    ) -> Result<Resampled, ResampleError> {
        check_shape(features, labels)?;
        let groups = group_by_class(labels);
        let majority = groups.iter().map(Vec::len).max().unwrap_or(0);

        for (class, members) in groups.iter().enumerate() {
            let count = members.len();
            if count > 0 && count < majority && count <= self.k_neighbors {
                return Err(ResampleError::InsufficientSamples {
                    class,
                    count,
                    required: self.k_neighbors + 1,
                });
            }
        }

        let mut out_features = features.to_vec();
        let mut out_labels = labels.to_vec();
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);

        for (class, members) in groups.iter().enumerate() {
            if members.is_empty() || members.len() == majority {
                continue;
            }
            let needed = majority - members.len();
            let neighbors = nearest_neighbors(features, members, self.k_neighbors);
            debug!(class, count = members.len(), needed, "synthesizing minority rows");

            for _ in 0..needed {
                let i = rng.gen_range(0..members.len());
                let nn = neighbors[i][rng.gen_range(0..self.k_neighbors)];
                let gap: f64 = rng.r#gen();
                let base = &features[members[i]];
                let toward = &features[nn];
                out_features.push(
                    base.iter()
                        .zip(toward)
                        .map(|(a, b)| a + gap * (b - a))
                        .collect(),
                );
                out_labels.push(class);
            }
        }

        let n_synthetic = out_features.len() - features.len();
        info!(n_synthetic, majority, "class balance restored");
        Ok(Resampled {
            features: out_features,
            labels: out_labels,
            n_synthetic,
        })
    }
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
}

/// For each member, the dataset indices of its `k` nearest other members.
///
/// Distance ties resolve to the lower dataset index.
fn nearest_neighbors(features: &[Vec<f64>], members: &[usize], k: usize) -> Vec<Vec<usize>> {
    members
        .par_iter()
        .map(|&a| {
            let mut candidates: Vec<(f64, usize)> = members
                .iter()
                .filter(|&&b| b != a)
                .map(|&b| (squared_distance(&features[a], &features[b]), b))
                .collect();
            candidates.sort_by(|x, y| x.0.total_cmp(&y.0).then(x.1.cmp(&y.1)));
            candidates.into_iter().take(k).map(|(_, b)| b).collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn imbalanced() -> (Vec<Vec<f64>>, Vec<usize>) {
        let mut features = Vec::new();
        let mut labels = Vec::new();
        for i in 0..30 {
            features.push(vec![i as f64, 10.0 + (i % 4) as f64]);
            labels.push(0);
        }
        for i in 0..8 {
            features.push(vec![100.0 + i as f64, -(i as f64)]);
            labels.push(1);
        }
        (features, labels)
    }

    #[test]
    fn classes_end_up_equal_and_originals_are_kept() {
        let (features, labels) = imbalanced();
        let out = Smote::default().fit_resample(&features, &labels).unwrap();

        assert_eq!(out.n_synthetic, 22);
        assert_eq!(out.labels.iter().filter(|&&l| l == 0).count(), 30);
        assert_eq!(out.labels.iter().filter(|&&l| l == 1).count(), 30);
        assert_eq!(&out.features[..features.len()], features.as_slice());
        assert_eq!(&out.labels[..labels.len()], labels.as_slice());
        assert!(out.labels[labels.len()..].iter().all(|&l| l == 1));
    }

    #[test]
    fn synthetic_rows_lie_within_the_minority_hull() {
        let (features, labels) = imbalanced();
        let out = Smote::default().fit_resample(&features, &labels).unwrap();
        for row in &out.features[features.len()..] {
            assert!((100.0..=107.0).contains(&row[0]), "{row:?}");
            assert!((-7.0..=0.0).contains(&row[1]), "{row:?}");
        }
    }

    #[test]
    fn seeded_runs_are_identical() {
        let (features, labels) = imbalanced();
        let a = Smote::default().with_seed(9).fit_resample(&features, &labels).unwrap();
        let b = Smote::default().with_seed(9).fit_resample(&features, &labels).unwrap();
        let c = Smote::default().with_seed(10).fit_resample(&features, &labels).unwrap();
        assert_eq!(a, b);
        assert_ne!(a.features, c.features);
    }

    #[test]
    fn balanced_input_is_returned_unchanged() {
        let features = vec![vec![0.0], vec![1.0], vec![2.0], vec![3.0]];
        let labels = vec![0, 1, 1, 0];
        let out = Smote::default().fit_resample(&features, &labels).unwrap();
        assert_eq!(out.features, features);
        assert_eq!(out.labels, labels);
        assert_eq!(out.n_synthetic, 0);
    }

    #[test]
    fn minority_must_exceed_k() {
        let (mut features, mut labels) = imbalanced();
        features.truncate(35);
        labels.truncate(35);
        let err = Smote::default().fit_resample(&features, &labels).unwrap_err();
        assert!(matches!(
            err,
            ResampleError::InsufficientSamples { class: 1, count: 5, required: 6 }
        ));
        assert!(Smote::new(4).unwrap().fit_resample(&features, &labels).is_ok());
    }

    #[test]
    fn shape_errors() {
        assert!(matches!(
            Smote::default().fit_resample(&[], &[]),
            Err(ResampleError::EmptyDataset)
        ));
        assert!(matches!(
            Smote::default().fit_resample(&[vec![1.0]], &[0, 1]),
            Err(ResampleError::LengthMismatch { n_rows: 1, n_labels: 2 })
        ));
        assert!(matches!(
            Smote::default().fit_resample(&[vec![1.0], vec![1.0, 2.0]], &[0, 1]),
            Err(ResampleError::RaggedRow { row: 1, .. })
        ));
        assert!(matches!(Smote::new(0), Err(ResampleError::InvalidNeighborCount { k: 0 })));
    }

    #[test]
    fn neighbors_exclude_self_and_prefer_closest() {
        let features = vec![vec![0.0], vec![1.0], vec![5.0], vec![1.5]];
        let nn = nearest_neighbors(&features, &[0, 1, 2, 3], 2);
        assert_eq!(nn[0], vec![1, 3]);
        assert_eq!(nn[2], vec![3, 1]);
        assert!(nn.iter().enumerate().all(|(i, n)| !n.contains(&i)));
    }
}
