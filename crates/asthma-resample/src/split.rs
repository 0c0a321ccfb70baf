//! Stratified train/test partitioning.

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, instrument};

use crate::error::ResampleError;
use crate::group_by_class;

/// Row indices of each partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Materialized partitions, in the same order as [`SplitIndices`].
#[derive(Debug, Clone, PartialEq)]
pub struct TrainTestSplit {
    pub x_train: Vec<Vec<f64>>,
    pub x_test: Vec<Vec<f64>>,
    pub y_train: Vec<usize>,
    pub y_test: Vec<usize>,
}

impl SplitIndices {
    /// Copy the selected rows out of `features` and `labels`.
    ///
    /// # Panics
    ///
    /// Panics if an index is out of bounds, i.e. the indices were produced
    /// for a different dataset.
    #[must_use]
    pub fn apply(&self, features: &[Vec<f64>], labels: &[usize]) -> TrainTestSplit {
        let rows = |idx: &[usize]| idx.iter().map(|&i| features[i].clone()).collect();
        let labs = |idx: &[usize]| idx.iter().map(|&i| labels[i]).collect();
        TrainTestSplit {
            x_train: rows(&self.train),
            x_test: rows(&self.test),
            y_train: labs(&self.train),
            y_test: labs(&self.test),
        }
    }
}

/// Label-stratified holdout splitter.
#[derive(Debug, Clone)]
pub struct StratifiedSplit {
    test_fraction: f64,
    seed: u64,
}

impl Default for StratifiedSplit {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            seed: 42,
        }
    }
}

impl StratifiedSplit {
    /// # Errors
    ///
    /// Returns [`ResampleError::InvalidTestFraction`] unless `0 < test_fraction < 1`.
    pub fn new(test_fraction: f64) -> Result<Self, ResampleError> {
        if !(test_fraction > 0.0 && test_fraction < 1.0) {
            return Err(ResampleError::InvalidTestFraction {
                fraction: test_fraction,
            });
        }
        Ok(Self {
            test_fraction,
            ..Self::default()
        })
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn test_fraction(&self) -> f64 {
        self.test_fraction
    }

    /// Partition `0..labels.len()` so each label keeps its share in both sets.
    ///
    /// The test set has `ceil(test_fraction * n)` rows. Per-class test counts
    /// are the floors of the proportional shares, with leftover rows handed to
    /// the classes with the largest remainders (lower label first on ties).
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ResampleError::EmptyDataset`] | no labels |
    /// | [`ResampleError::InsufficientSamples`] | a present class has fewer than 2 members |
    /// | [`ResampleError::PartitionTooSmall`] | train or test would hold fewer rows than there are classes |
    #[instrument(skip_all, fields(n_samples = labels.len(), test_fraction = self.test_fraction))]
    pub fn split(&self, labels: &[usize]) -> Result<SplitIndices, ResampleError> {
        if labels.is_empty() {
            return Err(ResampleError::EmptyDataset);
        }
        let n = labels.len();
        let mut groups = group_by_class(labels);
        groups.retain(|g| !g.is_empty());

        for members in &groups {
            if members.len() < 2 {
                return Err(ResampleError::InsufficientSamples {
                    class: labels[members[0]],
                    count: members.len(),
                    required: 2,
                });
            }
        }

        let n_classes = groups.len();
        let n_test = (self.test_fraction * n as f64).ceil() as usize;
        let n_train = n - n_test;
        for (partition, size) in [("test", n_test), ("train", n_train)] {
            if size < n_classes {
                return Err(ResampleError::PartitionTooSmall {
                    partition,
                    size,
                    n_classes,
                });
            }
        }

        let per_class = allocate(&groups, n_test, n);
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut train = Vec::with_capacity(n_train);
        let mut test = Vec::with_capacity(n_test);
        for (members, &take) in groups.iter_mut().zip(&per_class) {
            members.shuffle(&mut rng);
            test.extend_from_slice(&members[..take]);
            train.extend_from_slice(&members[take..]);
        }
        train.shuffle(&mut rng);
        test.shuffle(&mut rng);

        debug!(n_train = train.len(), n_test = test.len(), ?per_class, "stratified split");
        Ok(SplitIndices { train, test })
    }
}

/// Largest-remainder apportionment of `n_test` rows across class groups.
fn allocate(groups: &[Vec<usize>], n_test: usize, n: usize) -> Vec<usize> {
    let mut counts = Vec::with_capacity(groups.len());
    let mut remainders = Vec::with_capacity(groups.len());
    for (g, members) in groups.iter().enumerate() {
        let scaled = n_test * members.len();
        counts.push(scaled / n);
        remainders.push((scaled % n, g));
    }
    let leftover = n_test - counts.iter().sum::<usize>();
    remainders.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
    for &(_, g) in remainders.iter().take(leftover) {
        counts[g] += 1;
    }
    counts
}
