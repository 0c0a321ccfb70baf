use rand::Rng;

use crate::node::FeatureIndex;

/// Criterion for measuring node impurity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SplitCriterion {
    /// Gini impurity: 1 - Σ(p_i²)
    Gini,
    /// Information entropy: -Σ(p_i · ln(p_i))
    Entropy,
}

impl SplitCriterion {
    /// Impurity of a node with the given class counts. Zero for an empty node.
    #[must_use]
    pub fn impurity(self, class_counts: &[usize], n_samples: usize) -> f64 {
        if n_samples == 0 {
            return 0.0;
        }
        let n = n_samples as f64;
        match self {
            SplitCriterion::Gini => {
                1.0 - class_counts
                    .iter()
                    .map(|&c| (c as f64 / n).powi(2))
                    .sum::<f64>()
            }
            SplitCriterion::Entropy => -class_counts
                .iter()
                .filter(|&&c| c > 0)
                .map(|&c| {
                    let p = c as f64 / n;
                    p * p.ln()
                })
                .sum::<f64>(),
        }
    }
}

/// The chosen split for one node.
#[derive(Debug, Clone)]
pub(crate) struct Split {
    pub(crate) feature: FeatureIndex,
    pub(crate) threshold: f64,
    /// `n·I(parent) − n_l·I(left) − n_r·I(right)`, the MDI contribution.
    pub(crate) impurity_decrease: f64,
    pub(crate) left: Vec<usize>,
    pub(crate) right: Vec<usize>,
}

/// Parameters shared by every split search within one tree.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SplitSearch {
    pub(crate) n_classes: usize,
    pub(crate) criterion: SplitCriterion,
    pub(crate) max_features: usize,
    pub(crate) min_samples_leaf: usize,
}

impl SplitSearch {
    /// Find the best threshold split over a random subset of features.
    ///
    /// `columns[feature][sample]` is column-major; `samples` indexes into the
    /// inner vectors and may contain repeats (bootstrap draws). Features are
    /// drawn without replacement until `max_features` of them have varied
    /// within the node and a valid split has been seen, so features that are
    /// constant here do not use up the budget. Returns `None` only when no
    /// feature at all has two distinct values that respect `min_samples_leaf`.
    pub(crate) fn best_split(
        &self,
        columns: &[Vec<f64>],
        labels: &[usize],
        samples: &[usize],
        parent_counts: &[usize],
        rng: &mut impl Rng,
    ) -> Option<Split> {
        let n_features = columns.len();
        let n = samples.len();
        if n < 2 || n_features == 0 {
            return None;
        }

        let parent_impurity = self.criterion.impurity(parent_counts, n);

        // Lazy Fisher-Yates over the feature indices: position `i` is fixed
        // only when the search reaches it.
        let mut order: Vec<usize> = (0..n_features).collect();
        let budget = self.max_features.min(n_features);
        let mut n_varying = 0;

        let mut best: Option<(usize, f64, f64)> = None;
        let mut sorted: Vec<(f64, usize)> = Vec::with_capacity(n);

        for i in 0..n_features {
            if n_varying >= budget && best.is_some() {
                break;
            }
            let j = rng.gen_range(i..n_features);
            order.swap(i, j);
            let feature = order[i];

            let column = &columns[feature];
            sorted.clear();
            sorted.extend(samples.iter().map(|&s| (column[s], labels[s])));
            sorted.sort_unstable_by(|a, b| a.0.total_cmp(&b.0));
            if sorted[0].0 == sorted[n - 1].0 {
                continue;
            }
            n_varying += 1;

            let mut left_counts = vec![0usize; self.n_classes];
            let mut right_counts = parent_counts.to_vec();

            for k in 0..n - 1 {
                let (value, class) = sorted[k];
                left_counts[class] += 1;
                right_counts[class] -= 1;

                let next = sorted[k + 1].0;
                if value == next {
                    continue;
                }
                let n_left = k + 1;
                let n_right = n - n_left;
                if n_left < self.min_samples_leaf || n_right < self.min_samples_leaf {
                    continue;
                }

                let decrease = n as f64 * parent_impurity
                    - n_left as f64 * self.criterion.impurity(&left_counts, n_left)
                    - n_right as f64 * self.criterion.impurity(&right_counts, n_right);

                if best.is_none_or(|(_, _, d)| decrease > d) {
                    // The midpoint of adjacent floats can round up to `next`.
                    let mid = (value + next) / 2.0;
                    let threshold = if mid < next { mid } else { value };
                    best = Some((feature, threshold, decrease));
                }
            }
        }

        let (feature, threshold, impurity_decrease) = best?;
        let column = &columns[feature];
        let (left, right): (Vec<usize>, Vec<usize>) =
            samples.iter().partition(|&&s| column[s] <= threshold);

        Some(Split {
            feature: FeatureIndex::new(feature),
            threshold,
            impurity_decrease,
            left,
            right,
        })
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    fn search(max_features: usize, min_samples_leaf: usize) -> SplitSearch {
        SplitSearch {
            n_classes: 2,
            criterion: SplitCriterion::Gini,
            max_features,
            min_samples_leaf,
        }
    }

    #[test]
    fn gini_values() {
        assert!(SplitCriterion::Gini.impurity(&[10, 0], 10).abs() < f64::EPSILON);
        assert!((SplitCriterion::Gini.impurity(&[5, 5], 10) - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn entropy_balanced_binary_is_ln2() {
        let e = SplitCriterion::Entropy.impurity(&[4, 4], 8);
        assert!((e - 2.0_f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn finds_separating_threshold() {
        let columns = vec![vec![1.0, 2.0, 3.0, 7.0, 8.0, 9.0]];
        let labels = vec![0, 0, 0, 1, 1, 1];
        let samples: Vec<usize> = (0..6).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let split = search(1, 1)
            .best_split(&columns, &labels, &samples, &[3, 3], &mut rng)
            .expect("separable data must split");

        assert_eq!(split.feature.index(), 0);
        assert!((split.threshold - 5.0).abs() < f64::EPSILON);
        assert_eq!(split.left, vec![0, 1, 2]);
        assert_eq!(split.right, vec![3, 4, 5]);
        assert!((split.impurity_decrease - 3.0).abs() < 1e-12);
    }

    #[test]
    fn repeated_bootstrap_indices_stay_together() {
        let columns = vec![vec![1.0, 9.0]];
        let labels = vec![0, 1];
        let samples = vec![0, 0, 1, 1, 1];
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let split = search(1, 1)
            .best_split(&columns, &labels, &samples, &[2, 3], &mut rng)
            .unwrap();
        assert_eq!(split.left, vec![0, 0]);
        assert_eq!(split.right, vec![1, 1, 1]);
    }

    #[test]
    fn constant_feature_has_no_split() {
        let columns = vec![vec![4.0; 4]];
        let labels = vec![0, 1, 0, 1];
        let samples: Vec<usize> = (0..4).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(
            search(1, 1)
                .best_split(&columns, &labels, &samples, &[2, 2], &mut rng)
                .is_none()
        );
    }

    #[test]
    fn constant_draws_do_not_exhaust_the_budget() {
        let columns = vec![
            vec![3.0; 6],
            vec![3.0; 6],
            vec![1.0, 2.0, 3.0, 7.0, 8.0, 9.0],
            vec![3.0; 6],
        ];
        let labels = vec![0, 0, 0, 1, 1, 1];
        let samples: Vec<usize> = (0..6).collect();
        for seed in 0..20 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let split = search(1, 1)
                .best_split(&columns, &labels, &samples, &[3, 3], &mut rng)
                .unwrap_or_else(|| panic!("seed {seed}: varying feature must be found"));
            assert_eq!(split.feature.index(), 2);
            assert_eq!(split.left, vec![0, 1, 2]);
        }
    }

    #[test]
    fn min_samples_leaf_blocks_small_children() {
        let columns = vec![vec![1.0, 10.0]];
        let labels = vec![0, 1];
        let samples = vec![0, 1];
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(
            search(1, 2)
                .best_split(&columns, &labels, &samples, &[1, 1], &mut rng)
                .is_none()
        );
    }
}
