//! Random Forest classification: train, evaluate, predict, persist.
//!
//! A hand-rolled Random Forest of CART decision trees. Trees are fit in
//! parallel with rayon on bootstrap samples, examining a random subset of
//! features at each split. Predictions are a majority vote (or an average of
//! leaf distributions), held-out evaluation produces a classification report,
//! and fitted models round-trip through a versioned bincode file.

mod config;
mod confusion;
mod error;
mod evaluate;
mod forest;
mod importance;
mod node;
mod predict;
mod result;
mod serialize;
mod split;
mod tree;

pub use config::{Aggregation, MaxFeatures, RandomForestConfig};
pub use confusion::ConfusionMatrix;
pub use error::RfError;
pub use evaluate::{AveragedMetrics, ClassMetrics, ClassificationReport};
pub use forest::RandomForest;
pub use importance::RankedFeature;
pub use node::{FeatureIndex, Node, NodeId};
pub use predict::ClassDistribution;
pub use result::{RandomForestResult, TrainingMetadata};
pub use split::SplitCriterion;
pub use tree::{DecisionTree, DecisionTreeConfig};
