use std::fmt;

/// Zero-based feature column index.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
    serde::Serialize, serde::Deserialize,
)]
pub struct FeatureIndex(usize);

impl FeatureIndex {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Return the zero-based feature column index.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for FeatureIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "f{}", self.0)
    }
}

/// Position of a node inside a tree's node arena.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
    serde::Serialize, serde::Deserialize,
)]
pub struct NodeId(usize);

impl NodeId {
    /// The root node always sits at arena position zero.
    pub const ROOT: NodeId = NodeId(0);

    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Return the arena position.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// A node in a decision tree arena.
///
/// Children are referenced by [`NodeId`] rather than boxed pointers so a
/// tree is a flat `Vec<Node>` that serializes without recursion.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Node {
    /// An interior node: samples with `value <= threshold` go left.
    Split {
        /// Feature tested at this node.
        feature: FeatureIndex,
        /// Split threshold (midpoint between two adjacent training values).
        threshold: f64,
        /// Left child.
        left: NodeId,
        /// Right child.
        right: NodeId,
        /// Number of training samples that reached this node.
        n_samples: usize,
        /// Weighted impurity decrease produced by this split.
        impurity_decrease: f64,
    },
    /// A terminal node holding the class counts of its training samples.
    Leaf {
        /// Training sample count per class.
        class_counts: Vec<usize>,
    },
}

impl Node {
    /// Return `true` if this node is a leaf.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }

    /// Number of training samples that reached this node.
    #[must_use]
    pub fn n_samples(&self) -> usize {
        match self {
            Node::Split { n_samples, .. } => *n_samples,
            Node::Leaf { class_counts } => class_counts.iter().sum(),
        }
    }
}

/// Majority class of a count vector; ties resolve to the lowest class.
pub(crate) fn majority_class(counts: &[usize]) -> usize {
    let mut best = 0;
    for (class, &count) in counts.iter().enumerate() {
        if count > counts[best] {
            best = class;
        }
    }
    best
}
