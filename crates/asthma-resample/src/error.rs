/// Errors from resampling and splitting.
#[derive(Debug, thiserror::Error)]
pub enum ResampleError {
    /// Returned when there are no samples at all.
    #[error("dataset has zero samples")]
    EmptyDataset,

    /// Returned when the feature matrix and label vector differ in length.
    #[error("{n_rows} feature rows but {n_labels} labels")]
    LengthMismatch {
        /// Number of feature rows.
        n_rows: usize,
        /// Number of labels.
        n_labels: usize,
    },

    /// Returned when a row's width differs from the first row's.
    #[error("row {row} has {got} features, expected {expected}")]
    RaggedRow {
        /// Zero-based row index.
        row: usize,
        /// Width of the first row.
        expected: usize,
        /// Width of the offending row.
        got: usize,
    },

    /// Returned when the neighbor count is zero.
    #[error("k_neighbors must be at least 1, got {k}")]
    InvalidNeighborCount {
        /// The invalid neighbor count.
        k: usize,
    },

    /// Returned when the held-out fraction is not strictly between 0 and 1.
    #[error("test_fraction must be in (0.0, 1.0), got {fraction}")]
    InvalidTestFraction {
        /// The invalid fraction.
        fraction: f64,
    },

    /// Returned when a class is too small to interpolate from or to stratify.
    #[error("class {class} has {count} samples, need at least {required}")]
    InsufficientSamples {
        /// The undersized class label.
        class: usize,
        /// Its sample count.
        count: usize,
        /// The minimum required.
        required: usize,
    },

    /// Returned when a partition would hold fewer rows than there are classes.
    #[error("{partition} partition would hold {size} samples for {n_classes} classes")]
    PartitionTooSmall {
        /// `"train"` or `"test"`.
        partition: &'static str,
        /// Rows the partition would receive.
        size: usize,
        /// Distinct classes that must be represented.
        n_classes: usize,
    },
}
