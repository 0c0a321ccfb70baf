//! I/O error types for asthma-io.

use std::path::PathBuf;

/// Errors from dataset loading and artifact persistence.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Returned when the dataset file does not exist or is unreadable.
    #[error("cannot open dataset {path}")]
    DataAccess {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Returned when the CSV parser encounters a malformed record.
    #[error("CSV parse error in {path} at byte offset {offset}")]
    CsvParse {
        path: PathBuf,
        offset: u64,
        source: csv::Error,
    },

    /// Returned when a required column is absent from the header.
    #[error("column \"{column}\" not found in header of {path}")]
    MissingColumn { path: PathBuf, column: String },

    /// Returned when a feature cell is not a finite number.
    #[error("invalid value in {path}: row {row_index}, column \"{column}\", raw value \"{raw}\"")]
    InvalidValue {
        path: PathBuf,
        /// Zero-based row index (excluding header).
        row_index: usize,
        column: String,
        raw: String,
    },

    /// Returned when a label cell is not 0 or 1.
    #[error("invalid label in {path}: row {row_index}, raw value \"{raw}\" (expected 0 or 1)")]
    InvalidLabel {
        path: PathBuf,
        row_index: usize,
        raw: String,
    },

    /// Returned when the CSV file contains a header but zero data rows.
    #[error("empty dataset (no data rows) in {path}")]
    EmptyDataset { path: PathBuf },

    /// Returned when a feature order is empty or names a column twice.
    #[error("invalid feature order: {reason}")]
    InvalidFeatureOrder { reason: String },

    /// Returned when the artifact name contains characters outside `[a-zA-Z0-9_-]`.
    #[error("invalid artifact name \"{name}\": must match [a-zA-Z0-9_-]+")]
    InvalidArtifactName { name: String },

    /// Returned when the output directory cannot be created.
    #[error("cannot create output directory {path}")]
    OutputDirCreate {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Returned when an artifact file cannot be written or renamed into place.
    #[error("cannot write file {path}")]
    WriteFile {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Returned when an artifact file cannot be read.
    #[error("cannot read file {path}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Returned when an artifact fails to encode or decode as JSON.
    #[error("JSON error for {path}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}
