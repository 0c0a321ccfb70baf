//! File I/O, validation and artifact layout for the asthma pipeline.

mod domain;
mod error;
mod reader;
mod writer;

pub use domain::{
    ArtifactName, EXAMPLE_RECORD, FeatureOrder, LABEL_COLUMN, SELECTED_FEATURES, SurveyDataset,
};
pub use error::IoError;
pub use reader::SurveyReader;
pub use writer::{ArtifactWriter, model_path, read_feature_order};
