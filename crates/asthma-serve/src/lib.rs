//! Prediction service and HTTP API for a trained asthma classifier.
//!
//! A [`PredictionService`] is built once from [`ModelArtifacts`] and shared
//! immutably by every handler. Requests are parsed into a [`PredictRequest`]
//! and validated against the feature order before the model sees them;
//! validation failures answer 400, model faults 500, both as
//! `{"error": "..."}`.

mod classifier;
mod error;
mod report;
mod request;
mod routes;
mod service;

pub use classifier::Classifier;
pub use error::ServeError;
pub use report::{Language, Report};
pub use request::PredictRequest;
pub use routes::{WELCOME, router, serve};
pub use service::{ModelArtifacts, Prediction, PredictionService};
