//! Error types for asthma-serve.

use asthma_io::IoError;
use asthma_rf::RfError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Errors from model loading and request handling.
#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    /// The request payload is malformed or does not match the feature order.
    /// The message is returned to the client verbatim.
    #[error("{message}")]
    PredictionInput { message: String },

    /// The classifier failed on input that passed validation.
    #[error("model inference failed: {source}")]
    InternalModel { source: RfError },

    /// The saved model could not be loaded.
    #[error("cannot load model")]
    LoadModel {
        #[source]
        source: RfError,
    },

    /// The saved feature order could not be loaded.
    #[error("cannot load feature order")]
    LoadFeatures {
        #[source]
        source: IoError,
    },

    /// The model and feature order disagree on the input layout.
    #[error("model was trained on {model:?} but the feature order is {features:?}")]
    FeatureMismatch {
        model: Vec<String>,
        features: Vec<String>,
    },

    /// The listener could not bind or the server loop failed.
    #[error("HTTP server error on {addr}")]
    Server {
        addr: String,
        source: std::io::Error,
    },
}

impl ServeError {
    pub(crate) fn input(message: impl Into<String>) -> Self {
        Self::PredictionInput {
            message: message.into(),
        }
    }

    /// HTTP status for this error: 400 for client input, 500 otherwise.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::PredictionInput { .. } => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServeError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}
