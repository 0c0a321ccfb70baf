//! HTTP routes.

use std::future::Future;

use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::{info, instrument};

use crate::error::ServeError;
use crate::report::Language;
use crate::request::PredictRequest;
use crate::service::{Prediction, PredictionService};

pub const WELCOME: &str = "Welcome to the Asthma Prediction API";

#[derive(Serialize)]
struct Message {
    message: &'static str,
}

#[derive(Serialize)]
struct Label {
    prediction: usize,
}

#[derive(Serialize)]
struct ReportBody {
    #[serde(flatten)]
    prediction: Prediction,
    report: String,
}

#[derive(Deserialize)]
struct ReportParams {
    #[serde(default)]
    language: Language,
}

/// Build the API router over a shared service.
pub fn router(service: PredictionService) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/predict", post(predict))
        .route("/predict_proba", post(predict_proba))
        .route("/report", post(report))
        .with_state(service)
}

/// Serve the API on `listener` until `shutdown` resolves.
///
/// # Errors
///
/// [`ServeError::Server`] if the accept loop fails.
pub async fn serve(
    listener: TcpListener,
    service: PredictionService,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), ServeError> {
    let addr = listener
        .local_addr()
        .map_or_else(|_| "<unknown>".to_owned(), |a| a.to_string());
    info!(%addr, "prediction API listening");
    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|source| ServeError::Server { addr, source })?;
    info!("prediction API stopped");
    Ok(())
}

async fn index() -> Json<Message> {
    Json(Message { message: WELCOME })
}

fn features(service: &PredictionService, body: &[u8]) -> Result<Vec<f64>, ServeError> {
    service.features(PredictRequest::from_slice(body)?)
}

#[instrument(skip_all)]
async fn predict(
    State(service): State<PredictionService>,
    body: Bytes,
) -> Result<Json<Label>, ServeError> {
    let prediction = service.predict(&features(&service, &body)?)?;
    Ok(Json(Label { prediction }))
}

#[instrument(skip_all)]
async fn predict_proba(
    State(service): State<PredictionService>,
    body: Bytes,
) -> Result<Json<Prediction>, ServeError> {
    Ok(Json(service.predict_proba(&features(&service, &body)?)?))
}

#[instrument(skip_all)]
async fn report(
    State(service): State<PredictionService>,
    params: Result<Query<ReportParams>, QueryRejection>,
    body: Bytes,
) -> Result<Json<ReportBody>, ServeError> {
    let Query(params) = params.map_err(|e| ServeError::input(e.body_text()))?;
    let (prediction, report) = service.report(&features(&service, &body)?, params.language)?;
    Ok(Json(ReportBody {
        prediction,
        report: report.to_string(),
    }))
}
