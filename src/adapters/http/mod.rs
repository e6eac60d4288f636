//! HTTP adapter: axum routes over the inference service.
//!
//! - `GET /` returns a static informational message
//! - `POST /predict` takes a patient record and returns a `PredictionResult`
//!
//! Every failure on `/predict` (malformed body, missing or unexpected field,
//! body over [`MAX_BODY_BYTES`], model unavailable, pipeline error) is
//! reported as a 500 with a `detail` message carrying the underlying error
//! text.

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use crate::application::InferenceService;
use crate::domain::PredictionResult;
use crate::ports::Classifier;
use crate::NexusError;

/// Message served on `GET /`.
pub const INDEX_MESSAGE: &str =
    "Nexus Health renal diagnosis API is running. POST a patient record to /predict.";

/// Largest accepted `/predict` body.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// Body of `GET /`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexResponse {
    pub message: String,
}

/// Body of a failed request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}

/// Request failure, always rendered as a server error.
#[derive(Debug)]
pub struct ApiError(NexusError);

impl From<NexusError> for ApiError {
    fn from(e: NexusError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::error!("Prediction failed: {}", self.0);
        let body = ErrorResponse {
            detail: format!("Internal server error: {}", self.0),
        };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

/// Build the application router.
pub fn router<C>(service: InferenceService<C>) -> Router
where
    C: Classifier + 'static,
{
    Router::new()
        .route("/", get(index))
        .route("/predict", post(predict::<C>))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

async fn index() -> Json<IndexResponse> {
    Json(IndexResponse {
        message: INDEX_MESSAGE.to_string(),
    })
}

// The body is taken as raw bytes so that parse failures and body rejections
// share the same error path as inference failures.
async fn predict<C>(
    State(service): State<InferenceService<C>>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<PredictionResult>, ApiError>
where
    C: Classifier + 'static,
{
    let body = body.map_err(|e| NexusError::Validation(e.body_text()))?;
    let result = tokio::task::spawn_blocking(move || service.predict_json(&body))
        .await
        .map_err(|e| NexusError::Internal(format!("inference task failed: {e}")))??;
    Ok(Json(result))
}
